use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

/// One scripted outcome for a `/next` poll, consumed in FIFO order.
#[derive(Debug, Clone)]
pub enum NextOutcome {
    /// Dispense an invocation.
    Invocation(MockInvocation),
    /// Hold the poll open for this long, then answer 204 (lets tests force
    /// a client-side timeout).
    Delay(Duration),
    /// Answer with an arbitrary status and empty body.
    Status(u16),
}

/// A scripted invocation the mock will dispense, headers and payload.
#[derive(Debug, Clone)]
pub struct MockInvocation {
    pub request_id: String,
    pub deadline_ms: i64,
    pub invoked_function_arn: String,
    pub trace_id: String,
    pub client_context: Option<String>,
    pub cognito_identity: Option<String>,
    pub payload: Vec<u8>,
    omit: Vec<&'static str>,
}

impl MockInvocation {
    pub fn new(request_id: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        let request_id = request_id.into();
        Self {
            invoked_function_arn: format!(
                "arn:aws:lambda:local:000000000000:function:mock-{request_id}"
            ),
            trace_id: format!("Root=1-mock-{request_id}"),
            deadline_ms: 1_700_000_000_000,
            client_context: None,
            cognito_identity: None,
            payload: payload.into(),
            omit: Vec::new(),
            request_id,
        }
    }

    /// Drop a header from the dispensed response (contract-violation tests).
    pub fn without_header(mut self, name: &'static str) -> Self {
        self.omit.push(name);
        self
    }

    pub fn with_client_context(mut self, value: impl Into<String>) -> Self {
        self.client_context = Some(value.into());
        self
    }

    pub fn with_cognito_identity(mut self, value: impl Into<String>) -> Self {
        self.cognito_identity = Some(value.into());
        self
    }
}

/// A report the mock received on one of the POST endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub request_id: String,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct ApiState {
    queue: Arc<RwLock<VecDeque<NextOutcome>>>,
    responses: Arc<RwLock<Vec<Report>>>,
    errors: Arc<RwLock<Vec<Report>>>,
    init_errors: Arc<RwLock<Vec<Vec<u8>>>>,
    report_status: Arc<RwLock<u16>>,
}

impl ApiState {
    fn new() -> Self {
        Self {
            queue: Arc::new(RwLock::new(VecDeque::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            errors: Arc::new(RwLock::new(Vec::new())),
            init_errors: Arc::new(RwLock::new(Vec::new())),
            report_status: Arc::new(RwLock::new(StatusCode::ACCEPTED.as_u16())),
        }
    }
}

/// In-process Runtime API double: real HTTP on a loopback port, scripted
/// `/next` outcomes, recorded reports. The server task is aborted on drop.
pub struct MockRuntimeApi {
    addr: SocketAddr,
    state: ApiState,
    task: JoinHandle<()>,
}

impl MockRuntimeApi {
    pub async fn spawn() -> anyhow::Result<Self> {
        let state = ApiState::new();
        let app = build_router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        info!("mock runtime API listening on {}", addr);
        Ok(Self { addr, state, task })
    }

    pub fn ip(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn push(&self, outcome: NextOutcome) {
        self.state.queue.write().await.push_back(outcome);
    }

    pub async fn push_invocation(&self, invocation: MockInvocation) {
        self.push(NextOutcome::Invocation(invocation)).await;
    }

    /// Status answered to every subsequent report POST (202 by default).
    pub async fn set_report_status(&self, status: u16) {
        *self.state.report_status.write().await = status;
    }

    pub async fn responses(&self) -> Vec<Report> {
        self.state.responses.read().await.clone()
    }

    pub async fn errors(&self) -> Vec<Report> {
        self.state.errors.read().await.clone()
    }

    pub async fn init_errors(&self) -> Vec<Vec<u8>> {
        self.state.init_errors.read().await.clone()
    }
}

impl Drop for MockRuntimeApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/2018-06-01/runtime/invocation/next", get(runtime_next))
        .route(
            "/2018-06-01/runtime/invocation/:request_id/response",
            post(runtime_response),
        )
        .route(
            "/2018-06-01/runtime/invocation/:request_id/error",
            post(runtime_error),
        )
        .route("/2018-06-01/runtime/init/error", post(runtime_init_error))
        .with_state(state)
}

async fn runtime_next(State(state): State<ApiState>) -> impl IntoResponse {
    let outcome = state.queue.write().await.pop_front();
    match outcome {
        Some(NextOutcome::Invocation(invocation)) => {
            info!(request_id = %invocation.request_id, "dispensing scripted invocation");
            dispense(invocation)
        }
        Some(NextOutcome::Delay(duration)) => {
            tokio::time::sleep(duration).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Some(NextOutcome::Status(status)) => status_response(status),
        // Nothing scripted: an unexpected extra poll should fail loudly.
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn dispense(invocation: MockInvocation) -> axum::response::Response {
    let mut pairs: Vec<(&'static str, String)> = vec![
        ("lambda-runtime-aws-request-id", invocation.request_id),
        (
            "lambda-runtime-deadline-ms",
            invocation.deadline_ms.to_string(),
        ),
        (
            "lambda-runtime-invoked-function-arn",
            invocation.invoked_function_arn,
        ),
        ("lambda-runtime-trace-id", invocation.trace_id),
    ];
    if let Some(ctx) = invocation.client_context {
        pairs.push(("lambda-runtime-client-context", ctx));
    }
    if let Some(identity) = invocation.cognito_identity {
        pairs.push(("lambda-runtime-cognito-identity", identity));
    }

    let mut response = Response::new(Body::from(invocation.payload));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    for (name, value) in pairs {
        if invocation
            .omit
            .iter()
            .any(|omitted| omitted.eq_ignore_ascii_case(name))
        {
            continue;
        }
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(&value).expect("scripted header value"),
        );
    }
    response
}

fn status_response(status: u16) -> axum::response::Response {
    StatusCode::from_u16(status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}

async fn runtime_response(
    Path(request_id): Path<String>,
    State(state): State<ApiState>,
    body: bytes::Bytes,
) -> impl IntoResponse {
    info!(request_id = %request_id, "recorded response report");
    state.responses.write().await.push(Report {
        request_id,
        body: body.to_vec(),
    });
    status_response(*state.report_status.read().await)
}

async fn runtime_error(
    Path(request_id): Path<String>,
    State(state): State<ApiState>,
    body: bytes::Bytes,
) -> impl IntoResponse {
    info!(request_id = %request_id, "recorded error report");
    state.errors.write().await.push(Report {
        request_id,
        body: body.to_vec(),
    });
    status_response(*state.report_status.read().await)
}

async fn runtime_init_error(
    State(state): State<ApiState>,
    body: bytes::Bytes,
) -> impl IntoResponse {
    info!("recorded init error report");
    state.init_errors.write().await.push(body.to_vec());
    status_response(*state.report_status.read().await)
}
