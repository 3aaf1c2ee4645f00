use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, TRANSFER_ENCODING};
use reqwest::StatusCode;
use thiserror::Error;

/// Transport-level failure kinds. Timeout and peer reset are distinguished
/// because the runtime client maps them to canonical upstream reasons;
/// everything else stays attached to the underlying error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection reset by peer")]
    ConnectionResetByPeer,

    #[error(transparent)]
    Other(#[from] reqwest::Error),
}

/// An HTTP exchange result, decoded far enough for the invocation parser:
/// status, the full header map, and the body. `body` is `None` when the
/// response carried no body at all (neither `Content-Length` nor
/// `Transfer-Encoding`), which is distinct from an empty one.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RawResponse {
    /// First value recorded for `name`, when it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Thin request/response client against the Runtime API endpoint. One
/// `reqwest::Client` with a per-call timeout; no retries at this layer.
#[derive(Debug, Clone)]
pub struct TransportClient {
    http: reqwest::Client,
    base_url: String,
}

impl TransportClient {
    pub fn new(ip: &str, port: u16, request_timeout: std::time::Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: format!("http://{ip}:{port}"),
        })
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(classify_reqwest)?;
        read_response(response).await
    }

    pub async fn post(&self, path: &str, body: Vec<u8>) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .body(body)
            .send()
            .await
            .map_err(classify_reqwest)?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = response.status();
    let headers = response.headers().clone();
    let framed =
        headers.contains_key(CONTENT_LENGTH) || headers.contains_key(TRANSFER_ENCODING);
    let bytes = response.bytes().await.map_err(classify_reqwest)?;
    // Close-delimited bodies carry no framing header but may still have
    // content; only a fully bodiless response maps to None.
    let body = if framed || !bytes.is_empty() {
        Some(bytes)
    } else {
        None
    };
    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

fn classify_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if chain_has_connection_reset(&err) {
        return TransportError::ConnectionResetByPeer;
    }
    TransportError::Other(err)
}

fn chain_has_connection_reset(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
