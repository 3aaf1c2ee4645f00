use crate::handler::Handler;
use ric_client::RuntimeClient;
use ric_models::{Context, FunctionEnv, RuntimeError};
use tracing::{info, warn};

/// Executes one invocation cycle: obtain work, invoke the handler, report
/// the outcome. Stateless across invocations aside from the shared client.
#[derive(Debug, Clone)]
pub struct Runner {
    client: RuntimeClient,
    env: FunctionEnv,
}

impl Runner {
    pub fn new(client: RuntimeClient, env: FunctionEnv) -> Self {
        Self { client, env }
    }

    /// One poll/dispatch/report cycle. A handler failure is not an error
    /// here (it is reported to the Runtime API and the cycle counts as
    /// complete); a report call's own failure propagates.
    pub async fn run_once<H: Handler>(&self, handler: &mut H) -> Result<(), RuntimeError> {
        let (invocation, payload) = self.client.request_work().await?;
        let ctx = Context::new(&invocation, &self.env);

        match handler.handle(ctx, payload).await {
            Ok(response) => {
                info!(request_id = %invocation.request_id, "handler succeeded");
                self.client
                    .report_success(&invocation, response.as_deref())
                    .await
            }
            Err(error) => {
                warn!(request_id = %invocation.request_id, error = %error, "handler failed");
                self.client.report_failure(&invocation, &error).await
            }
        }
    }
}
