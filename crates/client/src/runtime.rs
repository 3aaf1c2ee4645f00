use crate::parser;
use crate::transport::{RawResponse, TransportClient, TransportError};
use reqwest::StatusCode;
use ric_models::{Config, ErrorResponse, Invocation, RuntimeError};
use tracing::debug;

const PATH_NEXT: &str = "/2018-06-01/runtime/invocation/next";
const PATH_INIT_ERROR: &str = "/2018-06-01/runtime/init/error";

/// Client for the four Runtime API operations. Cheap to clone; the
/// underlying HTTP client is shared.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    transport: TransportClient,
}

impl RuntimeClient {
    pub fn new(config: &Config) -> Result<Self, RuntimeError> {
        let transport = TransportClient::new(
            &config.runtime.ip,
            config.runtime.port,
            config.request_timeout(),
        )
        .map_err(classify)?;
        Ok(Self { transport })
    }

    /// Long-polls for the next invocation. Blocks until the Runtime API
    /// dispenses work or the per-call timeout expires.
    pub async fn request_work(&self) -> Result<(Invocation, Vec<u8>), RuntimeError> {
        let response = self.transport.get(PATH_NEXT).await.map_err(classify)?;
        let (invocation, payload) = parser::parse_invocation(response)?;
        debug!(request_id = %invocation.request_id, bytes = payload.len(), "received invocation");
        Ok((invocation, payload))
    }

    /// Posts the handler's response bytes for an invocation. An absent
    /// response is sent as an empty body.
    pub async fn report_success(
        &self,
        invocation: &Invocation,
        response: Option<&[u8]>,
    ) -> Result<(), RuntimeError> {
        let path = format!(
            "/2018-06-01/runtime/invocation/{}/response",
            invocation.request_id
        );
        let body = response.map(<[u8]>::to_vec).unwrap_or_default();
        let res = self.transport.post(&path, body).await.map_err(classify)?;
        debug!(request_id = %invocation.request_id, "reported success");
        expect_status(res, StatusCode::ACCEPTED)
    }

    /// Reports a handler failure for an invocation.
    pub async fn report_failure(
        &self,
        invocation: &Invocation,
        error: &anyhow::Error,
    ) -> Result<(), RuntimeError> {
        let path = format!(
            "/2018-06-01/runtime/invocation/{}/error",
            invocation.request_id
        );
        let body = ErrorResponse::function_error(error.to_string()).to_json_bytes()?;
        let res = self.transport.post(&path, body).await.map_err(classify)?;
        debug!(request_id = %invocation.request_id, "reported failure");
        expect_status(res, StatusCode::ACCEPTED)
    }

    /// Reports that handler initialization failed.
    pub async fn report_init_error(&self, error: &anyhow::Error) -> Result<(), RuntimeError> {
        let body = ErrorResponse::initialization_error(error.to_string()).to_json_bytes()?;
        let res = self
            .transport
            .post(PATH_INIT_ERROR, body)
            .await
            .map_err(classify)?;
        expect_status(res, StatusCode::ACCEPTED)
    }
}

fn expect_status(response: RawResponse, expected: StatusCode) -> Result<(), RuntimeError> {
    if response.status == expected {
        Ok(())
    } else {
        Err(RuntimeError::BadStatusCode(response.status.as_u16()))
    }
}

fn classify(err: TransportError) -> RuntimeError {
    match err {
        TransportError::Timeout => RuntimeError::UpstreamError("timeout".to_string()),
        TransportError::ConnectionResetByPeer => {
            RuntimeError::UpstreamError("connectionResetByPeer".to_string())
        }
        TransportError::Other(err) => RuntimeError::UpstreamError(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_canonical_reason() {
        assert_eq!(
            classify(TransportError::Timeout),
            RuntimeError::UpstreamError("timeout".to_string())
        );
    }

    #[test]
    fn connection_reset_maps_to_canonical_reason() {
        assert_eq!(
            classify(TransportError::ConnectionResetByPeer),
            RuntimeError::UpstreamError("connectionResetByPeer".to_string())
        );
    }
}
