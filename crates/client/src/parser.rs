use crate::transport::RawResponse;
use reqwest::StatusCode;
use ric_models::{Invocation, RuntimeError};

pub const HEADER_REQUEST_ID: &str = "Lambda-Runtime-Aws-Request-Id";
pub const HEADER_DEADLINE_MS: &str = "Lambda-Runtime-Deadline-Ms";
pub const HEADER_FUNCTION_ARN: &str = "Lambda-Runtime-Invoked-Function-Arn";
pub const HEADER_TRACE_ID: &str = "Lambda-Runtime-Trace-Id";
pub const HEADER_CLIENT_CONTEXT: &str = "Lambda-Runtime-Client-Context";
pub const HEADER_COGNITO_IDENTITY: &str = "Lambda-Runtime-Cognito-Identity";

/// Validates a request-work response and builds the invocation plus its
/// payload. The payload may be empty, but a response without a body is a
/// contract violation.
pub fn parse_invocation(response: RawResponse) -> Result<(Invocation, Vec<u8>), RuntimeError> {
    if response.status != StatusCode::OK {
        return Err(RuntimeError::BadStatusCode(response.status.as_u16()));
    }

    // Body presence is checked before any header, so a bodiless response
    // reports NoBody even when headers are also missing.
    let payload = response
        .body
        .as_ref()
        .ok_or(RuntimeError::NoBody)?
        .to_vec();

    let request_id = required_header(&response, HEADER_REQUEST_ID)?.to_string();
    // A malformed deadline is reported the same as a missing one.
    let deadline_ms = required_header(&response, HEADER_DEADLINE_MS)?
        .parse::<i64>()
        .map_err(|_| RuntimeError::InvocationMissingHeader(HEADER_DEADLINE_MS))?;
    let invoked_function_arn = required_header(&response, HEADER_FUNCTION_ARN)?.to_string();
    let trace_id = required_header(&response, HEADER_TRACE_ID)?.to_string();
    let client_context = response.header(HEADER_CLIENT_CONTEXT).map(str::to_string);
    let cognito_identity = response.header(HEADER_COGNITO_IDENTITY).map(str::to_string);

    Ok((
        Invocation {
            request_id,
            deadline_ms,
            invoked_function_arn,
            trace_id,
            client_context,
            cognito_identity,
        },
        payload,
    ))
}

fn required_header<'a>(
    response: &'a RawResponse,
    name: &'static str,
) -> Result<&'a str, RuntimeError> {
    match response.header(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RuntimeError::InvocationMissingHeader(name)),
    }
}
