use serde::{Deserialize, Serialize};

/// One unit of work handed out by the Runtime API. Immutable once parsed;
/// the four required fields are guaranteed non-empty by the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    pub request_id: String,
    /// Absolute wall-clock deadline, milliseconds since the epoch.
    pub deadline_ms: i64,
    pub invoked_function_arn: String,
    pub trace_id: String,
    pub client_context: Option<String>,
    pub cognito_identity: Option<String>,
}

/// Function metadata surfaced through the standard environment variables.
/// Read once at startup; absent variables stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionEnv {
    pub handler: Option<String>,
    pub function_name: Option<String>,
    pub function_version: Option<String>,
    pub memory_size_mb: Option<u64>,
    pub log_group_name: Option<String>,
    pub log_stream_name: Option<String>,
}

impl FunctionEnv {
    pub fn from_process_env() -> Self {
        Self {
            handler: std::env::var("_HANDLER").ok(),
            function_name: std::env::var("AWS_LAMBDA_FUNCTION_NAME").ok(),
            function_version: std::env::var("AWS_LAMBDA_FUNCTION_VERSION").ok(),
            memory_size_mb: std::env::var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok()),
            log_group_name: std::env::var("AWS_LAMBDA_LOG_GROUP_NAME").ok(),
            log_stream_name: std::env::var("AWS_LAMBDA_LOG_STREAM_NAME").ok(),
        }
    }
}

/// Per-invocation view handed to the handler: the invocation metadata plus
/// the function environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub request_id: String,
    pub deadline_ms: i64,
    pub invoked_function_arn: String,
    pub trace_id: String,
    pub client_context: Option<String>,
    pub cognito_identity: Option<String>,
    pub env: FunctionEnv,
}

impl Context {
    pub fn new(invocation: &Invocation, env: &FunctionEnv) -> Self {
        Self {
            request_id: invocation.request_id.clone(),
            deadline_ms: invocation.deadline_ms,
            invoked_function_arn: invocation.invoked_function_arn.clone(),
            trace_id: invocation.trace_id.clone(),
            client_context: invocation.client_context.clone(),
            cognito_identity: invocation.cognito_identity.clone(),
            env: env.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> Invocation {
        Invocation {
            request_id: "8476a536-e9f4-11e8-9739-2dfe598c3fcd".to_string(),
            deadline_ms: 1_700_000_000_000,
            invoked_function_arn: "arn:aws:lambda:us-east-2:123456789012:function:custom-runtime"
                .to_string(),
            trace_id: "Root=1-5bef4de7-ad49b0e87f6ef6c87fc2e700".to_string(),
            client_context: None,
            cognito_identity: Some("identity".to_string()),
        }
    }

    #[test]
    fn context_carries_invocation_fields() {
        let env = FunctionEnv {
            function_name: Some("custom-runtime".to_string()),
            ..Default::default()
        };
        let ctx = Context::new(&invocation(), &env);
        assert_eq!(ctx.request_id, "8476a536-e9f4-11e8-9739-2dfe598c3fcd");
        assert_eq!(ctx.deadline_ms, 1_700_000_000_000);
        assert_eq!(ctx.cognito_identity.as_deref(), Some("identity"));
        assert_eq!(ctx.client_context, None);
        assert_eq!(ctx.env.function_name.as_deref(), Some("custom-runtime"));
    }
}
