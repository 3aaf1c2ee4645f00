use async_trait::async_trait;
use ric_models::Context;
use std::future::Future;

/// User code consuming one invocation. Invoked serially; the returned
/// future is the invocation's single completion: `Ok(Some(bytes))` or
/// `Ok(None)` for success (with or without a response body), `Err` for a
/// failure that will be reported on the invocation's error endpoint.
#[async_trait]
pub trait Handler: Send {
    async fn handle(&mut self, ctx: Context, payload: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Producer of the handler, run once during initialization. Its failure
/// aborts startup and is reported as an initialization error.
#[async_trait]
pub trait HandlerFactory: Send {
    type Handler: Handler;

    async fn create(&mut self) -> anyhow::Result<Self::Handler>;
}

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: FnMut(Context, Vec<u8>) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Option<Vec<u8>>>> + Send,
{
    HandlerFn { f }
}

pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: FnMut(Context, Vec<u8>) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Option<Vec<u8>>>> + Send,
{
    async fn handle(&mut self, ctx: Context, payload: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
        (self.f)(ctx, payload).await
    }
}

/// Wraps a closure as a [`HandlerFactory`].
pub fn factory_fn<F, Fut, H>(f: F) -> FactoryFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = anyhow::Result<H>> + Send,
    H: Handler,
{
    FactoryFn { f }
}

pub struct FactoryFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut, H> HandlerFactory for FactoryFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = anyhow::Result<H>> + Send,
    H: Handler,
{
    type Handler = H;

    async fn create(&mut self) -> anyhow::Result<H> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ric_models::{FunctionEnv, Invocation};

    fn ctx() -> Context {
        let invocation = Invocation {
            request_id: "r".to_string(),
            deadline_ms: 0,
            invoked_function_arn: "arn".to_string(),
            trace_id: "t".to_string(),
            client_context: None,
            cognito_identity: None,
        };
        Context::new(&invocation, &FunctionEnv::default())
    }

    #[tokio::test]
    async fn closure_handler_echoes() {
        let mut handler =
            handler_fn(|_ctx, payload: Vec<u8>| async move { anyhow::Ok(Some(payload)) });
        let out = handler.handle(ctx(), b"ping".to_vec()).await.unwrap();
        assert_eq!(out.as_deref(), Some(b"ping".as_slice()));
    }

    #[tokio::test]
    async fn closure_factory_builds_handler() {
        let mut factory = factory_fn(|| async {
            anyhow::Ok(handler_fn(|_ctx, _payload: Vec<u8>| async move {
                anyhow::Ok(None)
            }))
        });
        let mut handler = factory.create().await.unwrap();
        assert_eq!(handler.handle(ctx(), Vec::new()).await.unwrap(), None);
    }
}
