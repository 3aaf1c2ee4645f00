use crate::handler::HandlerFactory;
use crate::runner::Runner;
use crate::shutdown::StopFlag;
use ric_client::RuntimeClient;
use ric_models::{Config, FunctionEnv, RuntimeError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Lifecycle phases, in order. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Initializing,
    Running,
    ShuttingDown,
    Terminal,
}

/// The fatal outcome of a lifecycle run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Init(#[source] anyhow::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Top-level state machine: construct the handler once, then drive
/// poll/dispatch/report cycles until stopped or a fatal error occurs.
pub struct Lifecycle<F: HandlerFactory> {
    config: Config,
    client: RuntimeClient,
    runner: Runner,
    factory: F,
    stop: StopFlag,
    state: State,
}

impl<F: HandlerFactory> Lifecycle<F> {
    pub fn new(config: Config, factory: F) -> Result<Self, LifecycleError> {
        let client = RuntimeClient::new(&config)?;
        let runner = Runner::new(client.clone(), FunctionEnv::from_process_env());
        Ok(Self {
            config,
            client,
            runner,
            factory,
            stop: StopFlag::new(),
            state: State::Idle,
        })
    }

    /// Handle for the signal trap (or tests) to request a graceful stop.
    /// The flag is observed between iterations; an in-flight invocation is
    /// always reported before the loop exits.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Observes an externally owned stop flag instead of the internal one.
    pub fn with_stop_flag(mut self, flag: StopFlag) -> Self {
        self.stop = flag;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Runs to termination. Returns the number of completed invocations on
    /// a graceful stop, or the fatal error.
    pub async fn run(mut self) -> Result<u64, LifecycleError> {
        self.enter(State::Initializing);
        let mut handler = match self.factory.create().await {
            Ok(handler) => handler,
            Err(init_error) => {
                error!(error = %init_error, "handler initialization failed");
                self.enter(State::ShuttingDown);
                // Best-effort: the factory error is the result either way.
                if let Err(report_error) = self.client.report_init_error(&init_error).await {
                    warn!(error = %report_error, "could not report initialization error");
                }
                self.enter(State::Terminal);
                return Err(LifecycleError::Init(init_error));
            }
        };
        info!("handler initialized");

        self.enter(State::Running);
        let mut completed: u64 = 0;
        let result = loop {
            if self.stop.is_set() {
                info!(invocations = completed, "stop requested, shutting down");
                break Ok(completed);
            }
            if let Some(max_times) = self.config.lifecycle.max_times {
                if completed >= max_times {
                    info!(invocations = completed, "reached configured invocation limit");
                    break Ok(completed);
                }
            }
            match self.runner.run_once(&mut handler).await {
                Ok(()) => completed += 1,
                Err(RuntimeError::UpstreamError(reason)) => {
                    warn!(%reason, "transient upstream error, continuing");
                }
                Err(fatal) => {
                    error!(error = %fatal, "invocation cycle failed");
                    break Err(LifecycleError::Runtime(fatal));
                }
            }
        };

        self.enter(State::ShuttingDown);
        drop(handler);
        self.enter(State::Terminal);
        result
    }

    fn enter(&mut self, next: State) {
        debug!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }
}
