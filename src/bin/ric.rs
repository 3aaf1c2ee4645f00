use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use ric_core::{spawn_stop_signal_listener, Handler, HandlerFactory, Lifecycle};
use ric_models::{Config, Context};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ric")]
#[command(about = "Runtime interface client: polls the Lambda Runtime API and drives a handler")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<String>,

    /// Runtime API endpoint override (host:port)
    #[arg(long)]
    runtime_api: Option<String>,

    /// Stop after this many invocations
    #[arg(long)]
    max_times: Option<u64>,
}

/// Built-in handler: echoes the payload back. Stands in for user code when
/// the binary is run directly against a Runtime API.
struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&mut self, ctx: Context, payload: Vec<u8>) -> Result<Option<Vec<u8>>> {
        info!(request_id = %ctx.request_id, bytes = payload.len(), "echoing payload");
        Ok(Some(payload))
    }
}

struct EchoFactory;

#[async_trait]
impl HandlerFactory for EchoFactory {
    type Handler = EchoHandler;

    async fn create(&mut self) -> Result<EchoHandler> {
        Ok(EchoHandler)
    }
}

/// Resolves the configuration before tracing is up; any load complaint is
/// returned so it can be logged once the subscriber is initialized.
fn load_config(explicit: Option<&str>) -> (Config, Option<String>) {
    if let Some(path) = explicit {
        return match Config::load(path) {
            Ok(config) => (config, None),
            Err(e) => (
                Config::default(),
                Some(format!("failed to load config file {path}: {e}, using defaults")),
            ),
        };
    }

    let candidate_paths = ["configs/default.toml", "config/ric.toml"];
    for path in &candidate_paths {
        if Path::new(path).exists() {
            return match Config::load(path) {
                Ok(config) => (config, None),
                Err(e) => (
                    Config::default(),
                    Some(format!("failed to load config file {path}: {e}, using defaults")),
                ),
            };
        }
    }
    (Config::default(), None)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, load_warning) = load_config(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();
    if let Some(message) = load_warning {
        warn!("{message}");
    }

    config.apply_env();
    if let Some(endpoint) = args.runtime_api.as_deref() {
        config.apply_runtime_api_endpoint(endpoint);
    }
    if args.max_times.is_some() {
        config.lifecycle.max_times = args.max_times;
    }

    info!(
        endpoint = %format!("{}:{}", config.runtime.ip, config.runtime.port),
        stop_signal = %config.lifecycle.stop_signal,
        "starting runtime interface client"
    );

    let lifecycle = Lifecycle::new(config.clone(), EchoFactory)?;
    spawn_stop_signal_listener(&config.lifecycle.stop_signal, lifecycle.stop_flag())?;

    match lifecycle.run().await {
        Ok(count) => {
            info!(invocations = count, "runtime finished");
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "runtime failed");
            Err(err.into())
        }
    }
}
