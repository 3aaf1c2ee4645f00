use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Graceful-stop latch shared between the signal task and the lifecycle.
/// Set once, observed at iteration boundaries; never cleared.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    inner: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
pub use unix::{spawn_stop_signal_listener, stop_signal_kind};

#[cfg(unix)]
mod unix {
    use super::StopFlag;
    use anyhow::{anyhow, Result};
    use tokio::signal::unix::{signal, SignalKind};
    use tokio::task::JoinHandle;
    use tracing::info;

    /// Resolves a configured signal name. Accepts the `SIG`-prefixed and
    /// bare spellings.
    pub fn stop_signal_kind(name: &str) -> Result<SignalKind> {
        let bare = name.strip_prefix("SIG").unwrap_or(name);
        match bare {
            "TERM" => Ok(SignalKind::terminate()),
            "INT" => Ok(SignalKind::interrupt()),
            "QUIT" => Ok(SignalKind::quit()),
            "HUP" => Ok(SignalKind::hangup()),
            "USR1" => Ok(SignalKind::user_defined1()),
            "USR2" => Ok(SignalKind::user_defined2()),
            _ => Err(anyhow!("unsupported stop signal: {name}")),
        }
    }

    /// Installs the process-wide stop trap: on the first delivery of the
    /// configured signal, sets the flag and exits.
    pub fn spawn_stop_signal_listener(name: &str, flag: StopFlag) -> Result<JoinHandle<()>> {
        let kind = stop_signal_kind(name)?;
        let mut stream = signal(kind)?;
        let name = name.to_string();
        Ok(tokio::spawn(async move {
            if stream.recv().await.is_some() {
                info!(signal = %name, "stop signal received");
                flag.set();
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_clear_and_latches() {
        let flag = StopFlag::new();
        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
        let clone = flag.clone();
        assert!(clone.is_set());
    }

    #[cfg(unix)]
    #[test]
    fn signal_names_resolve() {
        use tokio::signal::unix::SignalKind;
        assert_eq!(stop_signal_kind("SIGTERM").unwrap(), SignalKind::terminate());
        assert_eq!(stop_signal_kind("TERM").unwrap(), SignalKind::terminate());
        assert_eq!(stop_signal_kind("SIGINT").unwrap(), SignalKind::interrupt());
        assert_eq!(stop_signal_kind("SIGUSR1").unwrap(), SignalKind::user_defined1());
        assert!(stop_signal_kind("SIGKILL").is_err());
    }
}
