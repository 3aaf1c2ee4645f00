pub mod handler;
pub mod lifecycle;
pub mod runner;
pub mod shutdown;

pub use handler::{factory_fn, handler_fn, Handler, HandlerFactory};
pub use lifecycle::{Lifecycle, LifecycleError, State};
pub use runner::Runner;
pub use shutdown::StopFlag;

#[cfg(unix)]
pub use shutdown::{spawn_stop_signal_listener, stop_signal_kind};
