pub mod parser;
pub mod runtime;
pub mod transport;

pub use parser::parse_invocation;
pub use runtime::RuntimeClient;
pub use transport::{RawResponse, TransportClient, TransportError};
