pub mod server;

pub use server::{MockInvocation, MockRuntimeApi, NextOutcome, Report};
