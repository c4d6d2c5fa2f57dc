//! Shared plumbing for the kswatch crates
//!
//! - [`di`]: factory-return service registration via `inventory`
//! - [`logging`]: `tracing` subscriber setup and error chain formatting

pub mod di;
pub mod logging;

pub use logging::{format_error, LogLevel};
