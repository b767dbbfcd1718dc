//! Sampling reset responder library
//!
//! Serves a fixed probabilistic sampling strategy to every TCP connection so
//! that polling tracing clients fall back to a known default rate.

/// Listening port of the agent sampling endpoint that clients poll.
pub const DEFAULT_PORT: u16 = 5778;

pub mod config;
pub mod error;
pub mod metrics;
pub mod response;
pub mod server;

pub use config::ResponderConfig;
pub use error::ResponderError;
pub use response::RenderedResponse;
