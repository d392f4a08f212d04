//! Core types for the switchback router.
//!
//! This crate provides the HTTP surface the router core consumes:
//! - [`Request`] and [`Response`] types
//! - [`RequestContext`], the opaque per-request context passed through to
//!   handlers untouched
//! - A structured [`logging`] module
//! - Test tooling in [`testing`]
//!
//! # Design Principles
//!
//! - Zero-copy where possible
//! - No runtime reflection
//! - All types support `Send + Sync`
//! - The router never inspects the context it forwards

#![forbid(unsafe_code)]

mod context;
pub mod logging;
mod request;
mod response;
pub mod testing;

pub use context::{CancelledError, RequestContext};
pub use logging::{LogConfig, LogEntry, LogFormat, LogLevel};
pub use request::{Body, Headers, Method, Request};
pub use response::{Response, StatusCode};

// Re-export testing utilities at the crate root for convenience, as the
// rest of the workspace imports them heavily in tests and examples.
pub use testing::{test_context, RequestBuilder};
