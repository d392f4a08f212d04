//! Radix-trie HTTP request router.
//!
//! switchback resolves an HTTP method and URL path to exactly one
//! registered handler, capturing named path parameters along the way. The
//! surrounding request policy (`405` answers with an `Allow` header,
//! automatic `OPTIONS` responses, and trailing-slash or case-corrected
//! redirects) is derived from the same tree.
//!
//! - **Only explicit matches**: a request matches one route or none; no
//!   priority rules between overlapping patterns
//! - **Path auto-correction**: trailing slashes, superfluous `..`/`//`
//!   elements, and wrong casing can all be answered with a redirect
//! - **Cheap parameters**: captures borrow the request path; nothing is
//!   copied on the hot path
//! - **Host-agnostic**: the router turns a request into a [`Response`];
//!   the embedding server owns all I/O and scheduling
//!
//! # Quick Start
//!
//! ```ignore
//! use switchback::prelude::*;
//!
//! let mut router = Router::new();
//! router.get("/hello/:name", |_ctx, _req, params| {
//!     Response::ok().with_text(format!("Hello, {}!", params.by_name("name").unwrap_or("world")))
//! })?;
//!
//! // The host server builds a RequestContext and Request per request:
//! let resp = router.serve(&ctx, &req);
//! ```
//!
//! # Crate Structure
//!
//! - [`switchback_core`]: request/response surface types and logging
//! - [`switchback_router`]: the path trie and method dispatcher

#![forbid(unsafe_code)]

// Re-export crates
pub use switchback_core as core;
pub use switchback_router as router;

// Re-export commonly used types
pub use switchback_core::{
    Body, CancelledError, Headers, LogConfig, LogEntry, LogFormat, LogLevel, Method, Request,
    RequestContext, Response, StatusCode,
};
pub use switchback_router::{
    clean_path, AllowedMethods, FileServer, Handler, Hook, PanicHook, Param, Params, RouteError,
    Router, MATCHED_ROUTE_PATH_PARAM,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Method, Param, Params, Request, RequestContext, Response, RouteError, Router, StatusCode,
    };
    pub use serde::{Deserialize, Serialize};
}

/// Testing utilities module.
pub mod testing {
    pub use switchback_core::testing::{test_context, RequestBuilder};
}
