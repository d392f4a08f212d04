//! Radix-trie HTTP request router.
//!
//! This crate provides the routing core for the switchback framework: a
//! compressing radix tree that maps an HTTP method and URL path to a
//! registered handler while capturing path parameters in a single pass.
//!
//! # Features
//!
//! - Only explicit matches: a request resolves to exactly one route or none
//! - Named parameters (`/user/:name`) and catch-alls (`/src/*filepath`)
//! - Trailing-slash and case-corrected redirects derived from the same tree
//! - `Allow` aggregation for `405` and automatic `OPTIONS` answers
//! - Zero-copy parameter capture borrowed from the request path

#![forbid(unsafe_code)]

mod error;
mod params;
mod path;
mod router;
mod tree;

pub use error::RouteError;
pub use params::{Param, Params, MATCHED_ROUTE_PATH_PARAM};
pub use path::clean_path;
pub use router::{AllowedMethods, FileServer, Handler, Hook, PanicHook, Router};
