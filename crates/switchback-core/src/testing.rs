//! Test tooling.
//!
//! Helpers used by the workspace's own tests and by downstream crates that
//! want to exercise a router without a host server.

use crate::context::RequestContext;
use crate::request::{Body, Method, Request};

/// Fluent builder for [`Request`] values in tests.
///
/// # Example
///
/// ```ignore
/// let req = RequestBuilder::new(Method::Get, "/user/gopher")
///     .query("page=2")
///     .header("Accept", "text/plain")
///     .build();
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, Vec<u8>)>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Start building a request for `method` and `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set the query string (without the leading `?`).
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Build the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        let mut req = Request::new(self.method, self.path);
        req.set_query(self.query);
        for (name, value) in self.headers {
            req.headers_mut().insert(name, value);
        }
        if let Some(body) = self.body {
            req.set_body(Body::Bytes(body));
        }
        req
    }
}

/// A fresh [`RequestContext`] for tests.
#[must_use]
pub fn test_context() -> RequestContext {
    RequestContext::new(0)
}
