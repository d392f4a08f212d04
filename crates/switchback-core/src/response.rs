//! HTTP response types.

use std::fmt;

use serde::Serialize;

use crate::request::Headers;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const NO_CONTENT: Self = Self(204);
    pub const MOVED_PERMANENTLY: Self = Self(301);
    pub const PERMANENT_REDIRECT: Self = Self(308);
    pub const BAD_REQUEST: Self = Self(400);
    pub const NOT_FOUND: Self = Self(404);
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    pub const IM_A_TEAPOT: Self = Self(418);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Create a status code from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    /// Numeric value of the status code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Canonical reason phrase, or an empty string for unknown codes.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            204 => "No Content",
            301 => "Moved Permanently",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            418 => "I'm a teapot",
            500 => "Internal Server Error",
            _ => "",
        }
    }

    /// True for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// True for 3xx codes.
    #[must_use]
    pub const fn is_redirect(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP response.
///
/// The router core builds responses in memory and hands them to the host
/// server for writing; it never touches the wire itself.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    /// Create an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// `200 OK` with an empty body.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// `404 Not Found` with the conventional text body.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND).with_text("404 page not found")
    }

    /// `405 Method Not Allowed` with the conventional text body.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED).with_text("405 method not allowed")
    }

    /// A redirect with the `Location` header set.
    #[must_use]
    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        Self::new(status).with_header("Location", location.into())
    }

    /// A response with a JSON body serialized from `value`.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `value` cannot be encoded.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        let mut resp = Self::new(status);
        resp.headers
            .insert("Content-Type", "application/json; charset=utf-8");
        resp.body = body;
        Ok(resp)
    }

    /// Set the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a plain-text body.
    #[must_use]
    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.headers
            .insert("Content-Type", "text/plain; charset=utf-8");
        self.body = body.into().into_bytes();
        self
    }

    /// Set a raw body without touching the content type.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set the status code in place.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Get the headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get mutable headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get the body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_constants() {
        assert_eq!(StatusCode::OK.as_u16(), 200);
        assert_eq!(StatusCode::MOVED_PERMANENTLY.reason(), "Moved Permanently");
        assert!(StatusCode::OK.is_success());
        assert!(StatusCode::PERMANENT_REDIRECT.is_redirect());
        assert!(!StatusCode::NOT_FOUND.is_success());
    }

    #[test]
    fn redirect_sets_location() {
        let resp = Response::redirect(StatusCode::MOVED_PERMANENTLY, "/path");
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers().get_str("location"), Some("/path"));
        assert!(resp.body().is_empty());
    }

    #[test]
    fn text_body_sets_content_type() {
        let resp = Response::ok().with_text("hello");
        assert_eq!(
            resp.headers().get_str("content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(resp.body(), b"hello");
    }

    #[test]
    fn json_body_round_trips() {
        #[derive(Serialize)]
        struct Item {
            id: i64,
            name: &'static str,
        }

        let resp = Response::json(StatusCode::OK, &Item { id: 7, name: "x" })
            .expect("serialization must succeed");
        assert_eq!(
            resp.headers().get_str("content-type"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(resp.body(), br#"{"id":7,"name":"x"}"#);
    }
}
