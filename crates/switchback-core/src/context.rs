//! Per-request context.
//!
//! [`RequestContext`] is the opaque value the host server creates for each
//! request and the router passes through to handlers untouched. It carries
//! request-scoped identity and a cooperative cancellation flag; everything
//! else about the request lives in [`Request`](crate::Request).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Request-scoped context handed to every handler.
///
/// # Example
///
/// ```ignore
/// fn handler(ctx: &RequestContext, req: &Request, params: Params<'_>) -> Response {
///     // Bail out early if the client went away.
///     if ctx.is_cancelled() {
///         return Response::new(StatusCode::BAD_REQUEST);
///     }
///     // Do work...
///     Response::ok()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier for tracing.
    request_id: u64,
    /// Set by the host when the client disconnects or the request times out.
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    /// Creates a new request context.
    ///
    /// This is typically called by the host server when accepting a new
    /// request.
    #[must_use]
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the unique request identifier.
    ///
    /// Useful for logging and tracing across the request lifecycle.
    #[must_use]
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Requests cancellation of the in-flight request.
    ///
    /// Called by the host; handlers observe it via [`is_cancelled`] or
    /// [`checkpoint`].
    ///
    /// [`is_cancelled`]: Self::is_cancelled
    /// [`checkpoint`]: Self::checkpoint
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Checks if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cooperative cancellation checkpoint.
    ///
    /// Call this at natural stopping points in a handler to allow graceful
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`CancelledError`] if cancellation is pending.
    pub fn checkpoint(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// Error returned when a request has been cancelled.
///
/// Returned by [`RequestContext::checkpoint`] when the request should stop
/// processing. The host converts this to an appropriate response.
#[derive(Debug, Clone, Copy)]
pub struct CancelledError;

impl fmt::Display for CancelledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request cancelled")
    }
}

impl std::error::Error for CancelledError {}
