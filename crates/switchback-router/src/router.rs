//! The method dispatcher.
//!
//! [`Router`] owns one path trie per HTTP method and implements the
//! request policy around them: parameter-capturing dispatch,
//! trailing-slash and case-corrected redirects, `Allow` aggregation for
//! `405` responses and automatic `OPTIONS` answers, and the not-found
//! fallback. Handlers and hooks are plain functions returning a
//! [`Response`]; the host server stays in charge of all I/O.
//!
//! Registration requires `&mut self`; serving borrows the router shared,
//! so a built router can be used from any number of threads without
//! locking.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use switchback_core::logging::{self, LogLevel};
use switchback_core::{Method, Request, RequestContext, Response, StatusCode};

use crate::error::RouteError;
use crate::params::{Param, Params, MATCHED_ROUTE_PATH_PARAM};
use crate::path::clean_path;
use crate::tree::Node;

const LOG_TARGET: &str = "switchback::router";

/// A registered request handler.
pub type Handler =
    Box<dyn Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync>;

/// A fallback hook (not-found, method-not-allowed, global OPTIONS).
pub type Hook = Box<dyn Fn(&RequestContext, &Request) -> Response + Send + Sync>;

/// Hook invoked with the opaque payload recovered from a panicking
/// handler.
pub type PanicHook =
    Box<dyn Fn(&RequestContext, &Request, Box<dyn Any + Send>) -> Response + Send + Sync>;

/// Backend consumed by [`Router::serve_files`].
///
/// The router captures the remainder of the request path (always starting
/// with `/`) and delegates; how files are located and encoded is the
/// backend's business.
pub trait FileServer: Send + Sync + 'static {
    /// Serve the file at `path`.
    fn serve(&self, ctx: &RequestContext, req: &Request, path: &str) -> Response;
}

pub(crate) struct Registration {
    handler: Handler,
    /// Pattern text, recorded only when matched-route recording is on.
    pattern: Option<Box<str>>,
}

/// Normalized `Allow` list: lexicographically sorted, deduplicated, and
/// including `OPTIONS` whenever at least one method is allowed.
#[derive(Debug, Clone)]
pub struct AllowedMethods {
    methods: Vec<String>,
}

impl AllowedMethods {
    /// Create a normalized allow list from the matching methods.
    #[must_use]
    pub fn new(methods: Vec<&str>) -> Self {
        let mut methods: Vec<String> = methods.into_iter().map(str::to_owned).collect();
        if !methods.is_empty() {
            methods.push(Method::Options.as_str().to_owned());
        }
        methods.sort();
        methods.dedup();
        Self { methods }
    }

    /// Access the normalized methods.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Check whether a method is allowed.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    /// True when no method matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Format as an HTTP `Allow` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.methods.join(", ")
    }
}

/// Radix-trie request router.
///
/// # Example
///
/// ```ignore
/// let mut router = Router::new();
/// router.get("/user/:name", |_ctx, _req, params| {
///     Response::ok().with_text(format!("hello {}", params.by_name("name").unwrap_or("")))
/// })?;
///
/// let resp = router.serve(&ctx, &req);
/// ```
pub struct Router {
    /// One tree per method; methods are opaque, case-sensitive text.
    trees: HashMap<String, Node<Registration>>,
    /// Cached `Allow` value for `OPTIONS *`, refreshed on registration.
    global_allowed: String,
    redirect_trailing_slash: bool,
    redirect_fixed_path: bool,
    handle_method_not_allowed: bool,
    handle_options: bool,
    save_matched_route_path: bool,
    global_options: Option<Hook>,
    not_found: Option<Hook>,
    method_not_allowed: Option<Hook>,
    panic_handler: Option<PanicHook>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
            global_allowed: String::new(),
            redirect_trailing_slash: true,
            redirect_fixed_path: false,
            handle_method_not_allowed: true,
            handle_options: true,
            save_matched_route_path: false,
            global_options: None,
            not_found: None,
            method_not_allowed: None,
            panic_handler: None,
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Router")
            .field("methods", &methods)
            .field("redirect_trailing_slash", &self.redirect_trailing_slash)
            .field("redirect_fixed_path", &self.redirect_fixed_path)
            .field("handle_method_not_allowed", &self.handle_method_not_allowed)
            .field("handle_options", &self.handle_options)
            .field("save_matched_route_path", &self.save_matched_route_path)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a router with the default policy: trailing-slash redirects,
    /// `405` handling, and automatic `OPTIONS` answers enabled; fixed-path
    /// redirects and matched-route recording disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Enable or disable redirects that add or strip one trailing slash.
    #[must_use]
    pub fn redirect_trailing_slash(mut self, enabled: bool) -> Self {
        self.redirect_trailing_slash = enabled;
        self
    }

    /// Enable or disable redirects to a cleaned, case-corrected path when
    /// the exact lookup misses.
    #[must_use]
    pub fn redirect_fixed_path(mut self, enabled: bool) -> Self {
        self.redirect_fixed_path = enabled;
        self
    }

    /// Enable or disable `405 Method Not Allowed` responses computed from
    /// the other methods' trees.
    #[must_use]
    pub fn handle_method_not_allowed(mut self, enabled: bool) -> Self {
        self.handle_method_not_allowed = enabled;
        self
    }

    /// Enable or disable automatic `OPTIONS` responses.
    #[must_use]
    pub fn handle_options(mut self, enabled: bool) -> Self {
        self.handle_options = enabled;
        self
    }

    /// When enabled, every dispatch appends a synthetic parameter keyed
    /// [`MATCHED_ROUTE_PATH_PARAM`] carrying the registered pattern.
    ///
    /// Only affects routes registered after the flag is set.
    #[must_use]
    pub fn save_matched_route_path(mut self, enabled: bool) -> Self {
        self.save_matched_route_path = enabled;
        self
    }

    /// Hook answering automatic `OPTIONS` requests (the `Allow` header is
    /// set by the router after the hook runs).
    #[must_use]
    pub fn global_options<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RequestContext, &Request) -> Response + Send + Sync + 'static,
    {
        self.global_options = Some(Box::new(hook));
        self
    }

    /// Hook invoked when no route and no policy answer matched.
    #[must_use]
    pub fn not_found<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RequestContext, &Request) -> Response + Send + Sync + 'static,
    {
        self.not_found = Some(Box::new(hook));
        self
    }

    /// Hook producing `405` responses (the `Allow` header is set by the
    /// router after the hook runs).
    #[must_use]
    pub fn method_not_allowed<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RequestContext, &Request) -> Response + Send + Sync + 'static,
    {
        self.method_not_allowed = Some(Box::new(hook));
        self
    }

    /// Install a panic trap around dispatch. The hook receives the
    /// recovered payload verbatim; without one, panics propagate to the
    /// host.
    #[must_use]
    pub fn panic_handler<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RequestContext, &Request, Box<dyn Any + Send>) -> Response + Send + Sync + 'static,
    {
        self.panic_handler = Some(Box::new(hook));
        self
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register `handler` for `method` (arbitrary, case-sensitive text)
    /// and `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] and leaves routing unchanged if the
    /// pattern is malformed or conflicts with an existing registration.
    pub fn handle<H>(&mut self, method: &str, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.register(method, pattern, Box::new(handler))
    }

    /// Register `handler` for a standard method.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn route<H>(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.handle(method.as_str(), pattern, handler)
    }

    /// Register a `GET` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn get<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Get, pattern, handler)
    }

    /// Register a `HEAD` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn head<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Head, pattern, handler)
    }

    /// Register an `OPTIONS` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn options<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Options, pattern, handler)
    }

    /// Register a `POST` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn post<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Post, pattern, handler)
    }

    /// Register a `PUT` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn put<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Put, pattern, handler)
    }

    /// Register a `PATCH` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn patch<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Patch, pattern, handler)
    }

    /// Register a `DELETE` route.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn delete<H>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&RequestContext, &Request, Params<'_>) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Delete, pattern, handler)
    }

    /// Register a `GET` catch-all delegating to a file-serving backend.
    /// The pattern must end with `/*filepath`.
    ///
    /// # Errors
    ///
    /// [`RouteError::MissingFilepathWildcard`] for a bad suffix, otherwise
    /// see [`handle`](Self::handle).
    pub fn serve_files<F>(&mut self, pattern: &str, files: F) -> Result<(), RouteError>
    where
        F: FileServer,
    {
        if !pattern.ends_with("/*filepath") {
            return Err(RouteError::MissingFilepathWildcard {
                pattern: pattern.to_owned(),
            });
        }
        self.route(Method::Get, pattern, move |ctx, req, params| {
            let filepath = params.by_name("filepath").unwrap_or("/");
            files.serve(ctx, req, filepath)
        })
    }

    fn register(&mut self, method: &str, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        if method.is_empty() {
            return Err(RouteError::EmptyMethod);
        }
        let registration = Registration {
            handler,
            pattern: self.save_matched_route_path.then(|| pattern.into()),
        };

        let root = self.trees.entry(method.to_owned()).or_default();
        let fresh = root.is_unused();
        match root.insert(pattern, registration) {
            Ok(()) => {
                self.global_allowed = self.allowed("*", "");
                if logging::enabled(LogLevel::Debug) {
                    logging::log(
                        LogLevel::Debug,
                        LOG_TARGET,
                        &format!("registered {method} {pattern}"),
                    );
                }
                Ok(())
            }
            Err(err) => {
                // Don't leave an empty per-method tree behind; it would
                // surface in the global Allow set.
                if fresh {
                    self.trees.remove(method);
                }
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Route a request and produce its response.
    ///
    /// When a panic handler is installed the whole dispatch, hooks
    /// included, runs under a panic trap.
    pub fn serve(&self, ctx: &RequestContext, req: &Request) -> Response {
        match &self.panic_handler {
            Some(hook) => {
                match panic::catch_unwind(AssertUnwindSafe(|| self.route_request(ctx, req))) {
                    Ok(resp) => resp,
                    Err(payload) => hook(ctx, req, payload),
                }
            }
            None => self.route_request(ctx, req),
        }
    }

    /// Resolve (method, path) without invoking anything.
    ///
    /// For embedders that route requests themselves: returns the handler,
    /// the captured parameters, and the trailing-slash recommendation.
    #[must_use]
    pub fn lookup<'a>(
        &'a self,
        method: &str,
        path: &'a str,
    ) -> (Option<&'a Handler>, Params<'a>, bool) {
        let Some(root) = self.trees.get(method) else {
            return (None, Params::new(), false);
        };
        let (value, mut params, tsr) = root.lookup(path);
        // The root path has no trailing-slash variant.
        let tsr = tsr && path != "/";
        match value {
            Some(reg) => {
                if let Some(pattern) = reg.pattern.as_deref() {
                    params.push(Param::new(MATCHED_ROUTE_PATH_PARAM, pattern));
                }
                (Some(&reg.handler), params, tsr)
            }
            None => (None, params, tsr),
        }
    }

    fn route_request(&self, ctx: &RequestContext, req: &Request) -> Response {
        let method = req.method();
        let path = req.path();

        if let Some(root) = self.trees.get(method.as_str()) {
            let (value, mut params, tsr) = root.lookup(path);
            if let Some(reg) = value {
                if let Some(pattern) = reg.pattern.as_deref() {
                    params.push(Param::new(MATCHED_ROUTE_PATH_PARAM, pattern));
                }
                return (reg.handler)(ctx, req, params);
            }

            if method != Method::Connect && path != "/" {
                if tsr && self.redirect_trailing_slash {
                    let target = if path.len() > 1 && path.ends_with('/') {
                        path[..path.len() - 1].to_owned()
                    } else {
                        format!("{path}/")
                    };
                    return self.redirect(req, &target);
                }

                if self.redirect_fixed_path {
                    let cleaned = clean_path(path);
                    if let Some(fixed) =
                        root.find_case_insensitive(&cleaned, self.redirect_trailing_slash)
                    {
                        return self.redirect(req, &fixed);
                    }
                }
            }
        }

        if method == Method::Options && self.handle_options {
            let allow = self.allowed(path, Method::Options.as_str());
            if !allow.is_empty() {
                let mut resp = match &self.global_options {
                    Some(hook) => hook(ctx, req),
                    None => Response::ok(),
                };
                resp.headers_mut().insert("Allow", allow);
                return resp;
            }
        } else if self.handle_method_not_allowed {
            let allow = self.allowed(path, method.as_str());
            if !allow.is_empty() {
                if logging::enabled(LogLevel::Debug) {
                    logging::log(
                        LogLevel::Debug,
                        LOG_TARGET,
                        &format!("{method} {path} not allowed (Allow: {allow})"),
                    );
                }
                let mut resp = match &self.method_not_allowed {
                    Some(hook) => hook(ctx, req),
                    None => Response::method_not_allowed(),
                };
                resp.headers_mut().insert("Allow", allow);
                return resp;
            }
        }

        if logging::enabled(LogLevel::Debug) {
            logging::log(
                LogLevel::Debug,
                LOG_TARGET,
                &format!("{method} {path} not found"),
            );
        }
        match &self.not_found {
            Some(hook) => hook(ctx, req),
            None => Response::not_found(),
        }
    }

    /// Build the redirect response for a corrected path, preserving the
    /// query string. `301` for `GET`, `308` for everything else.
    fn redirect(&self, req: &Request, target: &str) -> Response {
        let status = if req.method() == Method::Get {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::PERMANENT_REDIRECT
        };
        let location = match req.query() {
            Some(query) => format!("{target}?{query}"),
            None => target.to_owned(),
        };
        Response::redirect(status, location)
    }

    /// Compute the `Allow` value for `path`, probing every method's tree
    /// except `req_method` and `OPTIONS`. `"*"` means server-wide; with a
    /// non-empty `req_method` it answers from the registration-time cache.
    fn allowed(&self, path: &str, req_method: &str) -> String {
        if path == "*" && !req_method.is_empty() {
            return self.global_allowed.clone();
        }

        let mut methods: Vec<&str> = Vec::new();
        if path == "*" {
            for method in self.trees.keys() {
                if method != Method::Options.as_str() {
                    methods.push(method.as_str());
                }
            }
        } else {
            for (method, root) in &self.trees {
                if method == req_method || method == Method::Options.as_str() {
                    continue;
                }
                if root.lookup(path).0.is_some() {
                    methods.push(method.as_str());
                }
            }
        }
        AllowedMethods::new(methods).header_value()
    }
}
