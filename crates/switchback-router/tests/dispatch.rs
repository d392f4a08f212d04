//! End-to-end dispatcher behavior: routing, redirects, Allow aggregation,
//! hooks, and the lookup side door.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use switchback_core::testing::{test_context, RequestBuilder};
use switchback_core::{Method, Request, RequestContext, Response, StatusCode};
use switchback_router::{FileServer, RouteError, Router, MATCHED_ROUTE_PATH_PARAM};

// =============================================================================
// Dispatch and registration
// =============================================================================

#[test]
fn dispatches_with_captured_params() {
    let mut router = Router::new();
    let routed = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&routed);
    router
        .get("/user/:name", move |_ctx, _req, params| {
            seen.store(true, Ordering::SeqCst);
            assert_eq!(params.by_name("name"), Some("gopher"));
            assert_eq!(params.len(), 1);
            Response::ok()
        })
        .unwrap();

    let ctx = test_context();
    let req = RequestBuilder::new(Method::Get, "/user/gopher").build();
    let resp = router.serve(&ctx, &req);
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(routed.load(Ordering::SeqCst));
}

#[test]
fn per_method_registration() {
    let methods = [
        Method::Get,
        Method::Head,
        Method::Options,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    let mut router = Router::new();
    let hits = Arc::new(AtomicUsize::new(0));
    for method in methods {
        let hits = Arc::clone(&hits);
        router
            .route(method, "/any", move |_, _, _| {
                hits.fetch_add(1, Ordering::SeqCst);
                Response::ok()
            })
            .unwrap();
    }

    let ctx = test_context();
    for method in methods {
        let resp = router.serve(&ctx, &RequestBuilder::new(method, "/any").build());
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
    }
    assert_eq!(hits.load(Ordering::SeqCst), methods.len());
}

#[test]
fn invalid_registrations_fail() {
    let mut router = Router::new();

    let err = router.handle("", "/", |_, _, _| Response::ok()).unwrap_err();
    assert_eq!(err, RouteError::EmptyMethod);

    let err = router.get("", |_, _, _| Response::ok()).unwrap_err();
    assert_eq!(err, RouteError::EmptyPattern);

    let err = router
        .get("noSlashRoot", |_, _, _| Response::ok())
        .unwrap_err();
    assert!(matches!(err, RouteError::PatternMustStartWithSlash { .. }));

    let err = router
        .get("/user/:$matchedRoutePath", |_, _, _| Response::ok())
        .unwrap_err();
    assert!(matches!(err, RouteError::ReservedParamName { .. }));

    let err = router
        .get("/user/:name", |_, _, _| Response::ok())
        .and_then(|()| router.get("/user/:name", |_, _, _| Response::ok()))
        .unwrap_err();
    assert!(matches!(err, RouteError::DuplicateRoute { .. }));
}

#[test]
fn routers_chain_through_the_not_found_hook() {
    let bar = Arc::new(AtomicBool::new(false));
    let bar_hit = Arc::clone(&bar);
    let mut router2 = Router::new();
    router2
        .post("/bar", move |_, _, _| {
            bar_hit.store(true, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();

    let foo = Arc::new(AtomicBool::new(false));
    let foo_hit = Arc::clone(&foo);
    let mut router1 = Router::new();
    router1
        .post("/foo", move |_, _, _| {
            foo_hit.store(true, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();
    let router1 = router1.not_found(move |ctx, req| router2.serve(ctx, req));

    let ctx = test_context();

    let resp = router1.serve(&ctx, &RequestBuilder::new(Method::Post, "/foo").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(foo.load(Ordering::SeqCst));

    let resp = router1.serve(&ctx, &RequestBuilder::new(Method::Post, "/bar").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(bar.load(Ordering::SeqCst));

    let resp = router1.serve(&ctx, &RequestBuilder::new(Method::Post, "/qax").build());
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// OPTIONS and 405
// =============================================================================

#[test]
fn options_requests_are_answered() {
    let mut router = Router::new();
    router.post("/path", |_, _, _| Response::ok()).unwrap();

    let ctx = test_context();

    // Server-wide.
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Options, "*").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get_str("allow"), Some("OPTIONS, POST"));

    // Specific path.
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Options, "/path").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get_str("allow"), Some("OPTIONS, POST"));

    // Unknown path falls through to the not-found answer.
    let resp = router.serve(
        &ctx,
        &RequestBuilder::new(Method::Options, "/doesnotexist").build(),
    );
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Another method plus a global OPTIONS hook adjusting the status.
    router.get("/path", |_, _, _| Response::ok()).unwrap();
    let mut router = router.global_options(|_, _| Response::new(StatusCode::NO_CONTENT));

    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Options, "*").build());
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers().get_str("allow"), Some("GET, OPTIONS, POST"));

    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Options, "/path").build());
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers().get_str("allow"), Some("GET, OPTIONS, POST"));

    // An explicitly registered OPTIONS route wins on its path but not on "*".
    let custom = Arc::new(AtomicBool::new(false));
    let custom_hit = Arc::clone(&custom);
    router
        .options("/path", move |_, _, _| {
            custom_hit.store(true, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();

    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Options, "*").build());
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!custom.load(Ordering::SeqCst));

    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Options, "/path").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(custom.load(Ordering::SeqCst));
}

#[test]
fn method_not_allowed_lists_alternatives() {
    let mut router = Router::new();
    router.post("/path", |_, _, _| Response::ok()).unwrap();

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/path").build());
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get_str("allow"), Some("OPTIONS, POST"));

    // More methods; a registered OPTIONS route must not repeat in Allow.
    router.delete("/path", |_, _, _| Response::ok()).unwrap();
    router.options("/path", |_, _, _| Response::ok()).unwrap();

    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/path").build());
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        resp.headers().get_str("allow"),
        Some("DELETE, OPTIONS, POST")
    );

    // Custom hook keeps the computed Allow header.
    let router = router.method_not_allowed(|_, _| {
        Response::new(StatusCode::IM_A_TEAPOT).with_text("custom method")
    });
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/path").build());
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(resp.body(), b"custom method");
    assert_eq!(
        resp.headers().get_str("allow"),
        Some("DELETE, OPTIONS, POST")
    );
}

// =============================================================================
// Redirects and not-found
// =============================================================================

#[test]
fn not_found_and_redirects() {
    let mut router = Router::new();
    for route in ["/path", "/dir/", "/"] {
        router.get(route, |_, _, _| Response::ok()).unwrap();
    }
    let router = router.redirect_fixed_path(true);

    let ctx = test_context();
    let cases: &[(&str, StatusCode, Option<&str>)] = &[
        ("/path/", StatusCode::MOVED_PERMANENTLY, Some("/path")), // TSR -/
        ("/dir", StatusCode::MOVED_PERMANENTLY, Some("/dir/")),   // TSR +/
        ("", StatusCode::OK, None), // empty target normalizes to "/"
        ("/PATH", StatusCode::MOVED_PERMANENTLY, Some("/path")),  // fixed case
        ("/DIR/", StatusCode::MOVED_PERMANENTLY, Some("/dir/")),  // fixed case
        ("/PATH/", StatusCode::MOVED_PERMANENTLY, Some("/path")), // fixed case -/
        ("/DIR", StatusCode::MOVED_PERMANENTLY, Some("/dir/")),   // fixed case +/
        ("/../path", StatusCode::MOVED_PERMANENTLY, Some("/path")), // path cleaning
        ("/nope", StatusCode::NOT_FOUND, None),
    ];
    for &(path, status, location) in cases {
        let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, path).build());
        assert_eq!(resp.status(), status, "GET {path:?}");
        if let Some(location) = location {
            assert_eq!(
                resp.headers().get_str("location"),
                Some(location),
                "GET {path:?}"
            );
        }
    }
}

#[test]
fn non_get_methods_redirect_permanently() {
    let mut router = Router::new();
    router.patch("/path", |_, _, _| Response::ok()).unwrap();

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Patch, "/path/").build());
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(resp.headers().get_str("location"), Some("/path"));
}

#[test]
fn custom_not_found_hook_runs() {
    let mut router = Router::new();
    router.get("/path", |_, _, _| Response::ok()).unwrap();

    let called = Arc::new(AtomicBool::new(false));
    let hit = Arc::clone(&called);
    let router = router.not_found(move |_, _| {
        hit.store(true, Ordering::SeqCst);
        Response::new(StatusCode::NOT_FOUND)
    });

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/nope").build());
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn root_misses_are_plain_not_found() {
    // No node for the prefix "/" exists at all.
    let mut router = Router::new();
    router.get("/a", |_, _, _| Response::ok()).unwrap();

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/").build());
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let (handler, _, tsr) = router.lookup("GET", "/");
    assert!(handler.is_none());
    assert!(!tsr);
}

#[test]
fn connect_never_redirects() {
    let mut router = Router::new();
    router
        .route(Method::Connect, "/path", |_, _, _| Response::ok())
        .unwrap();

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Connect, "/path/").build());
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn redirects_preserve_the_query_string() {
    let mut router = Router::new();
    router.get("/path", |_, _, _| Response::ok()).unwrap();

    let ctx = test_context();
    let req = RequestBuilder::new(Method::Get, "/path/")
        .query("k=v&x=1")
        .build();
    let resp = router.serve(&ctx, &req);
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers().get_str("location"), Some("/path?k=v&x=1"));
}

// =============================================================================
// Panic trapping
// =============================================================================

#[test]
fn panics_are_trapped_when_a_hook_is_installed() {
    let mut router = Router::new();
    router
        .put("/user/:name", |_, _, _| -> Response { panic!("oops!") })
        .unwrap();

    let handled = Arc::new(AtomicBool::new(false));
    let hit = Arc::clone(&handled);
    let router = router.panic_handler(move |_, _, payload| {
        hit.store(true, Ordering::SeqCst);
        let message = payload.downcast_ref::<&str>().copied().unwrap_or("");
        assert_eq!(message, "oops!");
        Response::new(StatusCode::INTERNAL_SERVER_ERROR)
    });

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Put, "/user/gopher").build());
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(handled.load(Ordering::SeqCst));
}

// =============================================================================
// Lookup side door
// =============================================================================

#[test]
fn lookup_without_executing() {
    let mut router = Router::new();

    // Empty router first.
    let (handler, _, tsr) = router.lookup("GET", "/nope");
    assert!(handler.is_none());
    assert!(!tsr);

    let routed = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&routed);
    router
        .get("/user/:name", move |_, _, _| {
            seen.store(true, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();
    router.get("/user", |_, _, _| Response::ok()).unwrap();

    let ctx = test_context();
    let req = RequestBuilder::new(Method::Get, "/user/gopher").build();
    {
        let (handler, params, _) = router.lookup("GET", "/user/gopher");
        let handler = handler.expect("handler for /user/gopher");
        assert_eq!(params.by_name("name"), Some("gopher"));
        let resp = handler(&ctx, &req, params);
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert!(routed.load(Ordering::SeqCst));

    let (handler, params, _) = router.lookup("GET", "/user");
    assert!(handler.is_some());
    assert!(params.is_empty());

    let (handler, _, tsr) = router.lookup("GET", "/user/gopher/");
    assert!(handler.is_none());
    assert!(tsr);

    let (handler, _, tsr) = router.lookup("GET", "/nope");
    assert!(handler.is_none());
    assert!(!tsr);
}

// =============================================================================
// Matched-route recording
// =============================================================================

#[test]
fn matched_route_path_is_recorded() {
    let mut router = Router::new().save_matched_route_path(true);
    let routed = Arc::new(AtomicUsize::new(0));

    let hit = Arc::clone(&routed);
    router
        .get("/user/:name", move |_, _, params| {
            assert_eq!(params.matched_route_path(), Some("/user/:name"));
            let last = params.get(params.len() - 1).map(|p| p.key);
            assert_eq!(last, Some(MATCHED_ROUTE_PATH_PARAM));
            hit.fetch_add(1, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();
    let hit = Arc::clone(&routed);
    router
        .get("/user/:name/details", move |_, _, params| {
            assert_eq!(params.matched_route_path(), Some("/user/:name/details"));
            hit.fetch_add(1, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();
    let hit = Arc::clone(&routed);
    router
        .get("/", move |_, _, params| {
            assert_eq!(params.matched_route_path(), Some("/"));
            hit.fetch_add(1, Ordering::SeqCst);
            Response::ok()
        })
        .unwrap();

    let ctx = test_context();
    for path in ["/user/gopher", "/user/gopher/details", "/"] {
        let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, path).build());
        assert_eq!(resp.status(), StatusCode::OK, "GET {path:?}");
    }
    assert_eq!(routed.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Static files
// =============================================================================

struct MockFiles {
    opened: Arc<AtomicBool>,
}

impl FileServer for MockFiles {
    fn serve(&self, _ctx: &RequestContext, _req: &Request, path: &str) -> Response {
        self.opened.store(true, Ordering::SeqCst);
        Response::ok().with_text(path.to_owned())
    }
}

#[test]
fn serve_files_requires_the_filepath_suffix() {
    let mut router = Router::new();

    let err = router
        .serve_files(
            "/noFilepath",
            MockFiles {
                opened: Arc::new(AtomicBool::new(false)),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RouteError::MissingFilepathWildcard { .. }));

    let opened = Arc::new(AtomicBool::new(false));
    router
        .serve_files(
            "/*filepath",
            MockFiles {
                opened: Arc::clone(&opened),
            },
        )
        .unwrap();

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/favicon.ico").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body(), b"/favicon.ico");
    assert!(opened.load(Ordering::SeqCst));
}

#[test]
fn root_catch_all_captures_a_slash() {
    let mut router = Router::new();
    router
        .get("/*x", |_, _, params| {
            Response::ok().with_text(params.by_name("x").unwrap_or("").to_owned())
        })
        .unwrap();

    let ctx = test_context();
    let resp = router.serve(&ctx, &RequestBuilder::new(Method::Get, "/").build());
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body(), b"/");
}
