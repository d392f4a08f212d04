//! Getting Started Example
//!
//! Builds a router, registers a few routes, and drives it with test
//! requests the way an embedding server would.
//!
//! Run with: cargo run --example getting_started -p switchback

use switchback::testing::{test_context, RequestBuilder};
use switchback::{Method, Params, Request, RequestContext, Response, Router, StatusCode};

/// Handler for GET /
fn hello(_ctx: &RequestContext, _req: &Request, _params: Params<'_>) -> Response {
    Response::ok().with_text("Hello, World!")
}

/// Handler for GET /hello/:name
fn hello_name(_ctx: &RequestContext, _req: &Request, params: Params<'_>) -> Response {
    let name = params.by_name("name").unwrap_or("world");
    Response::ok().with_text(format!("Hello, {name}!"))
}

fn main() {
    println!("switchback getting started\n");

    let mut router = Router::new();
    router.get("/", hello).expect("register /");
    router
        .get("/hello/:name", hello_name)
        .expect("register /hello/:name");
    router
        .post("/items", |_ctx, _req, _params| {
            Response::new(StatusCode::OK).with_text("created")
        })
        .expect("register /items");

    let ctx = test_context();

    // === Plain dispatch ===
    let req = RequestBuilder::new(Method::Get, "/").build();
    let resp = router.serve(&ctx, &req);
    println!(
        "GET / -> {} ({})",
        resp.status(),
        String::from_utf8_lossy(resp.body())
    );
    assert_eq!(resp.status(), StatusCode::OK);

    // === Parameter capture ===
    let req = RequestBuilder::new(Method::Get, "/hello/gopher").build();
    let resp = router.serve(&ctx, &req);
    println!(
        "GET /hello/gopher -> {} ({})",
        resp.status(),
        String::from_utf8_lossy(resp.body())
    );
    assert_eq!(resp.body(), b"Hello, gopher!");

    // === Trailing-slash redirect ===
    let req = RequestBuilder::new(Method::Get, "/hello/gopher/").build();
    let resp = router.serve(&ctx, &req);
    println!(
        "GET /hello/gopher/ -> {} (Location: {})",
        resp.status(),
        resp.headers().get_str("location").unwrap_or("-")
    );
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);

    // === 405 with Allow ===
    let req = RequestBuilder::new(Method::Get, "/items").build();
    let resp = router.serve(&ctx, &req);
    println!(
        "GET /items -> {} (Allow: {})",
        resp.status(),
        resp.headers().get_str("allow").unwrap_or("-")
    );
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    // === 404 for unknown routes ===
    let req = RequestBuilder::new(Method::Get, "/nonexistent").build();
    let resp = router.serve(&ctx, &req);
    println!("GET /nonexistent -> {}", resp.status());
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    println!("\nAll getting started examples validated successfully!");
}
