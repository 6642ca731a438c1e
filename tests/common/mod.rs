//! Test utilities shared by the unit and integration suites.
//!
//! Provides router fixtures, request helpers, and assertion utilities.

#![allow(dead_code)]

use route_trie::*;

/// Initialise `env_logger` once so `RUST_LOG=route_trie=trace` shows the
/// engine's diagnostics while a test runs.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a router from templates with default options.
pub fn router(templates: &[&str]) -> Router {
    init_logging();
    Router::builder()
        .routes(templates.iter().map(|t| Route::new(*t)))
        .build()
        .expect("fixture templates must be valid")
}

/// The conventional MVC route table used by several scenarios.
pub fn conventional_router() -> Router {
    init_logging();
    Router::builder()
        .route(Route::new("{controller=Home}/{action=Index}/{id?}").name("default"))
        .route(
            Route::new("Help/{controller}/{action}")
                .name("help")
                .default_value("area", "Help")
                .required_value("area", "Help"),
        )
        .build()
        .expect("conventional routes must be valid")
}

pub fn get(path: &str) -> RouteRequest {
    RouteRequest::new(path)
}

pub fn values(pairs: &[(&str, &str)]) -> RouteValues {
    pairs.iter().copied().collect()
}

/// Assert that `path` routes to `template` and return the extracted values.
#[track_caller]
pub fn assert_routes_to(router: &Router, path: &str, template: &str) -> RouteValues {
    match router.route(&get(path)) {
        RouteOutcome::Matched(m) => {
            assert_eq!(m.endpoint.template(), template, "wrong route for '{}'", path);
            m.values
        }
        other => panic!("expected '{}' to match '{}', got {:?}", path, template, other),
    }
}

#[track_caller]
pub fn assert_not_found(router: &Router, path: &str) {
    let outcome = router.route(&get(path));
    assert!(outcome.is_not_found(), "expected no match for '{}', got {:?}", path, outcome);
}
