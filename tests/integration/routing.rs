//! Request matching scenarios.

use crate::common::*;
use route_trie::*;

// ============================================================================
// Precedence and order
// ============================================================================

#[test]
fn test_literal_route_beats_catch_all() {
    let router = router(&["{controller}/{action}/{*parameters}", "Customer/Index/{id}"]);

    let values = assert_routes_to(&router, "/Customer/Index/5", "Customer/Index/{id}");
    assert_eq!(values.get("id"), Some("5"));

    let values = assert_routes_to(&router, "/Orders/List/2024/05", "{controller}/{action}/{*parameters}");
    assert_eq!(values.get("parameters"), Some("2024/05"));
}

#[test]
fn test_constrained_parameter_beats_plain_parameter() {
    let router = router(&["items/{name}", "items/{id:int}"]);

    assert_routes_to(&router, "/items/12", "items/{id:int}");
    assert_routes_to(&router, "/items/widget", "items/{name}");
}

#[test]
fn test_lower_order_wins_regardless_of_specificity() {
    init_logging();
    let router = Router::builder()
        .route(Route::new("pages/about").order(10))
        .route(Route::new("pages/{slug}"))
        .build()
        .unwrap();

    assert_routes_to(&router, "/pages/about", "pages/{slug}");
    assert_eq!(router.candidates("/pages/about").len(), 2);
}

#[test]
fn test_ambiguous_routes_are_reported() {
    let router = router(&["{a}/x", "{b}/x"]);
    let outcome = router.route(&get("/1/x"));

    let mut templates: Vec<&str> = outcome
        .ambiguous_candidates()
        .iter()
        .map(|e| e.template())
        .collect();
    templates.sort_unstable();
    assert_eq!(templates, vec!["{a}/x", "{b}/x"]);
    assert!(router.match_path("/1/x").is_none());
}

// ============================================================================
// Defaults, optionals and catch-alls
// ============================================================================

#[test]
fn test_conventional_defaults() {
    let router = conventional_router();

    let values = assert_routes_to(&router, "/", "{controller=Home}/{action=Index}/{id?}");
    assert_eq!(values.get("controller"), Some("Home"));
    assert_eq!(values.get("action"), Some("Index"));
    assert_eq!(values.len(), 2);

    let values = assert_routes_to(&router, "/Products", "{controller=Home}/{action=Index}/{id?}");
    assert_eq!(values.get("action"), Some("Index"));

    let values = assert_routes_to(&router, "/Help/Store/Buy", "Help/{controller}/{action}");
    assert_eq!(values.get("area"), Some("Help"));
}

#[test]
fn test_catch_all_may_be_empty() {
    let router = router(&["files/{*path}"]);

    let values = assert_routes_to(&router, "/files/docs/readme.md", "files/{*path}");
    assert_eq!(values.get("path"), Some("docs/readme.md"));

    let values = assert_routes_to(&router, "/files", "files/{*path}");
    assert!(!values.contains_key("path"));
}

#[test]
fn test_segment_count_must_fit() {
    let router = router(&["{a}/{b}"]);

    assert_not_found(&router, "/x");
    assert_not_found(&router, "/x/y/z");
    assert_not_found(&router, "/x//y");
    assert_routes_to(&router, "/x/y/", "{a}/{b}");
}

#[test]
fn test_literals_ignore_case_values_keep_it() {
    let router = router(&["api/{Resource}"]);
    let values = assert_routes_to(&router, "/API/Orders", "api/{Resource}");
    assert_eq!(values.get("resource"), Some("Orders"));
}

// ============================================================================
// Complex segments
// ============================================================================

#[test]
fn test_complex_segment_with_optional_extension() {
    let router = router(&["reports/{year}-{month}.{format?}"]);

    let values = assert_routes_to(&router, "/reports/2024-05.pdf", "reports/{year}-{month}.{format?}");
    assert_eq!(values.get("year"), Some("2024"));
    assert_eq!(values.get("month"), Some("05"));
    assert_eq!(values.get("format"), Some("pdf"));

    let values = assert_routes_to(&router, "/reports/2024-05", "reports/{year}-{month}.{format?}");
    assert_eq!(values.get("month"), Some("05"));
    assert!(!values.contains_key("format"));

    assert_not_found(&router, "/reports/202405");
}

// ============================================================================
// Constraints
// ============================================================================

fn ends_with_router() -> Router {
    init_logging();
    let options = RouteOptions::default().constraint("endsWith", 1, |args| {
        let suffix = args[0].to_string();
        Ok(ParameterPolicy::constraint(constraint_fn(move |v| v.ends_with(&suffix))))
    });
    Router::builder()
        .options(options)
        .route(Route::new("withconstraints/{id:endsWith(_001)}"))
        .route(Route::new("withoptionalconstraints/{id:endsWith(_001)?}"))
        .build()
        .unwrap()
}

#[test]
fn test_custom_inline_constraint() {
    let router = ends_with_router();

    let values = assert_routes_to(&router, "/withconstraints/555_001", "withconstraints/{id:endsWith(_001)}");
    assert_eq!(values.get("id"), Some("555_001"));
    assert_not_found(&router, "/withconstraints/555");
}

#[test]
fn test_optional_parameter_skips_constraint_when_absent() {
    let router = ends_with_router();
    let template = "withoptionalconstraints/{id:endsWith(_001)?}";

    assert_routes_to(&router, "/withoptionalconstraints", template);
    assert_routes_to(&router, "/withoptionalconstraints/555_001", template);
    assert_not_found(&router, "/withoptionalconstraints/555");
}

#[test]
fn test_explicit_constraint_on_route() {
    init_logging();
    let router = Router::builder()
        .route(
            Route::new("users/{name}")
                .constraint("name", ParameterPolicy::constraint(constraint_fn(|v| v.len() <= 8))),
        )
        .build()
        .unwrap();

    assert_routes_to(&router, "/users/alice", "users/{name}");
    assert_not_found(&router, "/users/bartholomew");
}

#[test]
fn test_registered_constraint_ranks_like_inline_constraint() {
    init_logging();
    let router = Router::builder()
        .route(
            Route::new("items/{id}")
                .constraint("id", ParameterPolicy::constraint(constraint_fn(|v| v.parse::<u64>().is_ok()))),
        )
        .route(Route::new("items/{name}"))
        .build()
        .unwrap();

    let values = assert_routes_to(&router, "/items/5", "items/{id}");
    assert_eq!(values.get("id"), Some("5"));
    assert_routes_to(&router, "/items/widget", "items/{name}");
}

#[test]
fn test_constraint_failure_falls_through_to_next_candidate() {
    let router = router(&["blog/{year:int:min(2000)}", "blog/{slug}"]);

    assert_routes_to(&router, "/blog/2021", "blog/{year:int:min(2000)}");
    assert_routes_to(&router, "/blog/1999", "blog/{slug}");
}
