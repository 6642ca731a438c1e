//! URL generation scenarios.

use crate::common::*;
use route_trie::*;

/// A conventional table with an area route and a route that only serves
/// links outside any area.
fn area_router() -> Router {
    init_logging();
    Router::builder()
        .route(
            Route::new("Help/{controller}/{action}")
                .name("help")
                .default_value("area", "Help")
                .required_value("area", "Help"),
        )
        .route(
            Route::new("{controller}/{action}")
                .required_value("area", "")
                .required_value("controller", "Store")
                .required_value("action", "Buy"),
        )
        .build()
        .unwrap()
}

// ============================================================================
// Required and ambient values
// ============================================================================

#[test]
fn test_absent_area_is_satisfied_implicitly() {
    let router = area_router();
    let supplied = values(&[("controller", "Store"), ("action", "Buy")]);
    let ambient = values(&[("area", "Help"), ("controller", "Home"), ("action", "Index")]);

    let candidates = router.links().candidates(&supplied, Some(&ambient));
    let found: Vec<(&str, bool)> = candidates
        .iter()
        .map(|c| (c.endpoint.template(), c.is_fallback_match))
        .collect();
    assert_eq!(
        found,
        vec![("Help/{controller}/{action}", false), ("{controller}/{action}", true)]
    );

    // The ambient area keeps the link inside it.
    assert_eq!(
        router.links().get_path_by_values(&supplied, Some(&ambient)).unwrap(),
        "/Help/Store/Buy"
    );
}

#[test]
fn test_leaving_an_area() {
    let router = area_router();
    let ambient = values(&[("area", "Help"), ("controller", "Home"), ("action", "Index")]);

    let supplied = values(&[("area", ""), ("controller", "Store"), ("action", "Buy")]);
    assert_eq!(
        router.links().get_path_by_values(&supplied, Some(&ambient)).unwrap(),
        "/Store/Buy"
    );

    let supplied = values(&[("controller", "Store"), ("action", "Buy")]);
    assert_eq!(router.links().get_path_by_values(&supplied, None).unwrap(), "/Store/Buy");
}

#[test]
fn test_required_values_reject_other_values() {
    let router = area_router();
    let supplied = values(&[("controller", "Cart"), ("action", "View")]);
    assert_eq!(
        router.links().get_path_by_values(&supplied, None),
        Err(LinkError::NoMatchingRoute)
    );
}

#[test]
fn test_ambient_values_reused_until_a_value_changes() {
    let router = conventional_router();
    let ambient = values(&[("controller", "Products"), ("action", "Details"), ("id", "42")]);

    let same_action = values(&[("action", "Details")]);
    assert_eq!(
        router.links().get_path_by_name("default", &same_action, Some(&ambient)).unwrap(),
        "/Products/Details/42"
    );

    let other_action = values(&[("action", "Edit")]);
    assert_eq!(
        router.links().get_path_by_name("default", &other_action, Some(&ambient)).unwrap(),
        "/Products/Edit"
    );
}

// ============================================================================
// Path and query writing
// ============================================================================

#[test]
fn test_defaults_elided_and_extras_become_query() {
    let router = conventional_router();
    let supplied = values(&[("controller", "Home"), ("action", "Index"), ("sort", "name"), ("page", "2")]);

    assert_eq!(
        router.links().get_path_by_name("default", &supplied, None).unwrap(),
        "/?sort=name&page=2"
    );
}

#[test]
fn test_values_are_percent_encoded() {
    let router = router(&["search/{term}", "files/{*path}"]);

    let supplied = values(&[("term", "a b/c")]);
    assert_eq!(router.links().get_path_by_values(&supplied, None).unwrap(), "/search/a%20b%2Fc");

    let supplied = values(&[("path", "a/b b1/c c1")]);
    assert_eq!(
        router.links().get_path_by_values(&supplied, None).unwrap(),
        "/files/a/b%20b1/c%20c1"
    );
}

#[test]
fn test_generated_path_routes_back() {
    let router = router(&["orders/{year:int}/{id}"]);
    let supplied = values(&[("year", "2024"), ("id", "A-17")]);

    let path = router.links().get_path_by_values(&supplied, None).unwrap();
    assert_eq!(path, "/orders/2024/A-17");

    let m = router.match_path(&path).unwrap();
    assert_eq!(m.values, supplied);
}

#[test]
fn test_constraints_checked_when_generating() {
    let router = router(&["orders/{year:int}/{id}"]);
    let supplied = values(&[("year", "last"), ("id", "1")]);
    assert!(router.links().get_path_by_values(&supplied, None).is_err());
}

#[test]
fn test_absolute_uri() {
    let router = conventional_router();
    let supplied = values(&[("controller", "Products")]);

    assert_eq!(
        router
            .links()
            .get_uri_by_name("https", "shop.example.com", "/store", "default", &supplied, None)
            .unwrap(),
        "https://shop.example.com/store/Products"
    );

    // Ambient values fill in what the caller left out.
    let ambient = values(&[("controller", "Products"), ("action", "Details"), ("id", "42")]);
    assert_eq!(
        router
            .links()
            .get_uri_by_name("https", "shop.example.com", "", "default", &RouteValues::new(), Some(&ambient))
            .unwrap(),
        "https://shop.example.com/Products/Details/42"
    );
    assert_eq!(
        router
            .links()
            .get_uri_by_values("http", "localhost:8080", "", &supplied, None)
            .unwrap(),
        "http://localhost:8080/Products"
    );
}

#[test]
fn test_unknown_route_name() {
    let router = conventional_router();
    let error = router
        .links()
        .get_path_by_name("nosuch", &RouteValues::new(), None)
        .unwrap_err();
    assert_eq!(error, LinkError::UnknownRouteName("nosuch".to_string()));
}

#[test]
fn test_url_options() {
    init_logging();
    let router = Router::builder()
        .options(
            RouteOptions::default()
                .lowercase_urls(true)
                .append_trailing_slash(true),
        )
        .route(Route::new("Catalog/{category}"))
        .build()
        .unwrap();

    let supplied = values(&[("category", "Garden"), ("Filter", "Red")]);
    assert_eq!(
        router.links().get_path_by_values(&supplied, None).unwrap(),
        "/catalog/garden/?Filter=Red"
    );
}
