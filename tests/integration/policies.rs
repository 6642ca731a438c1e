//! Endpoint selection through matcher policies.

use crate::common::*;
use route_trie::*;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// HTTP methods
// ============================================================================

fn orders_router() -> Router {
    init_logging();
    Router::builder()
        .route(Route::new("orders").method("GET").display_name("list orders"))
        .route(Route::new("orders").method("post").display_name("create order"))
        .route(Route::new("orders/{id}").methods(["GET", "PUT"]).display_name("order"))
        .route(Route::new("health").display_name("health"))
        .build()
        .unwrap()
}

#[test]
fn test_method_selects_endpoint() {
    let router = orders_router();

    let outcome = router.route(&get("/orders"));
    assert_eq!(outcome.matched().unwrap().endpoint.display_name(), "list orders");

    let outcome = router.route(&get("/orders").with_method("POST"));
    assert_eq!(outcome.matched().unwrap().endpoint.display_name(), "create order");
}

#[test]
fn test_method_not_allowed_lists_methods() {
    let router = orders_router();

    match router.route(&get("/orders").with_method("DELETE")) {
        RouteOutcome::MethodNotAllowed { allowed_methods } => {
            assert_eq!(allowed_methods, vec!["GET", "POST"]);
        }
        other => panic!("expected 405, got {:?}", other),
    }

    match router.route(&get("/orders/7").with_method("PATCH")) {
        RouteOutcome::MethodNotAllowed { allowed_methods } => {
            assert_eq!(allowed_methods, vec!["GET", "PUT"]);
        }
        other => panic!("expected 405, got {:?}", other),
    }
}

#[test]
fn test_endpoint_without_methods_accepts_any() {
    let router = orders_router();
    let outcome = router.route(&get("/health").with_method("OPTIONS"));
    assert_eq!(outcome.matched().unwrap().endpoint.display_name(), "health");
}

#[test]
fn test_unmatched_path_is_not_found_not_405() {
    let router = orders_router();
    assert!(router.route(&get("/missing").with_method("DELETE")).is_not_found());
}

#[test]
fn test_method_specific_route_beats_any_method_route() {
    init_logging();
    let router = Router::builder()
        .route(Route::new("products").method("GET").display_name("list products"))
        .route(Route::new("products").display_name("products fallback"))
        .build()
        .unwrap();

    let outcome = router.route(&get("/products"));
    assert_eq!(outcome.matched().unwrap().endpoint.display_name(), "list products");

    let outcome = router.route(&get("/products").with_method("PUT"));
    assert_eq!(outcome.matched().unwrap().endpoint.display_name(), "products fallback");
}

// ============================================================================
// Hosts
// ============================================================================

fn host_router() -> Router {
    init_logging();
    Router::builder()
        .route(Route::new("").host("*.example.com").display_name("tenant home"))
        .route(Route::new("").host("admin.example.com").display_name("admin home"))
        .route(Route::new("").host("localhost:8080").display_name("dev home"))
        .build()
        .unwrap()
}

fn home_for(router: &Router, host: Option<&str>) -> Option<String> {
    let mut request = get("/");
    if let Some(host) = host {
        request = request.with_host(host);
    }
    router
        .route(&request)
        .into_matched()
        .map(|m| m.endpoint.display_name().to_string())
}

#[test]
fn test_most_specific_host_wins() {
    let router = host_router();

    assert_eq!(home_for(&router, Some("admin.example.com")).as_deref(), Some("admin home"));
    assert_eq!(home_for(&router, Some("shop.example.com")).as_deref(), Some("tenant home"));
    assert_eq!(home_for(&router, Some("localhost:8080")).as_deref(), Some("dev home"));
}

#[test]
fn test_unmatched_hosts() {
    let router = host_router();

    // `*.example.com` covers subdomains only.
    assert_eq!(home_for(&router, Some("example.com")), None);
    assert_eq!(home_for(&router, Some("localhost:9090")), None);
    assert_eq!(home_for(&router, None), None);
}

#[test]
fn test_wildcard_host_survives_next_to_exact_host() {
    init_logging();
    let router = Router::builder()
        .route(Route::new("{*path}").host("*.example.com").display_name("tenant pages"))
        .route(Route::new("admin").host("api.example.com").display_name("api admin"))
        .build()
        .unwrap();

    let page = |path: &str, host: &str| {
        router
            .route(&get(path).with_host(host))
            .into_matched()
            .map(|m| m.endpoint.display_name().to_string())
    };

    assert_eq!(page("/foo", "api.example.com").as_deref(), Some("tenant pages"));
    assert_eq!(page("/admin", "api.example.com").as_deref(), Some("api admin"));
    assert_eq!(page("/admin", "www.example.com").as_deref(), Some("tenant pages"));
}

#[test]
fn test_port_pattern_next_to_exact_host() {
    init_logging();
    let router = Router::builder()
        .route(Route::new("a").host("*:8080").display_name("a"))
        .route(Route::new("b").host("example.com").display_name("b"))
        .build()
        .unwrap();

    let found = |path: &str, host: &str| router.route(&get(path).with_host(host)).is_matched();

    assert!(found("/a", "example.com:8080"));
    assert!(found("/b", "example.com:8080"));
    assert!(!found("/a", "example.com"));
    assert!(!found("/b", "other.com:8080"));
}

#[test]
fn test_host_specific_route_beats_hostless_route() {
    init_logging();
    let router = Router::builder()
        .route(Route::new("home").host("example.com").display_name("example home"))
        .route(Route::new("home").display_name("any home"))
        .build()
        .unwrap();

    assert_eq!(home_page(&router, Some("example.com")).as_deref(), Some("example home"));
    assert_eq!(home_page(&router, Some("other.com")).as_deref(), Some("any home"));
    assert_eq!(home_page(&router, None).as_deref(), Some("any home"));
}

fn home_page(router: &Router, host: Option<&str>) -> Option<String> {
    let mut request = get("/home");
    if let Some(host) = host {
        request = request.with_host(host);
    }
    router
        .route(&request)
        .into_matched()
        .map(|m| m.endpoint.display_name().to_string())
}

// ============================================================================
// Custom policy
// ============================================================================

/// Routes `x-tenant` headers to endpoints tagged with `tenant` metadata.
struct TenantPolicy;

struct TenantTable {
    destinations: HashMap<String, usize>,
    exit: usize,
}

impl PolicyJumpTable for TenantTable {
    fn destination(&self, request: &RouteRequest) -> usize {
        request
            .header("x-tenant")
            .and_then(|t| self.destinations.get(t).copied())
            .unwrap_or(self.exit)
    }
}

impl MatcherPolicy for TenantPolicy {
    fn name(&self) -> &'static str {
        "TenantPolicy"
    }

    fn order(&self) -> i32 {
        0
    }

    fn applies_to(&self, endpoints: &[Arc<RouteEndpoint>]) -> bool {
        endpoints.iter().any(|e| e.metadata("tenant").is_some())
    }

    fn edges(&self, endpoints: &[Arc<RouteEndpoint>]) -> Vec<PolicyEdge> {
        let mut edges: Vec<PolicyEdge> = Vec::new();
        for endpoint in endpoints {
            let Some(tenant) = endpoint.metadata("tenant") else {
                continue;
            };
            match edges.iter_mut().find(|e| e.state == tenant) {
                Some(edge) => edge.endpoints.push(Arc::clone(endpoint)),
                None => edges.push(PolicyEdge {
                    state: tenant.to_string(),
                    endpoints: vec![Arc::clone(endpoint)],
                }),
            }
        }
        edges
    }

    fn build_jump_table(&self, exit: usize, edges: &[PolicyJumpTableEdge]) -> Box<dyn PolicyJumpTable> {
        let destinations = edges.iter().map(|e| (e.state.clone(), e.destination)).collect();
        Box::new(TenantTable { destinations, exit })
    }
}

#[test]
fn test_custom_policy_narrows_by_header() {
    init_logging();
    let router = Router::builder()
        .policy(TenantPolicy)
        .route(Route::new("dashboard").metadata("tenant", "acme").display_name("acme"))
        .route(Route::new("dashboard").metadata("tenant", "globex").display_name("globex"))
        .build()
        .unwrap();

    // Without the header no tenant edge is selected.
    assert!(router.route(&get("/dashboard")).is_not_found());

    let outcome = router.route(&get("/dashboard").with_header("X-Tenant", "globex"));
    assert_eq!(outcome.matched().unwrap().endpoint.display_name(), "globex");

    let outcome = router.route(&get("/dashboard").with_header("x-tenant", "initech"));
    assert!(outcome.is_not_found());
}
