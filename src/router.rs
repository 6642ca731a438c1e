//! The assembled router.
//!
//! [`RouterBuilder`] compiles a list of [`Route`]s once into immutable
//! structures:
//!
//! - matching trees, one per route order, for incoming requests
//! - an [`EndpointSelector`] running the matcher policies
//! - a [`LinkGenerator`] for outgoing URLs
//!
//! A built [`Router`] is read-only and can be shared across threads.
//!
//! ```
//! use route_trie::{Route, RouteRequest, Router, RouteValues};
//!
//! let router = Router::builder()
//!     .route(Route::new("products/{id:int}").name("product").method("GET"))
//!     .route(Route::new("products").method("POST"))
//!     .build()
//!     .unwrap();
//!
//! let outcome = router.route(&RouteRequest::new("/products/42"));
//! assert_eq!(outcome.matched().unwrap().values.get("id"), Some("42"));
//!
//! let outcome = router.route(&RouteRequest::new("/products").with_method("DELETE"));
//! assert!(outcome.is_method_not_allowed());
//!
//! let path = router
//!     .links()
//!     .get_path_by_name("product", &RouteValues::from([("id", "7")]), None)
//!     .unwrap();
//! assert_eq!(path, "/products/7");
//! ```

use crate::error::{RouteOutcome, RouterError};
use crate::link::LinkGenerator;
use crate::matcher::{RouteMatch, TreeMatcher};
use crate::options::RouteOptions;
use crate::route::{Route, RouteEndpoint};
use crate::selector::{EndpointSelector, HostMatcherPolicy, HttpMethodMatcherPolicy, MatcherPolicy, RouteRequest};
use crate::tree::{build_trees, UrlMatchingTree};
use crate::values::{fold_case, values_equal};
use crate::{debug_log, info_log, trace_log, warn_log};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Collects routes, policies and options for a [`Router`].
pub struct RouterBuilder {
    routes: Vec<Route>,
    policies: Vec<Arc<dyn MatcherPolicy>>,
    default_policies: bool,
    options: RouteOptions,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            policies: Vec::new(),
            default_policies: true,
            options: RouteOptions::default(),
        }
    }

    /// Add a route.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Add several routes.
    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Add a matcher policy. Policies run in ascending
    /// [`order`](MatcherPolicy::order).
    pub fn policy(mut self, policy: impl MatcherPolicy) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    /// Skip the built-in HTTP method and host policies.
    pub fn without_default_policies(mut self) -> Self {
        self.default_policies = false;
        self
    }

    pub fn options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }

    /// Compile the routes.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid template, unresolvable inline policy, or
    /// route name used twice.
    pub fn build(self) -> Result<Router, RouterError> {
        let mut names = HashSet::new();
        for name in self.routes.iter().filter_map(Route::route_name) {
            if !names.insert(fold_case(name)) {
                warn_log!("Route name '{}' is registered more than once", name);
                return Err(RouterError::DuplicateRouteName(name.to_string()));
            }
        }

        let mut endpoints = Vec::with_capacity(self.routes.len());
        for (id, route) in self.routes.into_iter().enumerate() {
            let template = route.template().to_string();
            let endpoint = route
                .into_endpoint(id, &self.options.constraint_map, self.options.strict_constraints)
                .inspect_err(|e| {
                    warn_log!("Route '{}' rejected: {}", template, e);
                })?;
            debug_log!("Compiled route '{}'", endpoint.display_name());
            endpoints.push(Arc::new(endpoint));
        }

        let mut policies: Vec<Arc<dyn MatcherPolicy>> = Vec::new();
        if self.default_policies {
            policies.push(Arc::new(HttpMethodMatcherPolicy));
            policies.push(Arc::new(HostMatcherPolicy));
        }
        policies.extend(self.policies);

        let trees = build_trees(&endpoints);
        let selector = EndpointSelector::new(&policies, &endpoints);
        let links = LinkGenerator::new(&endpoints, &self.options);

        info_log!(
            "Router built: {} routes in {} trees, policies {:?}",
            endpoints.len(),
            trees.len(),
            selector.policy_names()
        );

        Ok(Router {
            endpoints,
            trees,
            selector,
            links,
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.routes.len())
            .field("policies", &self.policies.len())
            .field("default_policies", &self.default_policies)
            .finish()
    }
}

/// Compiled, immutable routing table.
#[derive(Debug)]
pub struct Router {
    endpoints: Vec<Arc<RouteEndpoint>>,
    trees: Vec<UrlMatchingTree>,
    selector: EndpointSelector,
    links: LinkGenerator,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Route a request: match the path, then narrow by policies.
    pub fn route(&self, request: &RouteRequest) -> RouteOutcome {
        let candidates = self.candidates(request.path());
        trace_log!(
            "{} {}: {} candidates",
            request.method(),
            request.path(),
            candidates.len()
        );
        self.selector.select(candidates, request)
    }

    /// Route a `GET` request for `path` without host or headers and return
    /// the winner, if there is exactly one.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.route(&RouteRequest::new(path)).into_matched()
    }

    /// Every endpoint whose template and constraints match `path`, in
    /// traversal order, before policies run.
    pub fn candidates(&self, path: &str) -> Vec<RouteMatch> {
        let mut seen = HashSet::new();
        TreeMatcher::new(&self.trees)
            .candidates(path)
            .filter(|c| seen.insert(c.endpoint.id()))
            .collect()
    }

    /// Link generation over the same routes.
    pub fn links(&self) -> &LinkGenerator {
        &self.links
    }

    /// All endpoints in registration order.
    pub fn endpoints(&self) -> &[Arc<RouteEndpoint>] {
        &self.endpoints
    }

    /// Matching trees in ascending order.
    pub fn trees(&self) -> &[UrlMatchingTree] {
        &self.trees
    }

    pub fn endpoint_by_name(&self, name: &str) -> Option<&Arc<RouteEndpoint>> {
        self.endpoints
            .iter()
            .find(|e| e.name().is_some_and(|n| values_equal(n, name)))
    }

    /// [`route`](Self::route) through a [`RouteCache`](crate::RouteCache).
    #[cfg(feature = "cache")]
    pub fn route_cached(&self, cache: &mut crate::cache::RouteCache, request: &RouteRequest) -> RouteOutcome {
        if let Some(outcome) = cache.get(request) {
            return outcome;
        }
        let outcome = self.route(request);
        cache.insert(request, outcome.clone());
        outcome
    }
}
