//! Link generation.
//!
//! Generating a URL runs in two steps:
//!
//! 1. [`LinkGenerationDecisionTree`] finds the endpoints whose required
//!    values are satisfied by the supplied values, or by the ambient values
//!    of the current request for keys the caller did not supply.
//! 2. Each candidate, best first, is handed to the binder, which resolves a
//!    value for every template parameter and writes the path. The first
//!    candidate that binds wins.
//!
//! # Binding rules
//!
//! - A parameter takes the supplied value, else the ambient value, else the
//!   route's required value, else its default. An empty supplied value means
//!   "no value" and blocks the ambient one.
//! - Once a supplied value differs from the ambient value for the same
//!   parameter, ambient values are no longer used for later parameters.
//! - Supplied values the template does not consume are appended as a query
//!   string, in the order they were supplied.
//! - Trailing segments whose value equals their default are omitted.
//!
//! ```
//! use route_trie::{Route, RouteValues, Router};
//!
//! let router = Router::builder()
//!     .route(Route::new("{controller=Home}/{action=Index}/{id?}"))
//!     .build()
//!     .unwrap();
//! let links = router.links();
//!
//! let values = RouteValues::from([("controller", "Store"), ("action", "Index")]);
//! assert_eq!(links.get_path_by_values(&values, None).unwrap(), "/Store");
//!
//! let values = RouteValues::from([("controller", "Store"), ("page", "2")]);
//! assert_eq!(links.get_path_by_values(&values, None).unwrap(), "/Store?page=2");
//! ```

use crate::constraints::RouteDirection;
use crate::decision_tree::DecisionTree;
use crate::error::LinkError;
use crate::options::RouteOptions;
use crate::route::RouteEndpoint;
use crate::template::TemplatePart;
use crate::uri::UriBuildingContextPool;
use crate::values::{fold_case, values_equal, RouteValues};
use crate::{debug_log, trace_log};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Decision tree
// ============================================================================

/// A link generation candidate.
#[derive(Debug, Clone)]
pub struct OutboundMatchResult {
    pub endpoint: Arc<RouteEndpoint>,
    /// The endpoint was reached by treating an unsupplied key as absent.
    pub is_fallback_match: bool,
}

/// Decision tree over the endpoints' required values.
#[derive(Debug)]
pub struct LinkGenerationDecisionTree {
    tree: DecisionTree<Arc<RouteEndpoint>>,
}

impl LinkGenerationDecisionTree {
    pub fn new(endpoints: &[Arc<RouteEndpoint>]) -> Self {
        let entries = endpoints
            .iter()
            .map(|endpoint| {
                let criteria: Vec<(String, String)> = endpoint
                    .pattern()
                    .required_values()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (Arc::clone(endpoint), criteria)
            })
            .collect();
        Self {
            tree: DecisionTree::build(entries),
        }
    }

    /// Candidates for `values`, best first: by order, then descending
    /// outbound precedence, then exact before fallback, then template text.
    pub fn get_matches(&self, values: &RouteValues, ambient: Option<&RouteValues>) -> Vec<OutboundMatchResult> {
        let mut results: Vec<OutboundMatchResult> = self
            .tree
            .walk(values, ambient)
            .into_iter()
            .map(|m| OutboundMatchResult {
                endpoint: Arc::clone(m.item),
                is_fallback_match: m.is_fallback,
            })
            .collect();
        results.sort_by(compare_results);
        results
    }

    /// Levels of the underlying tree.
    pub fn depth(&self) -> usize {
        self.tree.depth()
    }
}

fn compare_results(a: &OutboundMatchResult, b: &OutboundMatchResult) -> Ordering {
    a.endpoint
        .order()
        .cmp(&b.endpoint.order())
        .then_with(|| b.endpoint.outbound_precedence().cmp(a.endpoint.outbound_precedence()))
        .then_with(|| a.is_fallback_match.cmp(&b.is_fallback_match))
        .then_with(|| a.endpoint.template().cmp(b.endpoint.template()))
}

// ============================================================================
// LinkGenerator
// ============================================================================

/// Generates paths and URIs from route values.
pub struct LinkGenerator {
    tree: LinkGenerationDecisionTree,
    named: HashMap<String, Arc<RouteEndpoint>>,
    pool: UriBuildingContextPool,
    lowercase_urls: bool,
    lowercase_query_strings: bool,
    append_trailing_slash: bool,
}

impl LinkGenerator {
    pub(crate) fn new(endpoints: &[Arc<RouteEndpoint>], options: &RouteOptions) -> Self {
        let tree = LinkGenerationDecisionTree::new(endpoints);
        debug_log!("Link generation tree built with depth {}", tree.depth());

        let named = endpoints
            .iter()
            .filter_map(|e| e.name().map(|n| (fold_case(n), Arc::clone(e))))
            .collect();

        Self {
            tree,
            named,
            pool: UriBuildingContextPool::new(options.uri_pool_capacity),
            lowercase_urls: options.lowercase_urls,
            lowercase_query_strings: options.lowercase_query_strings,
            append_trailing_slash: options.append_trailing_slash,
        }
    }

    /// Ordered candidates for `values`, before binding.
    pub fn candidates(&self, values: &RouteValues, ambient: Option<&RouteValues>) -> Vec<OutboundMatchResult> {
        self.tree.get_matches(values, ambient)
    }

    /// Generate a path from the best route that can bind `values`.
    pub fn get_path_by_values(
        &self,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
    ) -> Result<String, LinkError> {
        for candidate in self.tree.get_matches(values, ambient) {
            if let Some(path) = self.bind(&candidate.endpoint, values, ambient) {
                trace_log!("Generated '{}' from route '{}'", path, candidate.endpoint.display_name());
                return Ok(path);
            }
        }
        Err(LinkError::NoMatchingRoute)
    }

    /// Generate a path from the route registered as `name`.
    pub fn get_path_by_name(
        &self,
        name: &str,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
    ) -> Result<String, LinkError> {
        let endpoint = self
            .named
            .get(&fold_case(name))
            .ok_or_else(|| LinkError::UnknownRouteName(name.to_string()))?;
        self.bind(endpoint, values, ambient)
            .ok_or(LinkError::NoMatchingRoute)
    }

    /// Like [`get_path_by_values`](Self::get_path_by_values), prefixed with
    /// `scheme://host` and `path_base`.
    pub fn get_uri_by_values(
        &self,
        scheme: &str,
        host: &str,
        path_base: &str,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
    ) -> Result<String, LinkError> {
        let path = self.get_path_by_values(values, ambient)?;
        Ok(absolute_uri(scheme, host, path_base, &path))
    }

    /// Like [`get_path_by_name`](Self::get_path_by_name), prefixed with
    /// `scheme://host` and `path_base`.
    pub fn get_uri_by_name(
        &self,
        scheme: &str,
        host: &str,
        path_base: &str,
        name: &str,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
    ) -> Result<String, LinkError> {
        let path = self.get_path_by_name(name, values, ambient)?;
        Ok(absolute_uri(scheme, host, path_base, &path))
    }

    /// Bind `values` to one endpoint's template. `None` if the endpoint
    /// cannot produce a URL for these values.
    pub fn bind(
        &self,
        endpoint: &RouteEndpoint,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
    ) -> Option<String> {
        let Some(accepted) = accept_values(endpoint, values, ambient) else {
            trace_log!("Route '{}' cannot bind the supplied values", endpoint.display_name());
            return None;
        };

        let pattern = endpoint.pattern();
        let mut combined = accepted.clone();
        for (key, value) in pattern.defaults().iter().chain(values.iter()) {
            if !combined.contains_key(key) {
                combined.insert(key, value);
            }
        }
        if !endpoint.matches_constraints(&combined, RouteDirection::UrlGeneration) {
            return None;
        }

        let mut context = self.pool.get();
        let mut skipped_optional = false;

        for segment in pattern.segments() {
            if let Some(parameter) = segment.as_parameter() {
                let Some(value) = accepted.get(parameter.name()) else {
                    skipped_optional = true;
                    continue;
                };
                let defaultable = parameter
                    .default_value()
                    .is_some_and(|d| values_equal(d, value));
                if !defaultable && skipped_optional {
                    trace_log!(
                        "Route '{}': value for '{}' follows an omitted optional parameter",
                        endpoint.display_name(),
                        parameter.name()
                    );
                    return None;
                }
                context.begin_segment(defaultable);
                context.encode_value(
                    value,
                    0,
                    value.len(),
                    parameter.encode_slashes(),
                    endpoint.transformer_for(parameter.name()),
                );
                continue;
            }

            if skipped_optional {
                return None;
            }
            context.begin_segment(false);
            let parts = segment.parts();
            for (i, part) in parts.iter().enumerate() {
                match part {
                    TemplatePart::Literal(text) => context.append_literal(text),
                    TemplatePart::Separator(text) => {
                        let next_has_value = parts
                            .get(i + 1)
                            .and_then(TemplatePart::as_parameter)
                            .is_some_and(|p| accepted.get_non_empty(p.name()).is_some());
                        if next_has_value {
                            context.append_literal(text);
                        }
                    }
                    TemplatePart::Parameter(parameter) => match accepted.get(parameter.name()) {
                        Some(value) => context.encode_value(
                            value,
                            0,
                            value.len(),
                            parameter.encode_slashes(),
                            endpoint.transformer_for(parameter.name()),
                        ),
                        None if parameter.is_optional() => {}
                        None => return None,
                    },
                }
            }
        }

        for (key, value) in extra_values(endpoint, values) {
            context.append_query(key, value);
        }

        let mut path = if context.path().is_empty() {
            "/".to_string()
        } else {
            context.path().to_string()
        };
        let mut query = context.query().to_string();
        if self.lowercase_urls {
            path = path.to_lowercase();
            if self.lowercase_query_strings {
                query = query.to_lowercase();
            }
        }
        if self.append_trailing_slash && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&query);
        Some(path)
    }
}

impl fmt::Debug for LinkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkGenerator")
            .field("named_routes", &self.named.len())
            .field("tree_depth", &self.tree.depth())
            .finish()
    }
}

/// Resolve a value for every template parameter and validate fixed values.
fn accept_values(
    endpoint: &RouteEndpoint,
    values: &RouteValues,
    ambient: Option<&RouteValues>,
) -> Option<RouteValues> {
    let pattern = endpoint.pattern();
    let required = pattern.required_values();
    let mut accepted = RouteValues::new();
    let mut use_ambient = ambient.is_some();

    for parameter in pattern.parameters() {
        let key = parameter.name();
        let supplied = values.get(key);
        let ambient_value = ambient.and_then(|a| a.get(key));

        if use_ambient {
            match (supplied, ambient_value) {
                (Some(s), Some(a)) if !values_equal(s, a) => use_ambient = false,
                (None, None) if parameter.default_value().is_none() => use_ambient = false,
                _ => {}
            }
        }

        let mut value = match supplied {
            Some(s) if !s.is_empty() => Some(s),
            Some(_) => None,
            None if use_ambient => ambient_value.filter(|a| !a.is_empty()),
            None => None,
        };

        if let Some(required_value) = required.get_non_empty(key) {
            value = match value {
                // An explicit value must agree; an ambient one is overridden.
                Some(v) if !values_equal(v, required_value) => {
                    if supplied.is_some_and(|s| !s.is_empty()) {
                        return None;
                    }
                    Some(required_value)
                }
                Some(v) => Some(v),
                None => Some(required_value),
            };
        }

        match value.or(parameter.default_value()) {
            Some(v) => {
                accepted.insert(key, v);
            }
            None if parameter.is_optional() || parameter.is_catch_all() => {}
            None => return None,
        }
    }

    // Fixed values outside the template must not be contradicted.
    for (key, default) in pattern.defaults().iter() {
        if pattern.parameter(key).is_some() {
            continue;
        }
        if values.get_non_empty(key).is_some_and(|s| !values_equal(s, default)) {
            return None;
        }
    }
    for (key, required_value) in required.iter() {
        if pattern.parameter(key).is_some() {
            continue;
        }
        if let Some(s) = values.get(key) {
            let agrees = if required_value.is_empty() {
                s.is_empty()
            } else {
                values_equal(s, required_value)
            };
            if !agrees {
                return None;
            }
        }
    }

    Some(accepted)
}

/// Supplied values not consumed by the template, in supplied order.
fn extra_values<'v>(endpoint: &RouteEndpoint, values: &'v RouteValues) -> Vec<(&'v str, &'v str)> {
    let pattern = endpoint.pattern();
    values
        .iter()
        .filter(|(key, value)| {
            !value.is_empty()
                && pattern.parameter(key).is_none()
                && !pattern.defaults().contains_key(key)
                && !pattern.required_values().contains_key(key)
        })
        .collect()
}

fn absolute_uri(scheme: &str, host: &str, path_base: &str, path: &str) -> String {
    let base = path_base.trim_end_matches('/');
    let separator = if base.is_empty() || base.starts_with('/') { "" } else { "/" };
    format!("{}://{}{}{}{}", scheme, host, separator, base, path)
}
