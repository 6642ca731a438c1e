//! Route registration and compiled endpoints.
//!
//! A [`Route`] is what callers register: a template plus optional name,
//! order, defaults, required values and metadata. Building a router compiles
//! each route into an immutable [`RouteEndpoint`] with its parsed pattern,
//! precedence values and resolved parameter policies.
//!
//! # Example
//!
//! ```
//! use route_trie::Route;
//!
//! let route = Route::new("/api/{controller}/{action=Index}/{id:int?}")
//!     .name("api")
//!     .order(1)
//!     .methods(["GET", "HEAD"])
//!     .host("*.example.com")
//!     .metadata("area", "public");
//!
//! assert_eq!(route.template(), "/api/{controller}/{action=Index}/{id:int?}");
//! ```

use crate::constraints::{ParameterPolicy, ParameterTransformer, RouteConstraint, RouteDirection};
use crate::error::{PolicyError, RouterError};
use crate::precedence::Precedence;
use crate::resolver::ParameterPolicyResolver;
use crate::template::RoutePattern;
use crate::values::{values_equal, RouteValues};
use crate::{trace_log, warn_log};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Route (registration)
// ============================================================================

/// A route as registered by the caller.
#[derive(Clone, Debug)]
pub struct Route {
    template: String,
    name: Option<String>,
    display_name: Option<String>,
    order: i32,
    defaults: RouteValues,
    required_values: RouteValues,
    constraints: Vec<(String, ParameterPolicy)>,
    methods: Vec<String>,
    hosts: Vec<String>,
    metadata: HashMap<String, String>,
}

impl Route {
    /// Create a route for a template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            name: None,
            display_name: None,
            order: 0,
            defaults: RouteValues::new(),
            required_values: RouteValues::new(),
            constraints: Vec::new(),
            methods: Vec::new(),
            hosts: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Unique route name used for link generation by name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Human-readable name for diagnostics. Defaults to the template.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Routes with a lower order are matched first, regardless of precedence.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Default value declared outside the template.
    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Required value for link generation. An empty string means the key
    /// must be absent.
    pub fn required_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.required_values.insert(key, value);
        self
    }

    /// Attach a policy to a parameter without writing it inline.
    pub fn constraint(mut self, parameter: impl Into<String>, policy: ParameterPolicy) -> Self {
        self.constraints.push((parameter.into(), policy));
        self
    }

    /// Restrict the route to one HTTP method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into().to_ascii_uppercase());
        self
    }

    /// Restrict the route to a set of HTTP methods.
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods
            .extend(methods.into_iter().map(|m| m.into().to_ascii_uppercase()));
        self
    }

    /// Restrict the route to a host pattern: `example.com`, `*.example.com`,
    /// `*`, optionally followed by `:port` or `:*`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Arbitrary metadata consulted by custom matcher policies.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Parse the template, resolve its policies and freeze the result.
    ///
    /// Unknown inline tokens are skipped with a warning unless `strict` is set.
    pub(crate) fn into_endpoint(
        self,
        id: usize,
        resolver: &ParameterPolicyResolver,
        strict: bool,
    ) -> Result<RouteEndpoint, RouterError> {
        let mut pattern = RoutePattern::parse(&self.template)?
            .with_defaults(&self.defaults)?
            .with_required_values(self.required_values);

        let mut policies = Vec::new();
        for parameter in pattern.parameters() {
            for inline in parameter.constraints() {
                match resolver.resolve_constraint(inline) {
                    Ok(Some(policy)) => policies.push(ResolvedPolicy {
                        parameter: parameter.name().to_string(),
                        token: inline.text().to_string(),
                        policy,
                    }),
                    Ok(None) if strict => {
                        return Err(RouterError::Policy {
                            template: self.template,
                            source: PolicyError::UnknownPolicy {
                                token: inline.text().to_string(),
                            },
                        });
                    }
                    Ok(None) => {
                        warn_log!(
                            "Route '{}': no policy registered for '{}', ignoring it",
                            self.template,
                            inline.text()
                        );
                    }
                    Err(source) => {
                        return Err(RouterError::Policy {
                            template: self.template,
                            source,
                        });
                    }
                }
            }
        }
        for (parameter, policy) in self.constraints {
            if policy.as_constraint().is_some() {
                pattern.mark_constrained(&parameter);
            }
            policies.push(ResolvedPolicy {
                token: format!("{:?}", policy),
                parameter,
                policy,
            });
        }

        let inbound = Precedence::inbound(&pattern);
        let outbound = Precedence::outbound(&pattern);

        Ok(RouteEndpoint {
            id,
            display_name: self.display_name.unwrap_or_else(|| self.template.clone()),
            name: self.name,
            order: self.order,
            pattern,
            inbound,
            outbound,
            policies,
            methods: self.methods,
            hosts: self.hosts,
            metadata: self.metadata,
        })
    }
}

// ============================================================================
// RouteEndpoint (compiled)
// ============================================================================

/// A policy bound to the parameter it applies to.
#[derive(Clone, Debug)]
pub struct ResolvedPolicy {
    pub parameter: String,
    /// The inline token it came from, for diagnostics.
    pub token: String,
    pub policy: ParameterPolicy,
}

/// An immutable, compiled route shared by the matching trees, the selector
/// and link generation.
pub struct RouteEndpoint {
    id: usize,
    name: Option<String>,
    display_name: String,
    order: i32,
    pattern: RoutePattern,
    inbound: Precedence,
    outbound: Precedence,
    policies: Vec<ResolvedPolicy>,
    methods: Vec<String>,
    hosts: Vec<String>,
    metadata: HashMap<String, String>,
}

impl RouteEndpoint {
    /// Registration index, unique within one router.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The template as registered.
    pub fn template(&self) -> &str {
        self.pattern.raw_text()
    }

    pub fn inbound_precedence(&self) -> &Precedence {
        &self.inbound
    }

    pub fn outbound_precedence(&self) -> &Precedence {
        &self.outbound
    }

    pub fn policies(&self) -> &[ResolvedPolicy] {
        &self.policies
    }

    /// Upper-cased HTTP methods; empty means any method.
    pub fn http_methods(&self) -> &[String] {
        &self.methods
    }

    /// Host patterns; empty means any host.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    fn constraints(&self) -> impl Iterator<Item = (&ResolvedPolicy, &dyn RouteConstraint)> {
        self.policies
            .iter()
            .filter_map(|p| p.policy.as_constraint().map(|c| (p, c)))
    }

    /// Run every constraint against `values`.
    ///
    /// Constraints of an optional parameter with no value are skipped.
    pub fn matches_constraints(&self, values: &RouteValues, direction: RouteDirection) -> bool {
        for (resolved, constraint) in self.constraints() {
            let optional = self
                .pattern
                .parameter(&resolved.parameter)
                .is_some_and(|p| p.is_optional());
            if optional && values.get_non_empty(&resolved.parameter).is_none() {
                continue;
            }
            if !constraint.matches(&resolved.parameter, values, direction) {
                trace_log!(
                    "Constraint '{}' on '{}' rejected route '{}'",
                    resolved.token,
                    resolved.parameter,
                    self.display_name
                );
                return false;
            }
        }
        true
    }

    /// The first transformer attached to `parameter`.
    pub fn transformer_for(&self, parameter: &str) -> Option<&dyn ParameterTransformer> {
        self.policies
            .iter()
            .filter(|p| values_equal(&p.parameter, parameter))
            .find_map(|p| p.policy.as_transformer())
    }
}

impl fmt::Debug for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEndpoint")
            .field("id", &self.id)
            .field("template", &self.template())
            .field("name", &self.name)
            .field("order", &self.order)
            .field("inbound", &self.inbound)
            .finish()
    }
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}
