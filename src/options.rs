//! Router configuration.

use crate::constraints::ParameterPolicy;
use crate::error::BoxError;
use crate::resolver::ParameterPolicyResolver;

/// Options applied when building a [`Router`](crate::Router).
///
/// ```
/// use route_trie::{constraint_fn, ParameterPolicy, RouteOptions};
///
/// let options = RouteOptions::new()
///     .lowercase_urls(true)
///     .append_trailing_slash(true)
///     .constraint("even", 0, |_| {
///         Ok(ParameterPolicy::constraint(constraint_fn(|v| {
///             v.parse::<u64>().is_ok_and(|n| n % 2 == 0)
///         })))
///     });
///
/// assert!(options.constraint_map.contains("even"));
/// assert!(options.lowercase_urls);
/// ```
#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Inline policy registry; holds the built-ins by default.
    pub constraint_map: ParameterPolicyResolver,
    /// Unknown inline tokens fail the build instead of being ignored.
    pub strict_constraints: bool,
    /// Lower-case generated paths.
    pub lowercase_urls: bool,
    /// Also lower-case generated query strings. Only applies together with
    /// `lowercase_urls`.
    pub lowercase_query_strings: bool,
    /// Append `/` to generated paths.
    pub append_trailing_slash: bool,
    /// Idle URI buffers retained for reuse.
    pub uri_pool_capacity: usize,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy constructor in [`constraint_map`](Self::constraint_map).
    pub fn constraint<F>(mut self, name: impl Into<String>, arity: usize, factory: F) -> Self
    where
        F: Fn(&[&str]) -> Result<ParameterPolicy, BoxError> + Send + Sync + 'static,
    {
        self.constraint_map.register(name, arity, factory);
        self
    }

    pub fn strict_constraints(mut self, strict: bool) -> Self {
        self.strict_constraints = strict;
        self
    }

    pub fn lowercase_urls(mut self, lowercase: bool) -> Self {
        self.lowercase_urls = lowercase;
        self
    }

    pub fn lowercase_query_strings(mut self, lowercase: bool) -> Self {
        self.lowercase_query_strings = lowercase;
        self
    }

    pub fn append_trailing_slash(mut self, append: bool) -> Self {
        self.append_trailing_slash = append;
        self
    }

    pub fn uri_pool_capacity(mut self, capacity: usize) -> Self {
        self.uri_pool_capacity = capacity;
        self
    }
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            constraint_map: ParameterPolicyResolver::new(),
            strict_constraints: false,
            lowercase_urls: false,
            lowercase_query_strings: false,
            append_trailing_slash: false,
            uri_pool_capacity: 16,
        }
    }
}
