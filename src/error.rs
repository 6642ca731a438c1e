//! Error taxonomy and routing outcomes.
//!
//! Build-time problems are errors and abort router construction:
//!
//! - [`TemplateParseError`]: malformed template syntax.
//! - [`PolicyError`]: an inline constraint could not be resolved.
//! - [`RouterError`]: the top-level build error wrapping both.
//!
//! Runtime results are **values**, never errors:
//!
//! - [`RouteOutcome`]: `Matched`, `NotFound`, `MethodNotAllowed` or
//!   `Ambiguous` for an incoming request.
//! - [`LinkError`]: link generation found no usable route.
//!
//! # Examples
//!
//! ```
//! use route_trie::{RoutePattern, TemplateErrorKind};
//!
//! let err = RoutePattern::parse("{id}/{id}").unwrap_err();
//! assert_eq!(err.kind, TemplateErrorKind::RepeatedParameter("id".into()));
//! ```

use crate::matcher::RouteMatch;
use crate::route::RouteEndpoint;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by parameter policy factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Template errors
// ============================================================================

/// A route template failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid route template '{template}': {kind}")]
pub struct TemplateParseError {
    /// The template as it was supplied.
    pub template: String,
    /// What was wrong with it.
    pub kind: TemplateErrorKind,
}

impl TemplateParseError {
    pub(crate) fn new(template: &str, kind: TemplateErrorKind) -> Self {
        Self {
            template: template.to_string(),
            kind,
        }
    }
}

/// The specific rule a template violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateErrorKind {
    #[error("a route template cannot start with '/' or '~' after its optional prefix")]
    InvalidLeadingCharacter,

    #[error("there is an incomplete parameter; a '{{' has no matching '}}'")]
    MismatchedParameter,

    #[error("a '}}' appears outside a parameter and must be escaped as '}}}}'")]
    UnmatchedCloseBrace,

    #[error("a '{{' inside a parameter must be escaped as '{{{{'")]
    UnescapedBrace,

    #[error("the separator '/' cannot appear consecutively")]
    ConsecutiveSeparators,

    #[error("parameter name '{0}' is invalid")]
    InvalidParameterName(String),

    #[error("parameter name '{0}' appears more than once")]
    RepeatedParameter(String),

    #[error("literal section '{0}' is invalid; literals cannot contain '?'")]
    InvalidLiteral(String),

    #[error("catch-all parameter '{0}' must be in the last segment")]
    CatchAllMustBeLast(String),

    #[error("catch-all parameter '{0}' cannot be marked optional")]
    CatchAllCannotBeOptional(String),

    #[error("a segment containing catch-all parameter '{0}' cannot contain other parts")]
    CatchAllInComplexSegment(String),

    #[error("a segment cannot contain two consecutive parameters; they must be separated by literal text")]
    ConsecutiveParameters,

    #[error("optional parameter '{0}' must be the last part of its segment")]
    OptionalNotLast(String),

    #[error("optional parameter '{0}' may only be preceded by a period ('.') within its segment")]
    OptionalNotAfterPeriod(String),

    #[error("optional parameter '{0}' cannot also declare a default value")]
    OptionalWithDefault(String),

    #[error("parameter '{0}' has both an inline default and an explicit default")]
    ConflictingDefault(String),
}

// ============================================================================
// Parameter policy errors
// ============================================================================

/// An inline constraint token could not be turned into a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No policy is registered under this name (strict mode only).
    #[error("no parameter policy is registered for '{token}'")]
    UnknownPolicy { token: String },

    /// No constructor of the policy takes this many arguments.
    #[error("policy '{policy}' has no constructor taking {arguments} argument(s)")]
    NoMatchingConstructor { policy: String, arguments: usize },

    /// More than one constructor takes this many arguments.
    #[error("policy '{policy}' has more than one constructor taking {arguments} argument(s)")]
    AmbiguousConstructor { policy: String, arguments: usize },

    /// The selected constructor failed.
    #[error("policy '{policy}' could not be constructed: {source}")]
    ConstructionFailed {
        policy: String,
        #[source]
        source: BoxError,
    },
}

/// A policy argument could not be converted to the type its constructor needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("argument {index} ('{value}') is not a valid {expected}")]
pub struct InvalidArgumentError {
    pub index: usize,
    pub value: String,
    pub expected: &'static str,
}

// ============================================================================
// Router build errors
// ============================================================================

/// Router construction failed; no route from the batch is registered.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Template(#[from] TemplateParseError),

    #[error("route '{template}': {source}")]
    Policy {
        template: String,
        #[source]
        source: PolicyError,
    },

    #[error("route name '{0}' is registered more than once")]
    DuplicateRouteName(String),
}

// ============================================================================
// Link generation errors
// ============================================================================

/// Link generation could not produce a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("no route is named '{0}'")]
    UnknownRouteName(String),

    #[error("no route can be bound to the supplied values")]
    NoMatchingRoute,
}

// ============================================================================
// Routing outcome
// ============================================================================

/// Outcome of routing one incoming request.
///
/// `NotFound`, `MethodNotAllowed` and `Ambiguous` are ordinary results; the
/// host decides how to surface them (typically 404, 405 and 500).
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// Exactly one endpoint was selected.
    Matched(RouteMatch),
    /// No route matched the path.
    NotFound,
    /// The path matched, but no candidate accepts the request method.
    MethodNotAllowed { allowed_methods: Vec<String> },
    /// Several equally ranked endpoints remain after every policy ran.
    Ambiguous { candidates: Vec<Arc<RouteEndpoint>> },
}

impl RouteOutcome {
    /// Check if an endpoint was selected
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteOutcome::Matched(_))
    }

    /// Check if no route matched
    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteOutcome::NotFound)
    }

    /// Check if the method was rejected
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, RouteOutcome::MethodNotAllowed { .. })
    }

    /// Check if the match was ambiguous
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, RouteOutcome::Ambiguous { .. })
    }

    /// The selected match, if any.
    pub fn matched(&self) -> Option<&RouteMatch> {
        match self {
            RouteOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Consume the outcome, returning the selected match.
    pub fn into_matched(self) -> Option<RouteMatch> {
        match self {
            RouteOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// The tied endpoints of an ambiguous outcome, empty otherwise.
    pub fn ambiguous_candidates(&self) -> &[Arc<RouteEndpoint>] {
        match self {
            RouteOutcome::Ambiguous { candidates } => candidates,
            _ => &[],
        }
    }
}
