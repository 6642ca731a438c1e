//! Parameter policy resolution.
//!
//! [`ParameterPolicyResolver`] maps inline tokens such as `int`, `min(1)` or
//! `regex(^a,b$)` to [`ParameterPolicy`] instances. Each name may register
//! several constructors distinguished by their argument count:
//!
//! 1. The token is split into a name and an argument string.
//! 2. If the name has exactly one constructor and it takes one argument, the
//!    whole argument string is that argument (commas included).
//! 3. Otherwise the argument string is split on top-level commas.
//! 4. Exactly one constructor must take that many arguments.
//!
//! ```
//! use route_trie::{constraint_fn, ParameterPolicy, ParameterPolicyResolver};
//!
//! let mut resolver = ParameterPolicyResolver::new();
//! resolver.register("endsWith", 1, |args| {
//!     let suffix = args[0].to_string();
//!     Ok(ParameterPolicy::constraint(constraint_fn(move |v| v.ends_with(&suffix))))
//! });
//!
//! assert!(resolver.resolve("endsWith(_001)").unwrap().is_some());
//! assert!(resolver.resolve("range(1,10)").unwrap().is_some());
//! assert!(resolver.resolve("unknown").unwrap().is_none());
//! ```

use crate::constraints::{
    AlphaConstraint, BoolConstraint, DecimalConstraint, DoubleConstraint, FileNameConstraint,
    FloatConstraint, GuidConstraint, IntConstraint, LengthConstraint, LongConstraint,
    MaxConstraint, MinConstraint, NonFileNameConstraint, ParameterPolicy, RangeConstraint,
    RegexConstraint, RequiredConstraint, SlugifyTransformer,
};
use crate::error::{BoxError, InvalidArgumentError, PolicyError};
use crate::template::InlineConstraint;
use crate::trace_log;
use crate::values::fold_case;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Factory building a policy from converted argument strings.
pub type PolicyFactory =
    Arc<dyn Fn(&[&str]) -> Result<ParameterPolicy, BoxError> + Send + Sync>;

#[derive(Clone)]
struct PolicyConstructor {
    arity: usize,
    factory: PolicyFactory,
}

/// Case-insensitive registry of named parameter policies.
#[derive(Clone)]
pub struct ParameterPolicyResolver {
    policies: HashMap<String, Vec<PolicyConstructor>>,
}

impl ParameterPolicyResolver {
    /// A resolver with every built-in policy registered.
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.register_builtins();
        resolver
    }

    /// A resolver with nothing registered.
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Register a constructor for `name` taking `arity` arguments.
    ///
    /// Registering the same name with a different arity adds an overload;
    /// registering the same arity twice makes that arity ambiguous.
    pub fn register<F>(&mut self, name: impl Into<String>, arity: usize, factory: F) -> &mut Self
    where
        F: Fn(&[&str]) -> Result<ParameterPolicy, BoxError> + Send + Sync + 'static,
    {
        self.policies
            .entry(fold_case(&name.into()))
            .or_default()
            .push(PolicyConstructor {
                arity,
                factory: Arc::new(factory),
            });
        self
    }

    /// Register an argument-less policy that always resolves to `policy`.
    pub fn register_policy(&mut self, name: impl Into<String>, policy: ParameterPolicy) -> &mut Self {
        self.register(name, 0, move |_| Ok(policy.clone()))
    }

    /// Remove every constructor registered under `name`.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.policies.remove(&fold_case(name)).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(&fold_case(name))
    }

    /// Resolve a token. `Ok(None)` means no policy is registered under its
    /// name; the caller decides whether that is an error.
    pub fn resolve(&self, token: &str) -> Result<Option<ParameterPolicy>, PolicyError> {
        self.resolve_constraint(&InlineConstraint::parse(token))
    }

    /// Resolve an already split inline constraint.
    pub fn resolve_constraint(
        &self,
        constraint: &InlineConstraint,
    ) -> Result<Option<ParameterPolicy>, PolicyError> {
        let name = constraint.name();
        let Some(constructors) = self.policies.get(&fold_case(name)) else {
            trace_log!("No parameter policy registered for '{}'", name);
            return Ok(None);
        };

        let arguments: Vec<&str> = match constraint.argument() {
            None | Some("") => Vec::new(),
            Some(argument) if constructors.len() == 1 && constructors[0].arity == 1 => {
                vec![argument]
            }
            Some(argument) => split_arguments(argument),
        };

        let mut candidates = constructors.iter().filter(|c| c.arity == arguments.len());
        let constructor = match (candidates.next(), candidates.next()) {
            (Some(c), None) => c,
            (None, _) => {
                return Err(PolicyError::NoMatchingConstructor {
                    policy: name.to_string(),
                    arguments: arguments.len(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(PolicyError::AmbiguousConstructor {
                    policy: name.to_string(),
                    arguments: arguments.len(),
                })
            }
        };

        (constructor.factory)(&arguments)
            .map(Some)
            .map_err(|source| PolicyError::ConstructionFailed {
                policy: name.to_string(),
                source,
            })
    }

    fn register_builtins(&mut self) {
        self.register_policy("int", ParameterPolicy::constraint(IntConstraint))
            .register_policy("long", ParameterPolicy::constraint(LongConstraint))
            .register_policy("bool", ParameterPolicy::constraint(BoolConstraint))
            .register_policy("double", ParameterPolicy::constraint(DoubleConstraint))
            .register_policy("float", ParameterPolicy::constraint(FloatConstraint))
            .register_policy("decimal", ParameterPolicy::constraint(DecimalConstraint))
            .register_policy("guid", ParameterPolicy::constraint(GuidConstraint))
            .register_policy("alpha", ParameterPolicy::constraint(AlphaConstraint))
            .register_policy("required", ParameterPolicy::constraint(RequiredConstraint))
            .register_policy("file", ParameterPolicy::constraint(FileNameConstraint))
            .register_policy("nonfile", ParameterPolicy::constraint(NonFileNameConstraint))
            .register_policy("slugify", ParameterPolicy::transformer(SlugifyTransformer));

        self.register("min", 1, |args| {
            let min = parse_argument(args, 0, "integer")?;
            Ok(ParameterPolicy::constraint(MinConstraint { min }))
        })
        .register("max", 1, |args| {
            let max = parse_argument(args, 0, "integer")?;
            Ok(ParameterPolicy::constraint(MaxConstraint { max }))
        })
        .register("range", 2, |args| {
            let min = parse_argument(args, 0, "integer")?;
            let max = parse_argument(args, 1, "integer")?;
            Ok(ParameterPolicy::constraint(RangeConstraint { min, max }))
        })
        .register("length", 1, |args| {
            let length = parse_argument(args, 0, "length")?;
            Ok(ParameterPolicy::constraint(LengthConstraint::exact(length)))
        })
        .register("length", 2, |args| {
            let min = parse_argument(args, 0, "length")?;
            let max = parse_argument(args, 1, "length")?;
            Ok(ParameterPolicy::constraint(LengthConstraint { min, max }))
        })
        .register("minlength", 1, |args| {
            let min = parse_argument(args, 0, "length")?;
            Ok(ParameterPolicy::constraint(LengthConstraint::at_least(min)))
        })
        .register("maxlength", 1, |args| {
            let max = parse_argument(args, 0, "length")?;
            Ok(ParameterPolicy::constraint(LengthConstraint::at_most(max)))
        })
        .register("regex", 1, |args| {
            let regex = RegexConstraint::new(args[0])?;
            Ok(ParameterPolicy::constraint(regex))
        });
    }
}

impl Default for ParameterPolicyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParameterPolicyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ParameterPolicyResolver")
            .field("policies", &names)
            .finish()
    }
}

/// Convert argument `index` to `T` using invariant (locale-free) parsing.
///
/// ```
/// use route_trie::parse_argument;
///
/// let n: i64 = parse_argument(&["10", "x"], 0, "integer").unwrap();
/// assert_eq!(n, 10);
/// assert!(parse_argument::<i64>(&["10", "x"], 1, "integer").is_err());
/// ```
pub fn parse_argument<T: FromStr>(
    args: &[&str],
    index: usize,
    expected: &'static str,
) -> Result<T, InvalidArgumentError> {
    let value = args.get(index).copied().unwrap_or_default();
    value.trim().parse().map_err(|_| InvalidArgumentError {
        index,
        value: value.to_string(),
        expected,
    })
}

/// Split on commas that are not nested inside parentheses, trimming each piece.
fn split_arguments(argument: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in argument.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                pieces.push(argument[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(argument[start..].trim());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{constraint_fn, RouteDirection};
    use crate::values::RouteValues;

    fn accepts(policy: &ParameterPolicy, value: &str) -> bool {
        let values = RouteValues::from([("v", value)]);
        policy
            .as_constraint()
            .unwrap()
            .matches("v", &values, RouteDirection::IncomingRequest)
    }

    #[test]
    fn test_split_arguments_respects_parentheses() {
        assert_eq!(split_arguments("1, 2"), vec!["1", "2"]);
        assert_eq!(split_arguments("a(b,c),d"), vec!["a(b,c)", "d"]);
        assert_eq!(split_arguments("x"), vec!["x"]);
    }

    #[test]
    fn test_builtins_resolve_case_insensitively() {
        let resolver = ParameterPolicyResolver::new();
        let policy = resolver.resolve("INT").unwrap().unwrap();
        assert!(accepts(&policy, "5"));
        assert!(!accepts(&policy, "five"));
    }

    #[test]
    fn test_overloads_selected_by_arity() {
        let resolver = ParameterPolicyResolver::new();
        let exact = resolver.resolve("length(3)").unwrap().unwrap();
        let bounded = resolver.resolve("length(2, 4)").unwrap().unwrap();

        assert!(accepts(&exact, "abc"));
        assert!(!accepts(&exact, "abcd"));
        assert!(accepts(&bounded, "abcd"));
    }

    #[test]
    fn test_single_argument_constructor_gets_whole_string() {
        let resolver = ParameterPolicyResolver::new();
        let policy = resolver.resolve("regex(^a,b$)").unwrap().unwrap();
        assert!(accepts(&policy, "a,b"));
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let resolver = ParameterPolicyResolver::new();
        assert!(resolver.resolve("nope(1)").unwrap().is_none());
    }

    #[test]
    fn test_wrong_arity_fails() {
        let resolver = ParameterPolicyResolver::new();
        let err = resolver.resolve("range(1)").unwrap_err();
        assert!(matches!(
            err,
            PolicyError::NoMatchingConstructor { arguments: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_arity_is_ambiguous() {
        let mut resolver = ParameterPolicyResolver::empty();
        for _ in 0..2 {
            resolver.register("twice", 1, |_| {
                Ok(ParameterPolicy::constraint(constraint_fn(|_| true)))
            });
        }
        let err = resolver.resolve("twice(x)").unwrap_err();
        assert!(matches!(err, PolicyError::AmbiguousConstructor { .. }));
    }

    #[test]
    fn test_bad_argument_wraps_source() {
        let resolver = ParameterPolicyResolver::new();
        let err = resolver.resolve("min(abc)").unwrap_err();
        match err {
            PolicyError::ConstructionFailed { policy, source } => {
                assert_eq!(policy, "min");
                let inner = source.downcast_ref::<InvalidArgumentError>().unwrap();
                assert_eq!(inner.value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = resolver.resolve("regex(()").unwrap_err();
        assert!(matches!(err, PolicyError::ConstructionFailed { .. }));
    }

    #[test]
    fn test_transformer_policy() {
        let resolver = ParameterPolicyResolver::new();
        let policy = resolver.resolve("slugify").unwrap().unwrap();
        assert_eq!(
            policy.as_transformer().unwrap().transform_outbound("HelloWorld"),
            "hello-world"
        );
    }
}
