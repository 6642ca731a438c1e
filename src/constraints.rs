//! Route constraints and parameter transformers.
//!
//! A parameter policy is what an inline token like `{id:int}` resolves to.
//! It is either a [`RouteConstraint`] (a predicate that can reject a value)
//! or a [`ParameterTransformer`] (rewrites a value during link generation).
//!
//! # Built-in constraints
//!
//! | Token | Accepts |
//! |-------|---------|
//! | `int` / `long` | 32 / 64-bit signed integers |
//! | `bool` | `true` or `false`, any case |
//! | `double` / `float` / `decimal` | invariant-culture numbers |
//! | `guid` | GUIDs in `D`, `N`, `B` or `P` format |
//! | `alpha` | ASCII letters only |
//! | `required` | any non-empty value |
//! | `min(n)` / `max(n)` / `range(a,b)` | integer bounds, inclusive |
//! | `length(n)` / `length(a,b)` | exact / bounded character count |
//! | `minlength(n)` / `maxlength(n)` | character count bounds |
//! | `regex(p)` | case-insensitive, unanchored regular expression |
//! | `file` / `nonfile` | last path segment looks / does not look like a file name |
//!
//! # Built-in transformers
//!
//! | Token | Effect |
//! |-------|--------|
//! | `slugify` | `MyProductName` → `my-product-name` |
//!
//! Constraints for a value that is missing from the route values return
//! `false`, with the exception of `nonfile`.
//!
//! # Custom constraints
//!
//! ```
//! use route_trie::{constraint_fn, RouteConstraint, RouteDirection, RouteValues};
//!
//! let ends_with = constraint_fn(|value| value.ends_with("_001"));
//! let values = RouteValues::from([("id", "555_001")]);
//!
//! assert!(ends_with.matches("id", &values, RouteDirection::IncomingRequest));
//! ```

use crate::values::RouteValues;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Policy traits
// ============================================================================

/// Which way a route is being used when a constraint runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDirection {
    /// Matching an incoming request path.
    IncomingRequest,
    /// Generating a URL from values.
    UrlGeneration,
}

/// A predicate over one route value.
///
/// Implementations must be cheap and side-effect free: they run once per
/// candidate on every request.
pub trait RouteConstraint: Send + Sync + fmt::Debug {
    /// Return `true` if the value stored under `key` is acceptable.
    fn matches(&self, key: &str, values: &RouteValues, direction: RouteDirection) -> bool;
}

/// Rewrites a parameter value before it is written into a generated URL.
pub trait ParameterTransformer: Send + Sync + fmt::Debug {
    fn transform_outbound(&self, value: &str) -> String;
}

/// A resolved inline policy.
#[derive(Clone, Debug)]
pub enum ParameterPolicy {
    Constraint(Arc<dyn RouteConstraint>),
    Transformer(Arc<dyn ParameterTransformer>),
}

impl ParameterPolicy {
    /// Wrap a constraint.
    pub fn constraint(constraint: impl RouteConstraint + 'static) -> Self {
        ParameterPolicy::Constraint(Arc::new(constraint))
    }

    /// Wrap a transformer.
    pub fn transformer(transformer: impl ParameterTransformer + 'static) -> Self {
        ParameterPolicy::Transformer(Arc::new(transformer))
    }

    pub fn as_constraint(&self) -> Option<&dyn RouteConstraint> {
        match self {
            ParameterPolicy::Constraint(c) => Some(c.as_ref()),
            ParameterPolicy::Transformer(_) => None,
        }
    }

    pub fn as_transformer(&self) -> Option<&dyn ParameterTransformer> {
        match self {
            ParameterPolicy::Transformer(t) => Some(t.as_ref()),
            ParameterPolicy::Constraint(_) => None,
        }
    }
}

// ============================================================================
// Closure helpers
// ============================================================================

/// Create a constraint from a predicate over the value.
///
/// The predicate is not called when the value is missing; the constraint then
/// rejects.
pub fn constraint_fn<F>(f: F) -> FnConstraint<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    FnConstraint { f }
}

/// Constraint created from a closure.
pub struct FnConstraint<F> {
    f: F,
}

impl<F> fmt::Debug for FnConstraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnConstraint")
    }
}

impl<F> RouteConstraint for FnConstraint<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values.get(key).is_some_and(|value| (self.f)(value))
    }
}

/// Create a transformer from a closure.
pub fn transformer_fn<F>(f: F) -> FnTransformer<F>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    FnTransformer { f }
}

/// Transformer created from a closure.
pub struct FnTransformer<F> {
    f: F,
}

impl<F> fmt::Debug for FnTransformer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransformer")
    }
}

impl<F> ParameterTransformer for FnTransformer<F>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    fn transform_outbound(&self, value: &str) -> String {
        (self.f)(value)
    }
}

// ============================================================================
// Type constraints
// ============================================================================

/// Implements `RouteConstraint` for a unit struct from a value predicate.
macro_rules! value_constraint {
    ($(#[$meta:meta])* $name:ident, |$value:ident| $body:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl RouteConstraint for $name {
            fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
                values.get(key).is_some_and(|$value: &str| $body)
            }
        }
    };
}

value_constraint!(
    /// 32-bit signed integer.
    IntConstraint,
    |value| value.parse::<i32>().is_ok()
);

value_constraint!(
    /// 64-bit signed integer.
    LongConstraint,
    |value| value.parse::<i64>().is_ok()
);

value_constraint!(
    BoolConstraint,
    |value| value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
);

value_constraint!(
    /// Finite 64-bit float.
    DoubleConstraint,
    |value| is_invariant_float(value) && value.parse::<f64>().is_ok_and(f64::is_finite)
);

value_constraint!(
    /// Finite 32-bit float.
    FloatConstraint,
    |value| is_invariant_float(value) && value.parse::<f32>().is_ok_and(f32::is_finite)
);

value_constraint!(
    /// Fixed-point decimal: optional sign, digits, optional fraction.
    DecimalConstraint,
    |value| is_decimal(value)
);

value_constraint!(
    GuidConstraint,
    |value| is_guid(value)
);

value_constraint!(
    /// ASCII letters only.
    AlphaConstraint,
    |value| value.bytes().all(|b| b.is_ascii_alphabetic())
);

value_constraint!(
    /// Present and non-empty.
    RequiredConstraint,
    |value| !value.is_empty()
);

value_constraint!(
    /// Last path segment contains a `.` followed by at least one character.
    FileNameConstraint,
    |value| is_file_name(value)
);

/// Inverse of [`FileNameConstraint`]. A missing value is not a file name and
/// therefore matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonFileNameConstraint;

impl RouteConstraint for NonFileNameConstraint {
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values.get(key).map_or(true, |value| !is_file_name(value))
    }
}

fn is_invariant_float(value: &str) -> bool {
    // Rust accepts "inf"/"nan" spellings that invariant parsing does not.
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn is_decimal(value: &str) -> bool {
    let unsigned = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match fraction {
        None => !whole.is_empty() && digits(whole),
        Some(f) => (!whole.is_empty() || !f.is_empty()) && digits(whole) && digits(f),
    }
}

fn is_guid(value: &str) -> bool {
    let inner = if let Some(rest) = value.strip_prefix('{') {
        match rest.strip_suffix('}') {
            Some(inner) => inner,
            None => return false,
        }
    } else if let Some(rest) = value.strip_prefix('(') {
        match rest.strip_suffix(')') {
            Some(inner) => inner,
            None => return false,
        }
    } else {
        value
    };

    let hex = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit());

    // N format is only valid without enclosing braces.
    if inner.len() == 32 && inner.len() == value.len() {
        return hex(inner, 32);
    }

    let groups: Vec<&str> = inner.split('-').collect();
    matches!(groups.as_slice(), [a, b, c, d, e]
        if hex(a, 8) && hex(b, 4) && hex(c, 4) && hex(d, 4) && hex(e, 12))
}

fn is_file_name(value: &str) -> bool {
    let last = value.rsplit('/').next().unwrap_or(value);
    match last.rfind('.') {
        Some(dot) => dot + 1 < last.len(),
        None => false,
    }
}

// ============================================================================
// Bound constraints
// ============================================================================

/// Integer value at least `min`.
#[derive(Debug, Clone, Copy)]
pub struct MinConstraint {
    pub min: i64,
}

impl RouteConstraint for MinConstraint {
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values.get_as::<i64>(key).is_some_and(|v| v >= self.min)
    }
}

/// Integer value at most `max`.
#[derive(Debug, Clone, Copy)]
pub struct MaxConstraint {
    pub max: i64,
}

impl RouteConstraint for MaxConstraint {
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values.get_as::<i64>(key).is_some_and(|v| v <= self.max)
    }
}

/// Integer value within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct RangeConstraint {
    pub min: i64,
    pub max: i64,
}

impl RouteConstraint for RangeConstraint {
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values
            .get_as::<i64>(key)
            .is_some_and(|v| (self.min..=self.max).contains(&v))
    }
}

/// Character count within `min..=max`.
///
/// `length(n)` is `LengthConstraint { min: n, max: n }`; `minlength(n)` and
/// `maxlength(n)` leave the other bound open.
#[derive(Debug, Clone, Copy)]
pub struct LengthConstraint {
    pub min: usize,
    pub max: usize,
}

impl LengthConstraint {
    pub fn exact(length: usize) -> Self {
        Self {
            min: length,
            max: length,
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self { min, max: usize::MAX }
    }

    pub fn at_most(max: usize) -> Self {
        Self { min: 0, max }
    }
}

impl RouteConstraint for LengthConstraint {
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values
            .get(key)
            .is_some_and(|v| (self.min..=self.max).contains(&v.chars().count()))
    }
}

// ============================================================================
// Regex constraint
// ============================================================================

/// Case-insensitive regular expression.
///
/// The pattern is not implicitly anchored: `regex(\d)` accepts `a1b`. Use `^`
/// and `$` to match the whole value.
#[derive(Debug, Clone)]
pub struct RegexConstraint {
    regex: Regex,
}

impl RegexConstraint {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl RouteConstraint for RegexConstraint {
    fn matches(&self, key: &str, values: &RouteValues, _direction: RouteDirection) -> bool {
        values.get(key).is_some_and(|v| self.regex.is_match(v))
    }
}

// ============================================================================
// Transformers
// ============================================================================

/// Converts `PascalCase` and `camelCase` values to lower-case kebab case.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugifyTransformer;

impl ParameterTransformer for SlugifyTransformer {
    fn transform_outbound(&self, value: &str) -> String {
        let mut slug = String::with_capacity(value.len() + 4);
        let mut previous_lower = false;
        for c in value.chars() {
            if c.is_uppercase() && previous_lower {
                slug.push('-');
            }
            previous_lower = c.is_lowercase();
            slug.extend(c.to_lowercase());
        }
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(constraint: &dyn RouteConstraint, value: &str) -> bool {
        let values = RouteValues::from([("v", value)]);
        constraint.matches("v", &values, RouteDirection::IncomingRequest)
    }

    #[test]
    fn test_numeric_constraints() {
        assert!(check(&IntConstraint, "-42"));
        assert!(!check(&IntConstraint, "2147483648"));
        assert!(check(&LongConstraint, "2147483648"));
        assert!(!check(&IntConstraint, "12a"));

        assert!(check(&DoubleConstraint, "1.5e3"));
        assert!(!check(&DoubleConstraint, "inf"));
        assert!(!check(&DoubleConstraint, "NaN"));
        assert!(check(&FloatConstraint, "0.25"));

        assert!(check(&DecimalConstraint, "-12.50"));
        assert!(check(&DecimalConstraint, ".5"));
        assert!(!check(&DecimalConstraint, "1e3"));
        assert!(!check(&DecimalConstraint, "."));
    }

    #[test]
    fn test_bool_constraint_ignores_case() {
        assert!(check(&BoolConstraint, "TRUE"));
        assert!(check(&BoolConstraint, "false"));
        assert!(!check(&BoolConstraint, "yes"));
    }

    #[test]
    fn test_guid_formats() {
        let d = "0f8fad5b-d9cb-469f-a165-70867728950e";
        assert!(check(&GuidConstraint, d));
        assert!(check(&GuidConstraint, &d.replace('-', "")));
        assert!(check(&GuidConstraint, &format!("{{{}}}", d)));
        assert!(check(&GuidConstraint, &format!("({})", d)));
        assert!(!check(&GuidConstraint, &format!("{{{}", d)));
        assert!(!check(&GuidConstraint, "0f8fad5b-d9cb-469f-a165"));
    }

    #[test]
    fn test_bounds() {
        assert!(check(&MinConstraint { min: 5 }, "5"));
        assert!(!check(&MinConstraint { min: 5 }, "4"));
        assert!(!check(&MaxConstraint { max: 5 }, "6"));
        assert!(check(&RangeConstraint { min: 1, max: 3 }, "3"));
        assert!(!check(&RangeConstraint { min: 1, max: 3 }, "abc"));

        assert!(check(&LengthConstraint::exact(3), "héé"));
        assert!(!check(&LengthConstraint::at_least(4), "abc"));
        assert!(check(&LengthConstraint::at_most(4), "abc"));
    }

    #[test]
    fn test_regex_is_unanchored_and_case_insensitive() {
        let digits = RegexConstraint::new(r"\d").unwrap();
        assert!(check(&digits, "a1b"));

        let exact = RegexConstraint::new("^abc$").unwrap();
        assert!(check(&exact, "ABC"));
        assert!(!check(&exact, "abcd"));

        assert!(RegexConstraint::new("(").is_err());
    }

    #[test]
    fn test_file_constraints() {
        assert!(check(&FileNameConstraint, "docs/readme.md"));
        assert!(!check(&FileNameConstraint, "docs.v2/readme"));
        assert!(!check(&FileNameConstraint, "trailing."));
        assert!(check(&NonFileNameConstraint, "docs/readme"));

        let empty = RouteValues::new();
        assert!(NonFileNameConstraint.matches("v", &empty, RouteDirection::IncomingRequest));
        assert!(!FileNameConstraint.matches("v", &empty, RouteDirection::IncomingRequest));
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let empty = RouteValues::new();
        assert!(!IntConstraint.matches("id", &empty, RouteDirection::UrlGeneration));
        assert!(!RequiredConstraint.matches("id", &empty, RouteDirection::UrlGeneration));
    }

    #[test]
    fn test_closure_helpers() {
        let ends_with = constraint_fn(|v| v.ends_with("_001"));
        assert!(check(&ends_with, "555_001"));
        assert!(!check(&ends_with, "555"));

        let upper = transformer_fn(|v| v.to_uppercase());
        assert_eq!(upper.transform_outbound("abc"), "ABC");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(SlugifyTransformer.transform_outbound("MyProductName"), "my-product-name");
        assert_eq!(SlugifyTransformer.transform_outbound("already-slug"), "already-slug");
        assert_eq!(SlugifyTransformer.transform_outbound("URL"), "url");
    }
}
