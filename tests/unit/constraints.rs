//! Inline policy resolution and built-in constraints.

use route_trie::*;

fn check(token: &str, value: &str) -> bool {
    let resolver = ParameterPolicyResolver::new();
    let policy = resolver.resolve(token).unwrap().unwrap();
    let values = RouteValues::from([("p", value)]);
    policy
        .as_constraint()
        .unwrap()
        .matches("p", &values, RouteDirection::IncomingRequest)
}

#[test]
fn test_type_constraints() {
    assert!(check("int", "-42"));
    assert!(!check("int", "4.2"));
    assert!(check("long", "9000000000"));
    assert!(check("bool", "True"));
    assert!(!check("bool", "yes"));
    assert!(check("guid", "3f2504e0-4f89-11d3-9a0c-0305e82c3301"));
    assert!(!check("guid", "not-a-guid"));
}

#[test]
fn test_bounded_constraints() {
    assert!(check("min(10)", "10"));
    assert!(!check("min(10)", "9"));
    assert!(check("range(1, 5)", "5"));
    assert!(!check("range(1, 5)", "6"));
    assert!(check("length(3)", "abc"));
    assert!(check("length(2,4)", "abcd"));
    assert!(!check("maxlength(2)", "abc"));
}

#[test]
fn test_regex_is_case_insensitive() {
    assert!(check("regex(^[a-z]+$)", "Hello"));
    assert!(!check("regex(^[a-z]+$)", "hello1"));
}

#[test]
fn test_unknown_token_is_not_an_error() {
    let resolver = ParameterPolicyResolver::new();
    assert!(resolver.resolve("nosuch").unwrap().is_none());
}

#[test]
fn test_wrong_arity_and_bad_arguments() {
    let resolver = ParameterPolicyResolver::new();

    assert!(matches!(
        resolver.resolve("range(1)"),
        Err(PolicyError::NoMatchingConstructor { arguments: 1, .. })
    ));
    assert!(matches!(
        resolver.resolve("min(ten)"),
        Err(PolicyError::ConstructionFailed { .. })
    ));
}

#[test]
fn test_custom_policy_with_argument() {
    let mut resolver = ParameterPolicyResolver::empty();
    resolver.register("endsWith", 1, |args| {
        let suffix = args[0].to_string();
        Ok(ParameterPolicy::constraint(constraint_fn(move |v| v.ends_with(&suffix))))
    });

    assert!(resolver.contains("endswith"));
    let policy = resolver.resolve("endsWith(_001)").unwrap().unwrap();
    let values = RouteValues::from([("id", "555_001")]);
    assert!(policy
        .as_constraint()
        .unwrap()
        .matches("id", &values, RouteDirection::IncomingRequest));
}

#[test]
fn test_transformer_policy() {
    let resolver = ParameterPolicyResolver::new();
    let policy = resolver.resolve("slugify").unwrap().unwrap();
    assert!(policy.as_constraint().is_none());
    assert_eq!(
        policy.as_transformer().unwrap().transform_outbound("OrderHistory"),
        "order-history"
    );
}

#[test]
fn test_parse_argument_errors() {
    let error = parse_argument::<i64>(&["x"], 0, "integer").unwrap_err();
    assert_eq!(error.index, 0);
    assert_eq!(error.value, "x");
    assert_eq!(error.expected, "integer");
}
