//! Template parsing through the public API.

use route_trie::*;

fn kind(template: &str) -> TemplateErrorKind {
    RoutePattern::parse(template).unwrap_err().kind
}

#[test]
fn test_conventional_template() {
    let pattern = RoutePattern::parse("{controller=Home}/{action=Index}/{id?}").unwrap();

    assert_eq!(pattern.segments().len(), 3);
    assert_eq!(pattern.defaults().get("controller"), Some("Home"));
    assert_eq!(pattern.defaults().get("action"), Some("Index"));
    assert!(!pattern.defaults().contains_key("id"));
    assert!(pattern.remaining_segments_can_be_absent(0));
    assert_eq!(pattern.to_string(), "{controller=Home}/{action=Index}/{id?}");
}

#[test]
fn test_complex_segment_parts() {
    let pattern = RoutePattern::parse("reports/{year}-{month}.{format?}").unwrap();
    let segment = &pattern.segments()[1];

    assert!(!segment.is_simple());
    let names: Vec<&str> = segment
        .parts()
        .iter()
        .filter_map(TemplatePart::as_parameter)
        .map(ParameterPart::name)
        .collect();
    assert_eq!(names, vec!["year", "month", "format"]);
    assert_eq!(segment.parts()[1], TemplatePart::Literal("-".into()));
}

#[test]
fn test_error_reports_template_and_reason() {
    let error = RoutePattern::parse("files/{*path}/{name}").unwrap_err();
    assert_eq!(error.template, "files/{*path}/{name}");
    assert_eq!(error.kind, TemplateErrorKind::CatchAllMustBeLast("path".into()));

    let message = error.to_string();
    assert!(message.contains("files/{*path}/{name}"), "{}", message);
    assert!(message.contains("catch-all"), "{}", message);
}

#[test]
fn test_rejected_templates() {
    assert_eq!(kind("{id}/{ID}"), TemplateErrorKind::RepeatedParameter("ID".into()));
    assert_eq!(kind("{a}{b}"), TemplateErrorKind::ConsecutiveParameters);
    assert_eq!(kind("{*all?}"), TemplateErrorKind::CatchAllCannotBeOptional("all".into()));
    assert_eq!(kind("a//b"), TemplateErrorKind::ConsecutiveSeparators);
    assert_eq!(kind("~x"), TemplateErrorKind::InvalidLeadingCharacter);
}

#[test]
fn test_explicit_defaults_conflict_with_inline() {
    let defaults = RouteValues::from([("action", "List")]);
    let error = RoutePattern::parse("{action=Index}")
        .unwrap()
        .with_defaults(&defaults)
        .unwrap_err();
    assert_eq!(error.kind, TemplateErrorKind::ConflictingDefault("action".into()));
}

#[test]
fn test_equivalence_ignores_prefix() {
    let a = RoutePattern::parse("/api/{id:int}").unwrap();
    let b = RoutePattern::parse("~/api/{id:int}").unwrap();
    let c = RoutePattern::parse("api/{id}").unwrap();

    assert!(a.is_equivalent(&b));
    assert!(!a.is_equivalent(&c));
    assert_eq!(a.raw_text(), "/api/{id:int}");
}

#[test]
fn test_inline_constraint_tokens() {
    let constraint = InlineConstraint::parse("regex(^\\d{3}$)");
    assert_eq!(constraint.name(), "regex");
    assert_eq!(constraint.argument(), Some("^\\d{3}$"));

    let bare = InlineConstraint::parse("alpha");
    assert_eq!(bare.name(), "alpha");
    assert_eq!(bare.argument(), None);
}
