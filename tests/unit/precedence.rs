//! Precedence ordering between templates.

use route_trie::{Precedence, RoutePattern};

fn inbound(template: &str) -> Precedence {
    Precedence::inbound(&RoutePattern::parse(template).unwrap())
}

fn outbound(template: &str) -> Precedence {
    Precedence::outbound(&RoutePattern::parse(template).unwrap())
}

#[test]
fn test_inbound_ranks_most_specific_first() {
    let mut templates = vec![
        "{*all}",
        "{controller}/{action}",
        "api/{id}",
        "api/{id:int}",
        "api/items",
        "api/{name}.{ext}",
    ];
    templates.sort_by_key(|t| inbound(t));
    assert_eq!(
        templates,
        vec![
            "api/items",
            "api/{id:int}",
            "api/{name}.{ext}",
            "api/{id}",
            "{controller}/{action}",
            "{*all}",
        ]
    );
}

#[test]
fn test_outbound_mirrors_inbound() {
    assert!(outbound("api/items") > outbound("api/{id:int}"));
    assert!(outbound("api/{id:int}") > outbound("api/{id}"));
    assert!(outbound("api/{id}") > outbound("api/{*rest}"));
}

#[test]
fn test_display_and_digits() {
    assert_eq!(inbound("a/{b}/{*c}").to_string(), "1.35");
    assert_eq!(inbound("a/{b}/{*c}").digits(), &[1, 3, 5]);
    assert_eq!(outbound("a/{b}/{*c}").to_string(), "5.31");
    assert_eq!(inbound("").to_string(), "0");
}
