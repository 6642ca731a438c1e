//! RouteValues semantics.

use route_trie::RouteValues;

#[test]
fn test_keys_are_case_insensitive() {
    let mut values = RouteValues::new();
    values.insert("Controller", "Home");

    assert_eq!(values.get("controller"), Some("Home"));
    assert!(values.contains_key("CONTROLLER"));
    assert_eq!(values.insert("controller", "Store"), Some("Home".to_string()));
    assert_eq!(values.keys().collect::<Vec<_>>(), vec!["Controller"]);
}

#[test]
fn test_non_ascii_keys_are_case_insensitive() {
    let mut values = RouteValues::new();
    values.insert("Ärger", "1");

    assert_eq!(values.get("ärger"), Some("1"));
    assert_eq!(values.get("ÄRGER"), Some("1"));
    assert_eq!(values.insert("äRGER", "2"), Some("1".to_string()));
    assert_eq!(values.len(), 1);
}

#[test]
fn test_insertion_order_is_kept() {
    let values = RouteValues::new().with("b", "2").with("a", "1").with("c", "3");
    let keys: Vec<&str> = values.keys().collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
}

#[test]
fn test_empty_values() {
    let values = RouteValues::from([("id", "")]);
    assert!(values.contains_key("id"));
    assert_eq!(values.get("id"), Some(""));
    assert_eq!(values.get_non_empty("id"), None);
}

#[test]
fn test_typed_access() {
    let values = RouteValues::from([("page", "3"), ("name", "x")]);
    assert_eq!(values.get_as::<u32>("page"), Some(3));
    assert_eq!(values.get_as::<u32>("name"), None);
    assert_eq!(values.get_as::<u32>("missing"), None);
}

#[test]
fn test_equality_ignores_order() {
    let a = RouteValues::from([("a", "1"), ("b", "2")]);
    let b = RouteValues::from([("B", "2"), ("a", "1")]);
    assert_eq!(a, b);
    assert_ne!(a, RouteValues::from([("a", "1")]));
}

#[test]
fn test_remove_and_clear() {
    let mut values = RouteValues::from([("a", "1"), ("b", "2")]);
    assert_eq!(values.remove("A"), Some("1".to_string()));
    assert_eq!(values.len(), 1);
    values.clear();
    assert!(values.is_empty());
}
