//! Unit tests for reconcile_helpers module

use super::*;
use crds::VisibilityValue;

#[test]
fn test_parse_external_id() {
    assert_eq!(parse_external_id("").unwrap(), None);
    assert_eq!(parse_external_id("42").unwrap(), Some(42));
    let err = parse_external_id("group/project").unwrap_err();
    assert_eq!(err.to_string(), "ID is not an integer");
}

#[test]
fn test_require_external_id_rejects_empty() {
    let err = require_external_id("").unwrap_err();
    assert_eq!(err.to_string(), "external-name is missing");
    assert_eq!(require_external_id("7").unwrap(), 7);
}

#[test]
fn test_require_id() {
    assert_eq!(require_id(Some(0), "ProjectID").unwrap(), 0);
    assert_eq!(require_id(None, "ProjectID").unwrap_err().to_string(), "ProjectID is missing");
}

#[test]
fn test_late_init_never_overwrites() {
    let mut field = Some("set".to_string());
    late_init(&mut field, "remote".to_string());
    assert_eq!(field.as_deref(), Some("set"));

    let mut empty: Option<String> = None;
    late_init(&mut empty, "remote".to_string());
    late_init(&mut empty, "other".to_string());
    assert_eq!(empty.as_deref(), Some("remote"));
}

#[test]
fn test_late_init_non_zero_skips_zero() {
    let mut field = None;
    late_init_non_zero(&mut field, Some(0));
    assert_eq!(field, None);
    late_init_non_zero(&mut field, Some(5));
    assert_eq!(field, Some(5));
}

#[test]
fn test_late_init_enum_ignores_unknown() {
    let mut field: Option<VisibilityValue> = None;
    late_init_enum(&mut field, "secret");
    assert_eq!(field, None);
    late_init_enum(&mut field, "internal");
    assert_eq!(field, Some(VisibilityValue::Internal));
}

#[test]
fn test_equal_if_set() {
    assert!(equal_if_set(&None, &3));
    assert!(equal_if_set(&Some(3), &3));
    assert!(!equal_if_set(&Some(4), &3));
    assert!(equal_if_set_opt(&None, &Some(1)));
    assert!(!equal_if_set_opt(&Some(1), &None));
}

#[test]
fn test_enum_equal_if_set_uses_wire_form() {
    assert!(enum_equal_if_set(&Some(VisibilityValue::Public), "public"));
    assert!(!enum_equal_if_set(&Some(VisibilityValue::Public), "private"));
    assert!(enum_equal_if_set::<VisibilityValue>(&None, "private"));
}

#[test]
fn test_multiset_equal() {
    assert!(multiset_equal(&["a", "b", "b"], &["b", "a", "b"]));
    assert!(!multiset_equal(&["a", "b"], &["a", "b", "b"]));
    assert!(!multiset_equal(&["a", "a"], &["a", "b"]));
    assert!(multiset_equal::<i64>(&[], &[]));
    assert!(list_equal_if_set(&Some(vec![]), &Vec::<i64>::new()));
    assert!(list_equal_if_set(&None, &[1, 2]));
}

#[test]
fn test_resolve_deprecated() {
    assert_eq!(resolve_deprecated(&Some(false), &Some(true)), (Some(false), false));
    assert_eq!(resolve_deprecated(&None, &Some(true)), (Some(true), true));
    assert_eq!(resolve_deprecated::<bool>(&None, &None), (None, false));
}

#[test]
fn test_format_time() {
    let time = DateTime::parse_from_rfc3339("2024-05-01T10:20:30.123Z")
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(format_time(Some(time)).as_deref(), Some("2024-05-01T10:20:30Z"));
    assert_eq!(format_time(None), None);
}
