//! Scenario Tests
//!
//! End-to-end checks of load → compile → validate against the fixture
//! schemas in `tests/fixtures`.

use std::path::Path;

use config_forge::{
    compile_schema, validate, CompiledSchema, DefaultPolicy, FieldPath, PathSegment,
    SchemaError, SchemaRepository, Validator, ViolationKind,
};
use serde_json::json;

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn compiled(name: &str) -> CompiledSchema {
    let raw = SchemaRepository::new(fixtures_path()).load(name).unwrap();
    compile_schema(&raw).unwrap()
}

fn path(segments: &[PathSegment]) -> FieldPath {
    segments.iter().cloned().collect()
}

fn key(k: &str) -> PathSegment {
    PathSegment::Key(k.to_string())
}

// =============================================================================
// Required string with pattern
// =============================================================================

#[test]
fn test_matching_name_is_accepted() {
    let schema = compiled("service_name");
    let doc = validate(&schema.root, &json!({ "name": "abc" })).unwrap();
    assert_eq!(doc.into_value(), json!({ "name": "abc" }));
}

#[test]
fn test_uppercase_name_is_pattern_mismatch() {
    let schema = compiled("service_name");
    let report = validate(&schema.root, &json!({ "name": "ABC" })).unwrap_err();

    assert_eq!(report.len(), 1);
    let violation = &report.violations()[0];
    assert_eq!(violation.reason, ViolationKind::PatternMismatch);
    assert_eq!(violation.path, path(&[key("name")]));
}

#[test]
fn test_missing_name_is_missing_required() {
    let schema = compiled("service_name");
    let report = validate(&schema.root, &json!({})).unwrap_err();

    assert_eq!(report.len(), 1);
    let violation = &report.violations()[0];
    assert_eq!(violation.reason, ViolationKind::MissingRequired);
    assert_eq!(violation.path, path(&[key("name")]));
}

// =============================================================================
// Optional int with default
// =============================================================================

#[test]
fn test_port_default_is_materialized() {
    let schema = compiled("service_port");
    let doc = Validator::with_policy(DefaultPolicy::Materialize)
        .validate(&schema.root, &json!({}))
        .unwrap();
    assert_eq!(doc.into_value(), json!({ "port": 8080 }));
}

#[test]
fn test_port_default_excluded_when_unset() {
    let schema = compiled("service_port");
    let doc = validate(&schema.root, &json!({})).unwrap();
    assert_eq!(doc.into_value(), json!({}));
}

#[test]
fn test_supplied_port_wins_over_default() {
    let schema = compiled("service_port");
    for policy in [DefaultPolicy::Materialize, DefaultPolicy::ExcludeUnset] {
        let doc = Validator::with_policy(policy)
            .validate(&schema.root, &json!({ "port": 443 }))
            .unwrap();
        assert_eq!(doc.into_value(), json!({ "port": 443 }));
    }
}

// =============================================================================
// List of objects
// =============================================================================

#[test]
fn test_out_of_range_port_in_server_list() {
    let schema = compiled("cluster");
    let report = validate(&schema.root, &json!({ "servers": [{ "host": "a", "port": 70000 }] })).unwrap_err();

    assert_eq!(report.len(), 1);
    let violation = &report.violations()[0];
    assert_eq!(violation.reason, ViolationKind::OutOfRange);
    assert_eq!(violation.path, path(&[key("servers"), PathSegment::Index(0), key("port")]));
    assert_eq!(
        serde_json::to_value(&violation.path).unwrap(),
        json!(["servers", 0, "port"])
    );
}

#[test]
fn test_every_bad_server_is_reported() {
    let schema = compiled("cluster");
    let report = validate(
        &schema.root,
        &json!({ "servers": [
            { "host": "a", "port": 0 },
            { "host": "b", "port": 80 },
            { "port": "80" }
        ] }),
    )
    .unwrap_err();

    let found: Vec<_> = report
        .violations()
        .iter()
        .map(|v| (v.path.to_string(), v.reason))
        .collect();
    assert_eq!(
        found,
        vec![
            ("servers[0].port".to_string(), ViolationKind::OutOfRange),
            ("servers[2].host".to_string(), ViolationKind::MissingRequired),
            ("servers[2].port".to_string(), ViolationKind::TypeMismatch),
        ]
    );
}

// =============================================================================
// Unions
// =============================================================================

#[test]
fn test_numeric_string_matches_str_alternative() {
    let schema = compiled("flexible");
    let doc = validate(&schema.root, &json!({ "value": "42" })).unwrap();
    assert_eq!(doc.get("value"), Some(&json!("42")));
}

#[test]
fn test_number_matches_int_alternative() {
    let schema = compiled("flexible");
    let doc = validate(&schema.root, &json!({ "value": 42 })).unwrap();
    assert_eq!(doc.get("value"), Some(&json!(42)));
}

#[test]
fn test_union_exhausted() {
    let schema = compiled("flexible");
    let report = validate(&schema.root, &json!({ "value": [42] })).unwrap_err();

    assert_eq!(report.reasons(), vec![ViolationKind::UnionExhausted]);
    assert_eq!(report.violations()[0].details.len(), 2);
}

// =============================================================================
// Schema failures
// =============================================================================

#[test]
fn test_model_without_fields_is_schema_error() {
    let raw = SchemaRepository::new(fixtures_path()).load("broken_model").unwrap();
    match compile_schema(&raw) {
        Err(SchemaError::MissingModelFields { path }) => assert_eq!(path, "broken_model.database"),
        other => panic!("Expected MissingModelFields, got {:?}", other),
    }
}

#[test]
fn test_unknown_schema_is_not_found() {
    let err = SchemaRepository::new(fixtures_path()).load("does_not_exist").unwrap_err();
    assert!(err.is_not_found());
}
