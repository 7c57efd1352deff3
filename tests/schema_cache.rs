use shop_harvest::schema::{SAMPLE_SIDEBAR_HTML, SchemaGenerator, obtain_schema};
use shop_harvest::{ExtractionSchema, HarvestError};
use std::fs;

const FIXTURE: &str = include_str!("fixtures/sidebar_schema.json");

/// Generator that must never be reached
struct Unreachable;

impl SchemaGenerator for Unreachable {
    fn generate(&self, _sample_html: &str, _instructions: &str) -> shop_harvest::Result<ExtractionSchema> {
        panic!("generator called on a cache hit");
    }
}

/// Generator that fails like an unreachable API
struct Offline;

impl SchemaGenerator for Offline {
    fn generate(&self, _sample_html: &str, _instructions: &str) -> shop_harvest::Result<ExtractionSchema> {
        Err(HarvestError::SchemaGenerationFailed("connection refused".to_string()))
    }
}

#[test]
fn test_cached_schema_without_store_rating_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gshop_sidebar_schema.json");
    fs::write(&path, FIXTURE.replace("\"store_rating\"", "\"seller_score\"")).unwrap();

    let err = obtain_schema(SAMPLE_SIDEBAR_HTML, &path, false, &Unreachable).unwrap_err();

    assert!(err.to_string().contains("store_rating"), "unexpected error: {}", err);
    match err {
        HarvestError::SchemaIncomplete { missing } => assert_eq!(missing, vec!["store_rating".to_string()]),
        other => panic!("expected SchemaIncomplete, got {:?}", other),
    }
}

#[test]
fn test_cached_fixture_loads_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gshop_sidebar_schema.json");
    fs::write(&path, FIXTURE).unwrap();

    let schema = obtain_schema(SAMPLE_SIDEBAR_HTML, &path, false, &Unreachable).unwrap();

    assert_eq!(schema, ExtractionSchema::from_json(FIXTURE).unwrap());
}

#[test]
fn test_malformed_cache_is_invalid_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gshop_sidebar_schema.json");
    fs::write(&path, "{ not json").unwrap();

    let err = obtain_schema(SAMPLE_SIDEBAR_HTML, &path, false, &Unreachable).unwrap_err();

    assert!(matches!(err, HarvestError::InvalidSchema(_)));
}

#[test]
fn test_generation_failure_leaves_cache_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gshop_sidebar_schema.json");
    fs::write(&path, FIXTURE).unwrap();

    let err = obtain_schema(SAMPLE_SIDEBAR_HTML, &path, true, &Offline).unwrap_err();

    assert!(matches!(err, HarvestError::SchemaGenerationFailed(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), FIXTURE);
}
