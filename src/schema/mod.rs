//! Declarative extraction schemas
//!
//! An [`ExtractionSchema`] maps field names to CSS locators. It is produced once
//! per run, either read from a cache file or generated from an annotated sample
//! page, and must be able to produce every name in [`REQUIRED_FIELDS`] before
//! a harvest is allowed to start.

pub mod evaluate;
pub mod generator;
pub mod provider;

pub use generator::{LlmConfig, LlmSchemaGenerator, SchemaGenerator};
pub use provider::obtain_schema;

use crate::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Field names the harvester maps into products.
///
/// The first three are product-level; the rest are read from every merchant row.
pub const REQUIRED_FIELDS: [&str; 7] =
    ["product_title", "overall_rating", "review_count", "store", "price", "href", "store_rating"];

/// Annotated sidebar markup used as the example page for schema generation
pub const SAMPLE_SIDEBAR_HTML: &str = include_str!("sample_sidebar.html");

/// How a field's value is read from the element its selector matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Attribute,
    Html,
    Regex,
    Nested,
    List,
    NestedList,
}

/// One named field of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    /// CSS selector relative to the enclosing element; the element itself when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Attribute to read for `attribute` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Pattern for `regex` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Sub-fields for `nested`, `list` and `nested_list` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            selector: None,
            kind,
            attribute: None,
            pattern: None,
            fields: Vec::new(),
            default: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A JSON/CSS extraction schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Each element matching this selector yields one row
    #[serde(rename = "baseSelector")]
    pub base_selector: String,

    /// Fields read from the base element itself
    #[serde(default, rename = "baseFields", skip_serializing_if = "Vec::is_empty")]
    pub base_fields: Vec<FieldSpec>,

    pub fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    pub fn new(base_selector: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self { name: None, base_selector: base_selector.into(), base_fields: Vec::new(), fields }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HarvestError::InvalidSchema(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every name the schema can produce: top-level fields plus the sub-fields
    /// of each `list` field.
    pub fn field_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        for field in self.fields.iter().filter(|f| f.kind == FieldKind::List) {
            names.extend(field.fields.iter().map(|f| f.name.as_str()));
        }
        names
    }

    /// Required names the schema cannot produce, sorted
    pub fn missing_fields(&self) -> Vec<String> {
        let names = self.field_names();
        let mut missing: Vec<String> =
            REQUIRED_FIELDS.iter().filter(|name| !names.contains(*name)).map(|name| name.to_string()).collect();
        missing.sort();
        missing
    }

    /// Fail unless every required field name is present
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HarvestError::SchemaIncomplete { missing })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A complete schema for the shopping sidebar
    pub(crate) fn sidebar_schema() -> ExtractionSchema {
        ExtractionSchema::new(
            "div.zxYWDc.q9kVJb",
            vec![
                FieldSpec::new("product_title", FieldKind::Text).with_selector("[data-attrid='product_title']"),
                FieldSpec::new("overall_rating", FieldKind::Text)
                    .with_selector("[data-attrid='product_rating'] span.yi40Hd"),
                FieldSpec::new("review_count", FieldKind::Text)
                    .with_selector("[data-attrid='product_rating'] span.Bk5Fre"),
                FieldSpec::new("merchants", FieldKind::List).with_selector("div.PshwNb > a").with_fields(vec![
                    FieldSpec::new("store", FieldKind::Text).with_selector("div.hP4iBf"),
                    FieldSpec::new("price", FieldKind::Text).with_selector("span[aria-label^='Current price']"),
                    FieldSpec::new("href", FieldKind::Attribute).with_attribute("href"),
                    FieldSpec::new("store_rating", FieldKind::Text)
                        .with_selector("span[aria-label^='Rated'] span.NFq8Ad"),
                ]),
            ],
        )
        .with_name("Shopping sidebar")
    }

    /// Drop `name` wherever it occurs, top level or inside a list
    fn without_field(mut schema: ExtractionSchema, name: &str) -> ExtractionSchema {
        schema.fields.retain(|f| f.name != name);
        for field in &mut schema.fields {
            field.fields.retain(|f| f.name != name);
        }
        schema
    }

    #[test]
    fn test_complete_schema_validates() {
        assert!(sidebar_schema().validate().is_ok());
        assert!(sidebar_schema().missing_fields().is_empty());
    }

    #[test]
    fn test_removing_any_required_field_names_exactly_that_field() {
        for name in REQUIRED_FIELDS {
            let schema = without_field(sidebar_schema(), name);
            match schema.validate() {
                Err(HarvestError::SchemaIncomplete { missing }) => assert_eq!(missing, vec![name.to_string()]),
                other => panic!("expected {} to be reported missing, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_missing_fields_are_sorted_and_all_reported() {
        let schema = ExtractionSchema::new("div", vec![FieldSpec::new("product_title", FieldKind::Text)]);
        assert_eq!(
            schema.missing_fields(),
            vec!["href", "overall_rating", "price", "review_count", "store", "store_rating"]
        );
    }

    #[test]
    fn test_nested_names_only_count_inside_list_fields() {
        let mut schema = sidebar_schema();
        let merchants = schema.fields.iter_mut().find(|f| f.name == "merchants").unwrap();
        merchants.kind = FieldKind::Nested;

        let missing = schema.missing_fields();
        assert_eq!(missing, vec!["href", "price", "store", "store_rating"]);
    }

    #[test]
    fn test_schema_json_uses_document_field_names() {
        let json = serde_json::to_value(sidebar_schema()).unwrap();
        assert_eq!(json["baseSelector"], "div.zxYWDc.q9kVJb");
        assert_eq!(json["fields"][3]["type"], "list");
        assert!(json.get("baseFields").is_none());
    }

    #[test]
    fn test_from_json_reads_cached_document() {
        let json = r#"{
            "name": "Sidebar",
            "baseSelector": "div.root",
            "fields": [
                {"name": "product_title", "selector": "h1", "type": "text"},
                {"name": "rows", "selector": "li", "type": "nested_list", "fields": [
                    {"name": "href", "selector": "a", "type": "attribute", "attribute": "href"}
                ]}
            ]
        }"#;

        let schema = ExtractionSchema::from_json(json).unwrap();
        assert_eq!(schema.base_selector, "div.root");
        assert_eq!(schema.fields[1].kind, FieldKind::NestedList);
        assert_eq!(schema.fields[1].fields[0].attribute.as_deref(), Some("href"));
    }

    #[test]
    fn test_from_json_rejects_unknown_field_type() {
        let json = r#"{"baseSelector": "div", "fields": [{"name": "x", "type": "xpath"}]}"#;
        assert!(matches!(ExtractionSchema::from_json(json), Err(HarvestError::InvalidSchema(_))));
    }
}
