//! Evaluation of an [`ExtractionSchema`] over an HTML fragment

use crate::error::{HarvestError, Result};
use crate::schema::{ExtractionSchema, FieldKind, FieldSpec};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

/// A field with its selector and pattern parsed up front
struct CompiledField<'s> {
    spec: &'s FieldSpec,
    selector: Option<Selector>,
    pattern: Option<Regex>,
    fields: Vec<CompiledField<'s>>,
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::InvalidSchema(format!("Bad selector '{}': {:?}", selector, e)))
}

fn compile_fields(specs: &[FieldSpec]) -> Result<Vec<CompiledField<'_>>> {
    specs.iter().map(compile_field).collect()
}

fn compile_field(spec: &FieldSpec) -> Result<CompiledField<'_>> {
    let selector = spec.selector.as_deref().map(parse_selector).transpose()?;

    let pattern = match (spec.kind, spec.pattern.as_deref()) {
        (FieldKind::Regex, Some(pattern)) => Some(
            Regex::new(pattern)
                .map_err(|e| HarvestError::InvalidSchema(format!("Bad pattern for '{}': {}", spec.name, e)))?,
        ),
        (FieldKind::Regex, None) => {
            return Err(HarvestError::InvalidSchema(format!("Regex field '{}' has no pattern", spec.name)));
        }
        _ => None,
    };

    if spec.kind == FieldKind::Attribute && spec.attribute.is_none() {
        return Err(HarvestError::InvalidSchema(format!("Attribute field '{}' names no attribute", spec.name)));
    }

    Ok(CompiledField { spec, selector, pattern, fields: compile_fields(&spec.fields)? })
}

impl ExtractionSchema {
    /// Run the schema over `html`, returning one JSON object per element that
    /// matches the base selector. Rows with no extracted values are dropped.
    pub fn extract(&self, html: &str) -> Result<Vec<Value>> {
        let base = parse_selector(&self.base_selector)?;
        let base_fields = compile_fields(&self.base_fields)?;
        let fields = compile_fields(&self.fields)?;

        let document = Html::parse_fragment(html);
        let rows = document
            .select(&base)
            .filter_map(|element| {
                let mut row = extract_item(element, &base_fields);
                row.extend(extract_item(element, &fields));
                (!row.is_empty()).then_some(Value::Object(row))
            })
            .collect();

        Ok(rows)
    }
}

fn extract_item(element: ElementRef<'_>, fields: &[CompiledField<'_>]) -> Map<String, Value> {
    let mut item = Map::new();
    for field in fields {
        if let Some(value) = extract_field(element, field).or_else(|| field.spec.default.clone()) {
            item.insert(field.spec.name.clone(), value);
        }
    }
    item
}

fn extract_field(element: ElementRef<'_>, field: &CompiledField<'_>) -> Option<Value> {
    match field.spec.kind {
        FieldKind::List | FieldKind::NestedList => {
            let items: Vec<Value> = targets(element, field)
                .into_iter()
                .map(|target| extract_item(target, &field.fields))
                .filter(|item| !item.is_empty())
                .map(Value::Object)
                .collect();
            Some(Value::Array(items))
        }
        FieldKind::Nested => {
            let target = first_target(element, field)?;
            Some(Value::Object(extract_item(target, &field.fields)))
        }
        FieldKind::Text => {
            let text = text_of(first_target(element, field)?);
            (!text.is_empty()).then_some(Value::String(text))
        }
        FieldKind::Attribute => {
            let name = field.spec.attribute.as_deref()?;
            first_target(element, field)?.value().attr(name).map(|v| Value::String(v.to_string()))
        }
        FieldKind::Html => Some(Value::String(first_target(element, field)?.inner_html())),
        FieldKind::Regex => {
            let text = text_of(first_target(element, field)?);
            let captures = field.pattern.as_ref()?.captures(&text)?;
            captures.get(1).or_else(|| captures.get(0)).map(|m| Value::String(m.as_str().to_string()))
        }
    }
}

fn first_target<'a>(element: ElementRef<'a>, field: &CompiledField<'_>) -> Option<ElementRef<'a>> {
    match &field.selector {
        Some(selector) => element.select(selector).next(),
        None => Some(element),
    }
}

fn targets<'a>(element: ElementRef<'a>, field: &CompiledField<'_>) -> Vec<ElementRef<'a>> {
    match &field.selector {
        Some(selector) => element.select(selector).collect(),
        None => vec![element],
    }
}

/// Text nodes with surrounding whitespace stripped, concatenated
fn text_of(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).filter(|s| !s.is_empty()).collect()
}
