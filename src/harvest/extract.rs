//! Extraction step: run the schema against the click-revealed sidebar

use crate::browser::SessionDriver;
use crate::harvest::config::HarvestConfig;
use crate::schema::ExtractionSchema;
use serde_json::{Map, Value};

/// Product-level values, read from the first row of a sidebar extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductHead {
    pub title: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub price: Option<String>,
}

/// One merchant offer inside a sidebar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MerchantRow {
    pub store: Option<String>,
    pub price: Option<String>,
    pub href: Option<String>,
    pub store_rating: Option<String>,
}

/// A structured sidebar record: one scalar head plus the repeated merchant rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRow {
    pub head: ProductHead,
    pub merchants: Vec<MerchantRow>,
}

impl ExtractedRow {
    /// Interpret one extracted JSON object. Non-objects are not rows.
    ///
    /// Merchant rows come from the `merchants` key, or failing that from the
    /// first value that is an array of objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let merchants: Vec<MerchantRow> = object
            .get("merchants")
            .and_then(Value::as_array)
            .or_else(|| object.values().filter_map(Value::as_array).find(|items| items.iter().any(Value::is_object)))
            .map(|items| items.iter().filter_map(Value::as_object).map(MerchantRow::from_object).collect())
            .unwrap_or_default();

        Some(Self {
            head: ProductHead {
                title: scalar(object, "product_title"),
                rating: scalar(object, "overall_rating"),
                review_count: scalar(object, "review_count"),
                price: scalar(object, "price"),
            },
            merchants,
        })
    }
}

impl MerchantRow {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            store: scalar(object, "store"),
            price: scalar(object, "price"),
            href: scalar(object, "href"),
            store_rating: scalar(object, "store_rating"),
        }
    }
}

/// String form of a scalar value; blank strings and non-scalars count as absent
fn scalar(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// What one extraction attempt produced
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarExtraction {
    /// The driver reported a failure; carries its reason
    Failed(String),

    /// Extraction ran; may be empty while the sidebar is still rendering
    Rows(Vec<ExtractedRow>),
}

/// Wait for the sidebar title to appear, then run `schema` over the sidebar root.
///
/// Never fails: driver errors and non-success results are folded into
/// [`SidebarExtraction::Failed`] and are not retried.
pub fn extract_sidebar<D: SessionDriver + ?Sized>(
    driver: &mut D,
    schema: &ExtractionSchema,
    config: &HarvestConfig,
) -> SidebarExtraction {
    let result = driver.extract(
        &config.session_id,
        &config.sidebar_root_selector,
        schema,
        Some(&config.sidebar_title_selector),
    );

    match result {
        Ok(result) if result.success => {
            SidebarExtraction::Rows(result.rows.iter().filter_map(ExtractedRow::from_value).collect())
        }
        Ok(result) => SidebarExtraction::Failed(result.error.unwrap_or_else(|| "extraction failed".to_string())),
        Err(e) => SidebarExtraction::Failed(e.to_string()),
    }
}
