//! Harvested products and the run's result aggregate

use crate::harvest::extract::{ExtractedRow, MerchantRow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// One merchant offer for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLink {
    pub url: String,
    pub price: Option<String>,
    pub store: Option<String>,
    pub rating: Option<String>,
}

impl ProductLink {
    /// A merchant row becomes a link only when it carries a url
    pub fn from_merchant(row: MerchantRow) -> Option<Self> {
        Some(Self { url: row.href?, price: row.price, store: row.store, rating: row.store_rating })
    }
}

/// A ranked product harvested from one tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 1-based position in harvest order
    pub rank: usize,
    pub name: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
    #[serde(default)]
    pub links: Vec<ProductLink>,
}

/// Products in harvest order. Ranks are handed out here and nowhere else, so
/// they always run 1..=len without gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductList {
    products: Vec<Product>,
}

impl ProductList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `row` into the next ranked product. Rows without a title are
    /// unusable and leave the list untouched.
    pub fn append(&mut self, row: ExtractedRow) -> Option<&Product> {
        let name = row.head.title?;
        let product = Product {
            rank: self.products.len() + 1,
            name,
            price: row.head.price,
            rating: row.head.rating,
            reviews_count: row.head.review_count,
            links: row.merchants.into_iter().filter_map(ProductLink::from_merchant).collect(),
        };
        self.products.push(product);
        self.products.last()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn as_slice(&self) -> &[Product] {
        &self.products
    }
}

/// The terminal aggregate of one harvest run
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingResults {
    query: String,
    products: Vec<Product>,
    scraped_at: DateTime<Utc>,
    search_url: String,
}

impl ShoppingResults {
    pub fn new(
        query: impl Into<String>,
        search_url: impl Into<String>,
        products: ProductList,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self { query: query.into(), products: products.products, scraped_at, search_url: search_url.into() }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn total_products(&self) -> usize {
        self.products.len()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ShoppingResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ShoppingResults", 5)?;
        state.serialize_field("query", &self.query)?;
        state.serialize_field("total_products", &self.total_products())?;
        state.serialize_field("products", &self.products)?;
        state.serialize_field("scraped_at", &self.scraped_at.to_rfc3339_opts(SecondsFormat::Micros, false))?;
        state.serialize_field("search_url", &self.search_url)?;
        state.end()
    }
}
