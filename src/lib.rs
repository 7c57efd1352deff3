//! # shop-harvest
//!
//! Harvests product comparison data from a shopping results page whose detail
//! rows only exist after a result tile has been clicked. Tiles are clicked one
//! at a time inside a single persistent browser session, and each revealed
//! sidebar is turned into a ranked product by a declarative extraction schema.
//!
//! ## Features
//!
//! - **Harvest Loop**: open → lazy scroll → click/extract each tile → done, bounded by a tile limit
//! - **Session Driver**: a small trait over the browser, with a Chrome (CDP) implementation
//! - **Extraction Schemas**: JSON/CSS schemas, cached on disk or generated by an LLM from a sample page
//! - **Results**: ranked products with merchant offers, saved as timestamped JSON
//!
//! ## Command Line
//!
//! ```bash
//! # Requires an API key for schema generation
//! export LLM_KEY=sk-...
//!
//! # Headless run, prompts for the search term
//! cargo run --bin shop-harvest
//!
//! # Visible browser, explicit query
//! cargo run --bin shop-harvest -- --headed "gaming headset"
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use shop_harvest::{BrowserSession, HarvestConfig, Harvester, LaunchOptions};
//! use shop_harvest::schema::{LlmConfig, LlmSchemaGenerator, SAMPLE_SIDEBAR_HTML, obtain_schema};
//! use std::path::Path;
//!
//! # fn main() -> shop_harvest::Result<()> {
//! let generator = LlmSchemaGenerator::new(LlmConfig::new("sk-..."))?;
//! let schema = obtain_schema(SAMPLE_SIDEBAR_HTML, Path::new("gshop_sidebar_schema.json"), false, &generator)?;
//!
//! let mut session = BrowserSession::launch(LaunchOptions::new().headless(true))?;
//! let config = HarvestConfig::default();
//! let results = Harvester::new(&mut session, &schema, &config).run("gaming headset");
//!
//! println!("Harvested {} products", results.total_products());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: the [`SessionDriver`] trait and its Chrome implementation
//! - [`schema`]: extraction schemas, validation, evaluation, generation and caching
//! - [`harvest`]: tile advancement, sidebar extraction and the harvest state machine
//! - [`results`]: products, merchant links and the run aggregate
//! - [`persist`]: saving results to disk
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod error;
pub mod harvest;
pub mod persist;
pub mod results;
pub mod schema;

pub use browser::{ActionResult, BrowserSession, ConnectionOptions, ExtractionResult, LaunchOptions, SessionDriver};
pub use error::{HarvestError, Result};
pub use harvest::{HarvestConfig, HarvestReport, Harvester, Termination};
pub use results::{Product, ProductLink, ProductList, ShoppingResults};
pub use schema::{ExtractionSchema, FieldKind, FieldSpec};
