//! The tile-by-tile harvest loop
//!
//! A run walks through four states:
//!
//! - `Opening`: load the search page and wait for the first tile
//! - `Scrolling`: a fixed number of one-viewport scrolls so lazy tiles render
//! - `Iterating`: click the next unvisited tile, extract the sidebar, append a
//!   ranked product; repeated until no tile is left or the tile bound is hit
//! - `Done`: assemble the [`ShoppingResults`]
//!
//! Which tiles have been visited is tracked by a marker inside the page, never
//! in process. Tiles whose extraction fails or comes back empty are skipped
//! without consuming a rank; they still count toward the tile bound.

pub mod config;
pub mod extract;
pub mod tile;

pub use config::{HarvestConfig, MAX_TILES, SCROLL_STEPS};
pub use extract::{ExtractedRow, MerchantRow, ProductHead, SidebarExtraction, extract_sidebar};
pub use tile::{NO_TILE, SCROLL_SCRIPT, TileAdvance, advance_tile, next_tile_script};

use crate::browser::SessionDriver;
use crate::results::{ProductList, ShoppingResults};
use crate::schema::ExtractionSchema;
use chrono::Utc;

/// Why the iterating state ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The page had no unvisited tile left
    Exhausted,

    /// `max_tiles` tiles were visited; unseen tiles may remain
    BoundReached,

    /// `max_consecutive_failures` unusable tiles in a row
    FailureThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    Opening,
    Scrolling,
    Iterating,
    Done(Termination),
}

/// How a run went, beyond the products it produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestReport {
    pub termination: Termination,

    /// Tiles clicked, including skipped ones
    pub tiles_advanced: usize,

    /// Tiles that yielded no product
    pub tiles_skipped: usize,
}

/// `endpoint?tbm=shop&q=<query>`, form-encoded
pub fn search_url(endpoint: &str, query: &str) -> String {
    let encoded = urlencoding::encode(query).replace("%20", "+");
    format!("{}?tbm=shop&q={}", endpoint, encoded)
}

#[derive(Default)]
struct RunState {
    products: ProductList,
    tiles_advanced: usize,
    tiles_skipped: usize,
    consecutive_failures: usize,
}

/// Drives one harvest over a [`SessionDriver`]
pub struct Harvester<'a, D: SessionDriver + ?Sized> {
    driver: &'a mut D,
    schema: &'a ExtractionSchema,
    config: &'a HarvestConfig,
}

impl<'a, D: SessionDriver + ?Sized> Harvester<'a, D> {
    pub fn new(driver: &'a mut D, schema: &'a ExtractionSchema, config: &'a HarvestConfig) -> Self {
        Self { driver, schema, config }
    }

    /// Harvest every reachable tile for `query`.
    ///
    /// Always yields results: per-tile failures are skipped, and a page that
    /// never shows a tile simply produces an empty product list.
    pub fn run(&mut self, query: &str) -> ShoppingResults {
        self.run_with_report(query).0
    }

    pub fn run_with_report(&mut self, query: &str) -> (ShoppingResults, HarvestReport) {
        let url = search_url(&self.config.search_endpoint, query);
        let mut run = RunState::default();
        let mut state = HarvestState::Opening;

        let termination = loop {
            state = match state {
                HarvestState::Opening => {
                    self.open(&url);
                    HarvestState::Scrolling
                }
                HarvestState::Scrolling => {
                    self.scroll();
                    HarvestState::Iterating
                }
                HarvestState::Iterating => self.iterate(&mut run),
                HarvestState::Done(termination) => break termination,
            };
        };

        log::info!(
            "Harvest finished ({:?}): {} products from {} tiles, {} skipped",
            termination,
            run.products.len(),
            run.tiles_advanced,
            run.tiles_skipped
        );

        let report = HarvestReport {
            termination,
            tiles_advanced: run.tiles_advanced,
            tiles_skipped: run.tiles_skipped,
        };
        (ShoppingResults::new(query, url, run.products, Utc::now()), report)
    }

    fn open(&mut self, url: &str) {
        log::info!("Opening {}", url);
        match self.driver.open(&self.config.session_id, url, Some(&self.config.tile_selector)) {
            Ok(result) if result.success => {}
            Ok(result) => log::warn!("No tile appeared after opening: {}", result.error.unwrap_or_default()),
            Err(e) => log::warn!("Opening the search page failed: {}", e),
        }
    }

    fn scroll(&mut self) {
        for step in 1..=self.config.scroll_steps {
            match self.driver.run_script(&self.config.session_id, SCROLL_SCRIPT, None) {
                Ok(result) if result.success => log::debug!("Scroll {}/{}", step, self.config.scroll_steps),
                Ok(result) => log::warn!("Scroll {} failed: {}", step, result.error.unwrap_or_default()),
                Err(e) => log::warn!("Scroll {} failed: {}", step, e),
            }
        }
    }

    /// One pass of the iterating state
    fn iterate(&mut self, run: &mut RunState) -> HarvestState {
        if run.tiles_advanced >= self.config.max_tiles {
            return HarvestState::Done(Termination::BoundReached);
        }

        if advance_tile(&mut *self.driver, self.config) == TileAdvance::Exhausted {
            return HarvestState::Done(Termination::Exhausted);
        }
        run.tiles_advanced += 1;

        let first_row = match extract_sidebar(&mut *self.driver, self.schema, self.config) {
            SidebarExtraction::Failed(reason) => {
                log::warn!("Tile {}: extraction failed: {}", run.tiles_advanced, reason);
                None
            }
            SidebarExtraction::Rows(rows) => {
                let first = rows.into_iter().next();
                if first.is_none() {
                    log::warn!("Tile {}: sidebar produced no rows", run.tiles_advanced);
                }
                first
            }
        };

        let appended = match first_row {
            Some(row) => match run.products.append(row) {
                Some(product) => {
                    log::info!("#{} {} ({} offers)", product.rank, product.name, product.links.len());
                    true
                }
                None => {
                    log::warn!("Tile {}: sidebar row has no product title", run.tiles_advanced);
                    false
                }
            },
            None => false,
        };

        if appended {
            run.consecutive_failures = 0;
        } else {
            run.tiles_skipped += 1;
            run.consecutive_failures += 1;
            if let Some(limit) = self.config.max_consecutive_failures {
                if run.consecutive_failures >= limit {
                    log::warn!("{} unusable tiles in a row, stopping", run.consecutive_failures);
                    return HarvestState::Done(Termination::FailureThreshold);
                }
            }
        }

        HarvestState::Iterating
    }
}
