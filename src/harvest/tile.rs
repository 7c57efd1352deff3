//! Tile advancement: click the next not-yet-visited result tile

use crate::browser::SessionDriver;
use crate::harvest::config::HarvestConfig;
use serde_json::Value;

/// Value the advancement script returns when every tile carries the visited marker
pub const NO_TILE: &str = "NO_CARD";

/// Scrolls the results by one viewport height to make lazy tiles render
pub const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight);";

/// Script that marks, highlights, scrolls to and clicks the first unvisited
/// tile in document order, or returns [`NO_TILE`] without touching the page.
pub fn next_tile_script(tile_selector: &str) -> String {
    let quoted = Value::String(tile_selector.to_string()).to_string();
    include_str!("next_tile.js").replace("__TILE_SELECTOR__", &quoted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileAdvance {
    /// A tile was marked visited and clicked
    Advanced,

    /// No unvisited tile is left
    Exhausted,
}

/// Run the advancement script once.
///
/// Only the [`NO_TILE`] sentinel ends the walk. Any other outcome, including a
/// failed action, counts as an advanced tile: the marker lives in the page, so
/// the next call moves on regardless.
pub fn advance_tile<D: SessionDriver + ?Sized>(driver: &mut D, config: &HarvestConfig) -> TileAdvance {
    let script = next_tile_script(&config.tile_selector);

    match driver.run_script(&config.session_id, &script, None) {
        Ok(result) if result.value_str() == Some(NO_TILE) => TileAdvance::Exhausted,
        Ok(result) => {
            if !result.success {
                log::warn!("Tile click did not complete cleanly: {}", result.error.unwrap_or_default());
            }
            TileAdvance::Advanced
        }
        Err(e) => {
            log::warn!("Tile click failed: {}", e);
            TileAdvance::Advanced
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_embeds_quoted_selector() {
        let script = next_tile_script(r#"div[data-kind="tile"]"#);
        assert!(script.contains(r#"document.querySelectorAll("div[data-kind=\"tile\"]")"#));
        assert!(!script.contains("__TILE_SELECTOR__"));
    }

    #[test]
    fn test_script_reports_sentinel_and_marks_visited() {
        let script = next_tile_script("div.njFjte");
        assert!(script.contains("'NO_CARD'"));
        assert!(script.contains("next.dataset.done = '1'"));
        assert!(script.contains("next.click()"));
    }
}
