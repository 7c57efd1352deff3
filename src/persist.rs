//! Writing harvest results to disk

use crate::error::Result;
use crate::results::ShoppingResults;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w.-]").expect("valid pattern"));

/// Filename-safe form of a query
pub fn slugify(text: &str) -> String {
    UNSAFE_CHARS.replace_all(text, "_").trim_matches('_').to_lowercase()
}

/// `gshop_<slug>_<YYYYmmdd_HHMMSS>.json`, stamped with the run's completion time
pub fn results_file_name(results: &ShoppingResults) -> String {
    format!("gshop_{}_{}.json", slugify(results.query()), results.scraped_at().format("%Y%m%d_%H%M%S"))
}

/// Write `results` as pretty JSON into `folder`, creating it if needed
pub fn save_results(results: &ShoppingResults, folder: &Path) -> Result<PathBuf> {
    fs::create_dir_all(folder)?;
    let path = folder.join(results_file_name(results));
    fs::write(&path, results.to_json_pretty()?)?;
    log::info!("Saved {} products to {}", results.total_products(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ProductList;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Gaming Headset"), "gaming_headset");
        assert_eq!(slugify("  usb-c hub 4.0! "), "usb-c_hub_4.0");
        assert_eq!(slugify("a/b\\c"), "a_b_c");
        assert_eq!(slugify("Café au lait"), "café_au_lait");
    }

    #[test]
    fn test_save_results_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("scrapes");
        let at = Utc.with_ymd_and_hms(2025, 7, 28, 9, 5, 3).unwrap();
        let results = ShoppingResults::new("Wireless Mouse", "https://x", ProductList::new(), at);

        let path = save_results(&results, &folder).unwrap();

        assert_eq!(path.file_name().unwrap(), "gshop_wireless_mouse_20250728_090503.json");
        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["query"], "Wireless Mouse");
        assert_eq!(saved["total_products"], 0);
        assert_eq!(saved["products"], serde_json::json!([]));
    }
}
