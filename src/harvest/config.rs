/// Default upper bound on tiles visited in one run
pub const MAX_TILES: usize = 50;

/// Default number of one-viewport scrolls issued before iterating tiles
pub const SCROLL_STEPS: usize = 6;

pub const DEFAULT_SESSION_ID: &str = "gshop";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.google.com/search";
pub const DEFAULT_TILE_SELECTOR: &str = "div.njFjte";
pub const DEFAULT_SIDEBAR_ROOT: &str = "div.zxYWDc.q9kVJb";

/// Selectors, bounds and session naming for one harvest
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    /// Name of the persistent browsing session
    pub session_id: String,

    /// Search page; the query goes in `q`, with `tbm=shop`
    pub search_endpoint: String,

    /// Clickable result tiles
    pub tile_selector: String,

    /// Detail region populated after a tile click
    pub sidebar_root_selector: String,

    /// Element whose presence means the sidebar has settled
    pub sidebar_title_selector: String,

    pub max_tiles: usize,

    pub scroll_steps: usize,

    /// Stop after this many unusable tiles in a row (disabled when `None`)
    pub max_consecutive_failures: Option<usize>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            session_id: DEFAULT_SESSION_ID.to_string(),
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            tile_selector: DEFAULT_TILE_SELECTOR.to_string(),
            sidebar_root_selector: DEFAULT_SIDEBAR_ROOT.to_string(),
            sidebar_title_selector: title_selector(DEFAULT_SIDEBAR_ROOT),
            max_tiles: MAX_TILES,
            scroll_steps: SCROLL_STEPS,
            max_consecutive_failures: None,
        }
    }
}

fn title_selector(root: &str) -> String {
    format!("{} [data-attrid=\"product_title\"]", root)
}

impl HarvestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn search_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.search_endpoint = endpoint.into();
        self
    }

    pub fn tile_selector(mut self, selector: impl Into<String>) -> Self {
        self.tile_selector = selector.into();
        self
    }

    /// Set the sidebar root; the title selector follows it
    pub fn sidebar_root(mut self, selector: impl Into<String>) -> Self {
        self.sidebar_root_selector = selector.into();
        self.sidebar_title_selector = title_selector(&self.sidebar_root_selector);
        self
    }

    pub fn sidebar_title_selector(mut self, selector: impl Into<String>) -> Self {
        self.sidebar_title_selector = selector.into();
        self
    }

    pub fn max_tiles(mut self, max_tiles: usize) -> Self {
        self.max_tiles = max_tiles;
        self
    }

    pub fn scroll_steps(mut self, steps: usize) -> Self {
        self.scroll_steps = steps;
        self
    }

    pub fn max_consecutive_failures(mut self, limit: Option<usize>) -> Self {
        self.max_consecutive_failures = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.max_tiles, 50);
        assert_eq!(config.scroll_steps, 6);
        assert_eq!(config.session_id, "gshop");
        assert_eq!(config.sidebar_title_selector, r#"div.zxYWDc.q9kVJb [data-attrid="product_title"]"#);
        assert_eq!(config.max_consecutive_failures, None);
    }

    #[test]
    fn test_sidebar_root_moves_title_selector() {
        let config = HarvestConfig::new().sidebar_root("aside.detail");
        assert_eq!(config.sidebar_title_selector, r#"aside.detail [data-attrid="product_title"]"#);

        let config = config.sidebar_title_selector("aside.detail h1");
        assert_eq!(config.sidebar_root_selector, "aside.detail");
        assert_eq!(config.sidebar_title_selector, "aside.detail h1");
    }
}
