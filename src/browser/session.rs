use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            browser::driver::{ActionResult, ExtractionResult, SessionDriver},
            error::{HarvestError, Result},
            schema::ExtractionSchema};
use headless_chrome::{Browser, Tab};
use std::{collections::HashMap, ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance.
///
/// Each named session is backed by its own tab. The tab is created by the
/// first [`SessionDriver::open`] for that name and reused afterwards, so the
/// page state built up by clicks and scrolls carries over between actions.
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Session id -> tab
    sessions: HashMap<String, Arc<Tab>>,

    /// Upper bound for every wait-for-selector
    wait_timeout: Duration,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A harvest can run for many minutes between CDP messages on slow pages
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path.clone() {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir.clone() {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        Ok(Self { browser, sessions: HashMap::new(), wait_timeout: options.wait_timeout() })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| HarvestError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser, sessions: HashMap::new(), wait_timeout: Duration::from_millis(options.timeout) })
    }

    /// Tab backing an already opened session
    fn session_tab(&self, session_id: &str) -> Result<Arc<Tab>> {
        self.sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| HarvestError::SessionNotFound(session_id.to_string()))
    }

    fn get_or_create_tab(&mut self, session_id: &str) -> Result<Arc<Tab>> {
        if let Some(tab) = self.sessions.get(session_id) {
            return Ok(tab.clone());
        }

        let tab = self
            .browser
            .new_tab()
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;
        self.sessions.insert(session_id.to_string(), tab.clone());
        log::debug!("Created tab for session '{}'", session_id);

        Ok(tab)
    }

    /// Block until `selector` matches, returning the failure message on timeout
    fn wait_for(&self, tab: &Tab, selector: &str) -> std::result::Result<(), String> {
        tab.wait_for_element_with_custom_timeout(selector, self.wait_timeout)
            .map(|_| ())
            .map_err(|e| format!("Timed out waiting for '{}': {}", selector, e))
    }

    /// Outer HTML of every element matching `root_selector`, newline separated
    fn root_html(&self, tab: &Tab, root_selector: &str) -> Result<String> {
        let js_code = include_str!("outer_html.js").replace("__ROOT_SELECTOR__", &serde_json::to_string(root_selector)?);

        let result = tab
            .evaluate(&js_code, false)
            .map_err(|e| HarvestError::EvaluationFailed(format!("Failed to read '{}': {}", root_selector, e)))?;

        Ok(result.value.as_ref().and_then(|v| v.as_str()).unwrap_or_default().to_string())
    }

    /// Close every session tab
    pub fn close(&mut self) -> Result<()> {
        // The browser process itself exits when `Browser` is dropped
        for (session_id, tab) in self.sessions.drain() {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab for session '{}': {}", session_id, e);
            }
        }
        Ok(())
    }
}

impl SessionDriver for BrowserSession {
    fn open(&mut self, session_id: &str, url: &str, wait_for: Option<&str>) -> Result<ActionResult> {
        let tab = self.get_or_create_tab(session_id)?;

        tab.navigate_to(url)
            .map_err(|e| HarvestError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| HarvestError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        if let Some(selector) = wait_for {
            if let Err(reason) = self.wait_for(&tab, selector) {
                return Ok(ActionResult::failure(reason));
            }
        }

        Ok(ActionResult::success_with(serde_json::json!({ "url": tab.get_url() })))
    }

    fn run_script(&mut self, session_id: &str, script: &str, wait_for: Option<&str>) -> Result<ActionResult> {
        let tab = self.session_tab(session_id)?;

        let result = tab
            .evaluate(script, false)
            .map_err(|e| HarvestError::EvaluationFailed(e.to_string()))?;
        log::debug!("Script in '{}' returned {:?}", session_id, result.value);

        if let Some(selector) = wait_for {
            if let Err(reason) = self.wait_for(&tab, selector) {
                return Ok(ActionResult::failure_with(result.value, reason));
            }
        }

        Ok(match result.value {
            Some(value) => ActionResult::success_with(value),
            None => ActionResult::success(),
        })
    }

    fn extract(
        &mut self,
        session_id: &str,
        root_selector: &str,
        schema: &ExtractionSchema,
        wait_for: Option<&str>,
    ) -> Result<ExtractionResult> {
        let tab = self.session_tab(session_id)?;

        if let Some(selector) = wait_for {
            if let Err(reason) = self.wait_for(&tab, selector) {
                return Ok(ExtractionResult::failed(reason));
            }
        }

        let html = self.root_html(&tab, root_selector)?;
        if html.is_empty() {
            return Ok(ExtractionResult::rows(Vec::new()));
        }

        Ok(match schema.extract(&html) {
            Ok(rows) => ExtractionResult::rows(rows),
            Err(e) => ExtractionResult::failed(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new().headless(true).window_size(800, 600).wait_timeout_ms(1500);

        assert!(opts.headless);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert_eq!(opts.wait_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_open_creates_session() {
        let mut session =
            BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let result = session.open("s1", "about:blank", None).expect("Failed to open");
        assert!(result.success);
        assert!(session.session_tab("s1").is_ok());
        assert!(matches!(session.session_tab("s2"), Err(HarvestError::SessionNotFound(_))));
    }

    #[test]
    #[ignore]
    fn test_script_state_survives_between_actions() {
        let mut session =
            BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        session.open("s1", "about:blank", None).expect("Failed to open");

        session.run_script("s1", "window.__counter = 41; true", None).expect("Failed to run script");
        let result = session.run_script("s1", "window.__counter + 1", None).expect("Failed to run script");

        assert_eq!(result.value, Some(serde_json::json!(42)));
    }

    #[test]
    #[ignore]
    fn test_unknown_session_is_an_error() {
        let mut session =
            BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let result = session.run_script("missing", "1", None);
        assert!(matches!(result, Err(HarvestError::SessionNotFound(_))));
    }

    #[test]
    #[ignore]
    fn test_close_drops_every_session() {
        let mut session =
            BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        session.open("s1", "about:blank", None).expect("Failed to open");
        session.open("s2", "about:blank", None).expect("Failed to open");

        session.close().expect("Failed to close");

        assert!(matches!(session.session_tab("s1"), Err(HarvestError::SessionNotFound(_))));
        assert!(matches!(session.session_tab("s2"), Err(HarvestError::SessionNotFound(_))));
    }
}
