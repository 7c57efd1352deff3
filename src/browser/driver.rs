use crate::error::Result;
use crate::schema::ExtractionSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a scripted action run against a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action (including any requested wait) completed
    pub success: bool,

    /// Value the script evaluated to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success() -> Self {
        Self { success: true, value: None, error: None }
    }

    pub fn success_with(value: Value) -> Self {
        Self { success: true, value: Some(value), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, value: None, error: Some(error.into()) }
    }

    /// The script ran and produced `value`, but a follow-up condition failed
    pub fn failure_with(value: Option<Value>, error: impl Into<String>) -> Self {
        Self { success: false, value, error: Some(error.into()) }
    }

    /// The returned value when it is a JSON string
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

/// Outcome of running an extraction schema against a session's DOM
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionResult {
    pub success: bool,

    /// One JSON object per element matched by the schema's base selector
    pub rows: Vec<Value>,

    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn rows(rows: Vec<Value>) -> Self {
        Self { success: true, rows, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, rows: Vec::new(), error: Some(error.into()) }
    }
}

/// The narrow interface the harvester uses to talk to a browser.
///
/// Every call names a session; calls against the same session id act on one
/// continuously live page, so DOM changes made by one action are visible to
/// the next. Calls are made strictly one after another.
///
/// `Err` is reserved for problems with the session itself (unknown id, dead
/// browser, script that could not be evaluated). A page that simply does not
/// reach the requested state is reported through a non-success result.
pub trait SessionDriver {
    /// Navigate `session_id` to `url`, creating the session if needed, and
    /// optionally block until `wait_for` matches an element.
    fn open(&mut self, session_id: &str, url: &str, wait_for: Option<&str>) -> Result<ActionResult>;

    /// Evaluate `script` in the session's page and optionally block until
    /// `wait_for` matches an element.
    fn run_script(&mut self, session_id: &str, script: &str, wait_for: Option<&str>) -> Result<ActionResult>;

    /// Run `schema` over the part of the page under `root_selector`, after
    /// optionally blocking until `wait_for` matches an element.
    fn extract(
        &mut self,
        session_id: &str,
        root_selector: &str,
        schema: &ExtractionSchema,
        wait_for: Option<&str>,
    ) -> Result<ExtractionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_result_value_str() {
        let result = ActionResult::success_with(json!("NO_CARD"));
        assert!(result.success);
        assert_eq!(result.value_str(), Some("NO_CARD"));

        let result = ActionResult::success_with(json!(3));
        assert_eq!(result.value_str(), None);
    }

    #[test]
    fn test_action_result_failure_keeps_value() {
        let result = ActionResult::failure_with(Some(json!("OK")), "timed out");
        assert!(!result.success);
        assert_eq!(result.value_str(), Some("OK"));
        assert_eq!(result.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_action_result_serialization_skips_empty() {
        let json = serde_json::to_value(ActionResult::success()).unwrap();
        assert_eq!(json, json!({ "success": true }));
    }

    #[test]
    fn test_extraction_result_failed_has_no_rows() {
        let result = ExtractionResult::failed("boom");
        assert!(!result.success);
        assert!(result.rows.is_empty());
    }
}
