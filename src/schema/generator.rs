use crate::error::{HarvestError, Result};
use crate::schema::ExtractionSchema;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Natural-language description of the sidebar fields the harvester needs
pub const FIELD_INSTRUCTIONS: &str = "Extract the following:
- product_title: text at data-attrid='product_title'
- overall_rating: numeric rating inside data-attrid='product_rating'
- review_count: text like \"6.1K user reviews\" inside the same block
- merchants: LIST of rows, each row has:
    - store: text in div.hP4iBf
    - price: span whose aria-label starts with 'Current price'
    - href: href attribute of the row's outer <a>
    - store_rating: span whose aria-label starts with 'Rated'
Return a JSON/CSS schema that captures only those fields.";

const SYSTEM_PROMPT: &str = "You write CSS extraction schemas for HTML pages. \
Answer with a single JSON object of the form \
{\"name\": string, \"baseSelector\": string, \"fields\": [field]} where each field is \
{\"name\": string, \"selector\": string, \"type\": \"text\"|\"attribute\"|\"html\"|\"regex\"|\"nested\"|\"list\"|\"nested_list\", \
\"attribute\"?: string, \"pattern\"?: string, \"fields\"?: [field]}. \
Selectors are relative to the enclosing element; omit \"selector\" to read the enclosing element itself. \
Use type \"list\" with nested \"fields\" for repeated rows. No prose, no markdown.";

/// Produces an extraction schema from an annotated sample page
pub trait SchemaGenerator {
    fn generate(&self, sample_html: &str, instructions: &str) -> Result<ExtractionSchema>;
}

/// Settings for the OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,

    /// Model id; a `provider/` prefix such as `openai/` is stripped before sending
    pub model: String,

    pub base_url: String,

    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4.1-nano".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn model_id(&self) -> &str {
        self.model.split_once('/').map_or(self.model.as_str(), |(_, id)| id)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Schema generator backed by a chat completions API
pub struct LlmSchemaGenerator {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl LlmSchemaGenerator {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HarvestError::SchemaGenerationFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl SchemaGenerator for LlmSchemaGenerator {
    fn generate(&self, sample_html: &str, instructions: &str) -> Result<ExtractionSchema> {
        let body = json!({
            "model": self.config.model_id(),
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("HTML:\n{}\n\nInstructions:\n{}", sample_html, instructions) },
            ],
        });

        log::info!("Requesting extraction schema from {}", self.config.model_id());

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| HarvestError::SchemaGenerationFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(HarvestError::SchemaGenerationFailed(format!("HTTP {}: {}", status, text)));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| HarvestError::SchemaGenerationFailed(format!("Unreadable response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| HarvestError::SchemaGenerationFailed("Response contained no message".to_string()))?;

        parse_schema_document(&content)
    }
}

/// Parse a schema document returned by a model, tolerating a fenced code block
pub fn parse_schema_document(content: &str) -> Result<ExtractionSchema> {
    let trimmed = content.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(fenced) => {
            let fenced = fenced.strip_prefix("json").unwrap_or(fenced);
            fenced.strip_suffix("```").unwrap_or(fenced).trim()
        }
        None => trimmed,
    };

    ExtractionSchema::from_json(body)
}
