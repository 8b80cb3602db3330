//! Text generation through the Gemini `generateContent` REST endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use estima_core::{EstimaError, EstimaResult, Explainer};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
        }
    }
}

pub struct GeminiExplainer {
    settings: GeminiSettings,
    api_key: String,
    agent: ureq::Agent,
}

impl GeminiExplainer {
    pub fn new(settings: GeminiSettings, api_key: String) -> Self {
        Self {
            settings,
            api_key,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ]
    })
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: &Value) -> EstimaResult<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            let reason = response
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            EstimaError::ExternalService(format!("empty response: {reason}"))
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        return Err(EstimaError::ExternalService(
            "response contained no text".into(),
        ));
    }
    Ok(text)
}

impl Explainer for GeminiExplainer {
    fn generate(&self, prompt: &str) -> EstimaResult<String> {
        let url = self.url();
        debug!(%url, prompt_len = prompt.len(), "calling text generation");

        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", &self.api_key)
            .send_json(request_body(prompt))
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    EstimaError::ExternalService(format!(
                        "HTTP {code}: {}",
                        body.chars().take(500).collect::<String>()
                    ))
                }
                other => EstimaError::ExternalService(other.to_string()),
            })?;

        let value: Value = response
            .into_json()
            .map_err(|e| EstimaError::ExternalService(format!("invalid JSON response: {e}")))?;
        extract_text(&value)
    }
}
