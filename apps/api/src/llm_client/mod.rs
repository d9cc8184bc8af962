//! LLM Client: the single point of entry for all Claude API calls in the screener.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Candidate extraction, match scoring and interview questions all go through here.
//!
//! Every call runs at temperature 0 so repeated screenings of the same resume stay stable.

use jsonschema::JSONSchema;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub(crate) mod stub;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls. Hardcoded to prevent scoring drift between deploys.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const TEMPERATURE: f32 = 0.0;
/// Extra attempts made when the model's JSON violates the expected schema.
const MAX_SCHEMA_REPAIRS: u32 = 1;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response violated schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Invalid response schema definition: {0}")]
    SchemaDefinition(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the Anthropic Messages API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, ANTHROPIC_API_URL.to_string())
    }

    /// Client for a Messages-compatible endpoint other than the public API.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let value = parse_json_payload(text)?;
        serde_json::from_value(value).map_err(LlmError::Parse)
    }

    /// Calls the LLM, validates the JSON against `schema`, then deserializes it.
    ///
    /// On a schema violation the prompt is re-sent once with the violations appended,
    /// so the model can repair its own output.
    pub async fn call_validated<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        schema: &Value,
    ) -> Result<T, LlmError> {
        let compiled = compile_schema(schema)?;
        let mut current_prompt = prompt.to_string();

        for attempt in 0..=MAX_SCHEMA_REPAIRS {
            let value: Value = self.call_json(&current_prompt, system).await?;
            match validate_against(&compiled, &value) {
                Ok(()) => return serde_json::from_value(value).map_err(LlmError::Parse),
                Err(violations) if attempt < MAX_SCHEMA_REPAIRS => {
                    warn!(
                        "LLM response violated schema ({} problems), asking for a repair",
                        violations.len()
                    );
                    current_prompt = repair_prompt(prompt, &violations);
                }
                Err(violations) => return Err(LlmError::Schema(violations)),
            }
        }

        Err(LlmError::EmptyContent)
    }
}

/// Compiles a JSON Schema, reporting definition problems as `SchemaDefinition`.
pub fn compile_schema(schema: &Value) -> Result<JSONSchema, LlmError> {
    JSONSchema::compile(schema).map_err(|e| LlmError::SchemaDefinition(e.to_string()))
}

/// Validates `value`, returning every violation as `"<path>: <message>"`.
pub fn validate_against(compiled: &JSONSchema, value: &Value) -> Result<(), Vec<String>> {
    let result = compiled.validate(value);
    match result {
        Ok(()) => Ok(()),
        Err(errors) => Err(errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect()),
    }
}

fn repair_prompt(prompt: &str, violations: &[String]) -> String {
    let mut repaired = String::with_capacity(prompt.len() + 256);
    repaired.push_str(prompt);
    repaired.push_str(
        "\n\nYOUR PREVIOUS RESPONSE WAS REJECTED. Fix these schema violations and return the full JSON object again:\n",
    );
    for violation in violations {
        repaired.push_str("- ");
        repaired.push_str(violation);
        repaired.push('\n');
    }
    repaired
}

/// Parses model output into JSON, tolerating code fences and surrounding prose.
fn parse_json_payload(text: &str) -> Result<Value, LlmError> {
    let text = strip_json_fences(text);
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first_err) => match extract_json_object(text) {
            Some(inner) => serde_json::from_str(inner).map_err(LlmError::Parse),
            None => Err(LlmError::Parse(first_err)),
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the outermost `{...}` span when the model wraps JSON in prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::stub::{spawn_stub, StubReply};
    use super::*;
    use serde_json::json;

    fn score_schema() -> Value {
        json!({
            "type": "object",
            "required": ["score"],
            "properties": {"score": {"type": "integer", "minimum": 0, "maximum": 100}}
        })
    }

    #[derive(Debug, Deserialize)]
    struct Scored {
        score: i64,
    }

    #[tokio::test]
    async fn test_call_retries_server_error_then_succeeds() {
        let stub = spawn_stub(vec![
            StubReply::Status(500),
            StubReply::Text("{\"score\": 7}".to_string()),
        ])
        .await;

        let scored: Scored = stub.client.call_json("p", "s").await.unwrap();
        assert_eq!(scored.score, 7);
        assert_eq!(stub.hits(), 2);
    }

    #[tokio::test]
    async fn test_call_gives_up_after_repeated_rate_limits() {
        let stub = spawn_stub(vec![StubReply::Status(429)]).await;

        let err = stub.client.call("p", "s").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 429, .. }), "got {err:?}");
        assert_eq!(stub.hits(), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_call_does_not_retry_client_errors() {
        let stub = spawn_stub(vec![StubReply::Status(400)]).await;

        let err = stub.client.call("p", "s").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_call_validated_repairs_once() {
        let stub = spawn_stub(vec![
            StubReply::Text("{\"score\": 140}".to_string()),
            StubReply::Text("{\"score\": 88}".to_string()),
        ])
        .await;

        let scored: Scored = stub
            .client
            .call_validated("BASE PROMPT", "s", &score_schema())
            .await
            .unwrap();
        assert_eq!(scored.score, 88);
        assert_eq!(stub.hits(), 2);

        let prompts = stub.prompts();
        assert_eq!(prompts[0], "BASE PROMPT");
        assert!(prompts[1].starts_with("BASE PROMPT"));
        assert!(prompts[1].contains("YOUR PREVIOUS RESPONSE WAS REJECTED"));
        assert!(prompts[1].contains("/score"));
    }

    #[tokio::test]
    async fn test_call_validated_fails_with_schema_after_repair() {
        let stub = spawn_stub(vec![StubReply::Text("{\"score\": -5}".to_string())]).await;

        let err = stub
            .client
            .call_validated::<Scored>("p", "s", &score_schema())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Schema(ref v) if !v.is_empty()), "got {err:?}");
        assert_eq!(stub.hits(), 1 + MAX_SCHEMA_REPAIRS as usize);
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_json_object_from_prose() {
        let input = "Here is the result: {\"score\": 72} Hope this helps!";
        assert_eq!(extract_json_object(input), Some("{\"score\": 72}"));
    }

    #[test]
    fn test_extract_json_object_none_without_braces() {
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn test_parse_json_payload_falls_back_to_inner_object() {
        let value = parse_json_payload("Sure! {\"a\": [1, 2]} done").unwrap();
        assert_eq!(value, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_parse_json_payload_rejects_garbage() {
        assert!(matches!(
            parse_json_payload("not json at all"),
            Err(LlmError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_against_reports_paths() {
        let schema = json!({
            "type": "object",
            "required": ["score"],
            "properties": {"score": {"type": "integer", "minimum": 0, "maximum": 100}}
        });
        let compiled = compile_schema(&schema).unwrap();

        assert!(validate_against(&compiled, &json!({"score": 55})).is_ok());

        let violations = validate_against(&compiled, &json!({"score": 140})).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("/score"), "got {violations:?}");

        let missing = validate_against(&compiled, &json!({})).unwrap_err();
        assert!(missing[0].contains("score"));
    }

    #[test]
    fn test_compile_schema_rejects_invalid_definition() {
        let schema = json!({"type": 12});
        assert!(matches!(
            compile_schema(&schema),
            Err(LlmError::SchemaDefinition(_))
        ));
    }

    #[test]
    fn test_repair_prompt_lists_violations() {
        let prompt = repair_prompt("BASE", &["/score: too big".to_string()]);
        assert!(prompt.starts_with("BASE"));
        assert!(prompt.contains("- /score: too big"));
    }

    #[test]
    fn test_request_serializes_temperature_zero() {
        let body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: "sys",
            messages: vec![AnthropicMessage {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["temperature"], json!(0.0));
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
