use crate::error::{VidqlError, VidqlResult};
use crate::extract::ParameterExtractor;
use crate::params::RawParameters;
use crate::VidqlConfig;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Duration;
use tracing::{debug, info};

const FUNCTION_NAME: &str = "build_sql_query";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extractor backed by an OpenAI-compatible chat-completions endpoint.
/// One outbound request per call, no state between calls; the underlying
/// client is a connection pool safe for concurrent use.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(config: &VidqlConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model_name.clone(),
        }
    }
}

#[async_trait]
impl ParameterExtractor for OpenAiExtractor {
    async fn extract(&self, question: &str, today: NaiveDate) -> VidqlResult<RawParameters> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "requesting parameter extraction");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&build_request_body(&self.model, question, today))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| VidqlError::Extraction(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| VidqlError::Extraction(format!("unreadable response body: {}", e)))?;

        let raw = parse_tool_arguments(&parsed)?;
        info!(?raw, "extracted parameters");
        Ok(raw)
    }
}

/// Chat-completions request with a single forced tool call and zero
/// temperature, so identical questions extract identically (up to model
/// nondeterminism).
fn build_request_body(model: &str, question: &str, today: NaiveDate) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt(today) },
            { "role": "user", "content": question }
        ],
        "tools": [tool_definition()],
        "tool_choice": { "type": "function", "function": { "name": FUNCTION_NAME } },
        "temperature": 0
    })
}

fn system_prompt(today: NaiveDate) -> String {
    format!(
        "You are a parameter extractor for video analytics. Today is {today}.\n\
         Map user questions to the '{FUNCTION_NAME}' function.\n\
         \n\
         RULES:\n\
         1. 'How many videos total?' -> intent='TOTAL_STATIC', table='videos', field='id'\n\
         2. 'How much did views grow?' -> intent='GROWTH_DYNAMIC', table='video_snapshots', \
         field='delta_views_count'\n\
         3. 'How many DIFFERENT videos got views?' -> intent='UNIQUE_ACTIVE', \
         table='video_snapshots', field='delta_views_count'\n\
         4. For dates like 'November 28' without a year, extract '{year}-11-28'.\n\
         5. Always provide intent, target_table, and metric_field.",
        today = today.format("%Y-%m-%d"),
        year = today.year(),
    )
}

fn tool_definition() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": FUNCTION_NAME,
            "description": "Extract parameters to build a SQL query for video analytics.",
            "parameters": {
                "type": "object",
                "properties": {
                    "intent": {
                        "type": "string",
                        "enum": ["TOTAL_STATIC", "GROWTH_DYNAMIC", "UNIQUE_ACTIVE"],
                        "description": "TOTAL_STATIC for 'How many videos total'. \
                            GROWTH_DYNAMIC for 'How many views added/grew'. \
                            UNIQUE_ACTIVE for 'How many DIFFERENT videos got views'."
                    },
                    "target_table": {
                        "type": "string",
                        "enum": ["videos", "video_snapshots"],
                        "description": "Use 'videos' for static totals. \
                            Use 'video_snapshots' for growth/deltas."
                    },
                    "metric_field": {
                        "type": "string",
                        "enum": [
                            "id", "views_count", "likes_count",
                            "delta_views_count", "delta_likes_count", "delta_comments_count"
                        ],
                        "description": "The database column to measure. For growth, use delta_*."
                    },
                    "date_exact": {
                        "type": "string",
                        "format": "date",
                        "description": "YYYY-MM-DD for single day queries."
                    },
                    "date_from": {
                        "type": "string",
                        "format": "date",
                        "description": "Start date YYYY-MM-DD (inclusive)."
                    },
                    "date_to": {
                        "type": "string",
                        "format": "date",
                        "description": "End date YYYY-MM-DD (inclusive)."
                    },
                    "creator_id": {
                        "type": "string",
                        "description": "UUID of the creator if specified."
                    }
                },
                "required": ["intent", "target_table", "metric_field"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

/// Provider error body, as far as we trust it: a machine-readable code.
#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    code: Option<String>,
}

/// Classify a non-success response by status code and, failing that, the
/// machine-readable error code in the body. Message wording is never
/// inspected.
fn classify_failure(status: StatusCode, body: &str) -> VidqlError {
    match status.as_u16() {
        429 => VidqlError::Throttled,
        402 => VidqlError::ServiceUnavailable,
        _ => {
            if let Ok(provider) = serde_json::from_str::<ProviderError>(body) {
                match provider.error.code.as_deref() {
                    Some("rate_limit_exceeded") => return VidqlError::Throttled,
                    Some("insufficient_quota") => return VidqlError::ServiceUnavailable,
                    _ => {}
                }
            }
            VidqlError::Generic(format!("reasoning service returned {}", status))
        }
    }
}

fn parse_tool_arguments(response: &ChatResponse) -> VidqlResult<RawParameters> {
    let call = response
        .choices
        .first()
        .and_then(|choice| choice.message.tool_calls.first())
        .ok_or_else(|| VidqlError::Extraction("response contains no tool call".to_string()))?;

    serde_json::from_str(&call.function.arguments)
        .map_err(|e| VidqlError::Extraction(format!("malformed tool arguments: {}", e)))
}
