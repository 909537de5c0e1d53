use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{Config, Endpoint, RequestParams};
use crate::error::TranslateError;
use crate::prompt::ChatMessage;
use crate::sanitize::strip_reasoning;

const ERROR_BODY_LIMIT: usize = 300;

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
    tool_choice: &'a str,
    enable_thinking: bool,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Anything that can turn a chat transcript into a cleaned reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<String, TranslateError>;
}

/// Single-attempt client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct TranslationClient {
    http: reqwest::Client,
    endpoint: Endpoint,
    params: RequestParams,
}

impl TranslationClient {
    pub fn new(
        endpoint: Endpoint,
        params: RequestParams,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, endpoint, params })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, TranslateError> {
        Self::new(cfg.endpoint()?, cfg.request_body.clone(), cfg.request_timeout())
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Request body as sent on the wire. Extra flags never override the core fields.
    pub fn build_body(&self, messages: &[ChatMessage]) -> Result<Value, TranslateError> {
        let req = ChatRequest {
            model: self.endpoint.model.as_deref(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            stream: false,
            tool_choice: &self.params.tool_choice,
            enable_thinking: self.params.enable_thinking,
            messages,
        };
        let mut body = serde_json::to_value(&req).map_err(|e| {
            TranslateError::Protocol(format!("failed to encode request body: {}", e))
        })?;
        if let Value::Object(map) = &mut body {
            for (key, value) in &self.params.extra {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Ok(body)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Pulls the first choice's content out of a response body and cleans it.
pub fn parse_reply(body: &[u8]) -> Result<String, TranslateError> {
    let parsed: ChatResponse =
        serde_json::from_slice(body).map_err(|e| TranslateError::Protocol(e.to_string()))?;
    let raw = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(TranslateError::EmptyResponse)?;
    let cleaned = strip_reasoning(&raw);
    if cleaned.is_empty() {
        return Err(TranslateError::EmptyResponse);
    }
    Ok(cleaned)
}

#[async_trait]
impl ChatBackend for TranslationClient {
    async fn send(&self, messages: &[ChatMessage]) -> Result<String, TranslateError> {
        let body = self.build_body(messages)?;
        info!(
            "POST {} ({} messages, model {:?})",
            self.endpoint.url,
            messages.len(),
            self.endpoint.model
        );

        let mut req = self.http.post(self.endpoint.url.clone()).json(&body);
        if let Some(key) = self.endpoint.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            error!("Chat completions request failed: {}", e);
            TranslateError::from(e)
        })?;

        let status = resp.status();
        debug!("Chat completions status {}", status);
        if status != reqwest::StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            error!("Chat completions error {}: {}", status, excerpt(&text));
            return Err(TranslateError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        let bytes = resp.bytes().await.map_err(TranslateError::from)?;
        parse_reply(&bytes)
    }
}
