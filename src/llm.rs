//! Completion provider abstraction and implementations.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ModelConfig;
use crate::error::{RelayError, Result};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One call to a completion provider: the model to use and the serialized
/// transcript it should continue.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub payload: &'a str,
}

/// Stateless-per-call service returning the next assistant turn.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;
}

fn coalesce_error(status: reqwest::StatusCode, body: &str, provider: &str) -> RelayError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return RelayError::ProviderUnavailable(format!("{provider} rate limit exceeded: {body}"));
    }
    RelayError::ProviderUnavailable(format!("{provider} request failed with {status}: {body}"))
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RelayError::Config("missing Gemini API key in model config".into()))?;
        let endpoint = cfg
            .endpoint
            .clone()
            .unwrap_or_else(|| GEMINI_ENDPOINT.to_string());
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(cfg.timeout())
                .build()
                .map_err(|err| RelayError::Config(format!("http client error: {err}")))?,
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            temperature: cfg.temperature,
        })
    }

    fn body(&self, payload: &str) -> serde_json::Value {
        let contents = vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: Some(payload.to_string()),
            }],
        }];
        match self.temperature {
            Some(temperature) => json!({
                "contents": contents,
                "generationConfig": { "temperature": temperature },
            }),
            None => json!({ "contents": contents }),
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let resp = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.endpoint, request.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&self.body(request.payload))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    RelayError::ProviderUnavailable(format!("Gemini request timed out: {err}"))
                } else {
                    RelayError::ProviderUnavailable(format!("Gemini request error: {err}"))
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(coalesce_error(status, &body, "gemini"));
        }

        let parsed: GeminiResponse = resp.json().await.map_err(|err| {
            RelayError::ProviderMalformedResponse(format!("Gemini response parse error: {err}"))
        })?;

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            RelayError::ProviderMalformedResponse("Gemini response has no candidates".into())
        })?;
        let texts: Vec<String> = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if texts.is_empty() {
            return Err(RelayError::ProviderMalformedResponse(
                "Gemini candidate carries no text".into(),
            ));
        }
        Ok(texts.concat())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A request as seen by [`StubProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub model: String,
    pub payload: String,
}

/// A deterministic provider used for tests and demos.
pub struct StubProvider {
    script: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl StubProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Replies (or failures) returned in order, one per call.
    pub fn scripted(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("stub provider poisoned").clone()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.requests
            .lock()
            .expect("stub provider poisoned")
            .push(RecordedRequest {
                model: request.model.to_string(),
                payload: request.payload.to_string(),
            });
        let next = self
            .script
            .lock()
            .expect("stub provider poisoned")
            .pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        next.unwrap_or_else(|| {
            Err(RelayError::ProviderUnavailable(
                "StubProvider ran out of scripted responses".into(),
            ))
        })
    }
}
