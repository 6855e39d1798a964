//! LLM collaborator seam and an OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::complexity::QueryComplexity;
use crate::error::LlmError;

/// Default LiteLLM proxy path (when using `litellm --port 4000`).
pub const LITELLM_DEFAULT_URL: &str = "http://127.0.0.1:4000/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// One completed generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    /// Answer text.
    pub text: String,
    /// Model that produced it.
    pub model_name: String,
    /// Prompt tokens billed.
    pub input_tokens: u32,
    /// Completion tokens billed.
    pub output_tokens: u32,
    /// Cost in USD.
    pub cost: f64,
}

/// Text generation collaborator.
#[async_trait]
pub trait LlmGenerator: Send + Sync {
    /// Generate a completion for `prompt`; `complexity` selects the model tier.
    async fn generate(
        &self,
        prompt: &str,
        complexity: QueryComplexity,
        max_tokens: u32,
    ) -> Result<Generation, LlmError>;
}

/// Model name plus per-million-token prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTier {
    /// Model name sent to the endpoint.
    pub model: String,
    /// USD per million prompt tokens.
    #[serde(default)]
    pub input_price_per_mtok: f64,
    /// USD per million completion tokens.
    #[serde(default)]
    pub output_price_per_mtok: f64,
}

impl ModelTier {
    /// Tier with zero prices.
    #[must_use]
    pub fn unpriced(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input_price_per_mtok: 0.0,
            output_price_per_mtok: 0.0,
        }
    }

    /// Cost in USD for the given token counts.
    #[must_use]
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (f64::from(input_tokens) * self.input_price_per_mtok
            + f64::from(output_tokens) * self.output_price_per_mtok)
            / 1_000_000.0
    }
}

/// Endpoint and model routing for [`ChatCompletionClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct LlmClientConfig {
    /// Full chat completions URL.
    pub inference_url: String,
    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Model for simple questions.
    pub simple: ModelTier,
    /// Model for moderate questions.
    pub moderate: ModelTier,
    /// Model for complex questions.
    pub complex: ModelTier,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            inference_url: LITELLM_DEFAULT_URL.to_string(),
            api_key: None,
            simple: ModelTier::unpriced(DEFAULT_MODEL),
            moderate: ModelTier::unpriced(DEFAULT_MODEL),
            complex: ModelTier::unpriced(DEFAULT_MODEL),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl LlmClientConfig {
    /// Resolve from the environment.
    ///
    /// - `LEXGRAPH_LLM_URL` (falls back to `LITELLM_PROXY_URL`, then the LiteLLM default)
    /// - `LEXGRAPH_LLM_MODEL` for every tier, `LEXGRAPH_LLM_MODEL_COMPLEX` for complex questions
    /// - `OPENAI_API_KEY`, not sent to local endpoints
    #[must_use]
    pub fn from_env() -> Self {
        let inference_url = non_empty_env("LEXGRAPH_LLM_URL")
            .or_else(|| non_empty_env("LITELLM_PROXY_URL"))
            .map_or_else(|| LITELLM_DEFAULT_URL.to_string(), |url| chat_url(&url));
        let model = non_empty_env("LEXGRAPH_LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let complex_model = non_empty_env("LEXGRAPH_LLM_MODEL_COMPLEX").unwrap_or_else(|| model.clone());
        let api_key = if is_local(&inference_url) {
            None
        } else {
            non_empty_env("OPENAI_API_KEY")
        };
        Self {
            inference_url,
            api_key,
            simple: ModelTier::unpriced(model.clone()),
            moderate: ModelTier::unpriced(model),
            complex: ModelTier::unpriced(complex_model),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Tier serving `complexity`.
    #[must_use]
    pub fn tier(&self, complexity: QueryComplexity) -> &ModelTier {
        match complexity {
            QueryComplexity::Simple => &self.simple,
            QueryComplexity::Moderate => &self.moderate,
            QueryComplexity::Complex => &self.complex,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_local(url: &str) -> bool {
    url.contains("127.0.0.1") || url.contains("localhost")
}

/// Append `/v1/chat/completions` unless already present.
fn chat_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/v1/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/v1/chat/completions")
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Parsed completion: text, reported model, prompt and completion tokens.
fn parse_completion(body: &str) -> Result<(String, Option<String>, u32, u32), LlmError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Response(format!("parse error: {e}; body: {body}")))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Response("response has no choices".to_string()))?;
    let usage = parsed.usage.unwrap_or_default();
    Ok((
        choice.message.content.unwrap_or_default(),
        parsed.model,
        usage.prompt_tokens,
        usage.completion_tokens,
    ))
}

/// HTTP client for OpenAI-compatible chat completions.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    config: LlmClientConfig,
}

impl ChatCompletionClient {
    /// Client over `config`.
    #[must_use]
    pub fn new(config: LlmClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Routing configuration.
    #[must_use]
    pub fn config(&self) -> &LlmClientConfig {
        &self.config
    }
}

fn transport_error(error: &reqwest::Error) -> LlmError {
    if error.is_connect() || error.is_timeout() {
        LlmError::Unavailable(error.to_string())
    } else {
        LlmError::Request(error.to_string())
    }
}

#[async_trait]
impl LlmGenerator for ChatCompletionClient {
    async fn generate(
        &self,
        prompt: &str,
        complexity: QueryComplexity,
        max_tokens: u32,
    ) -> Result<Generation, LlmError> {
        let tier = self.config.tier(complexity);
        let body = ChatCompletionRequest {
            model: &tier.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: 0.0,
        };
        let mut req = self
            .client
            .post(&self.config.inference_url)
            .timeout(self.config.request_timeout)
            .json(&body);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }
        tracing::debug!(
            event = "workflow.llm.request",
            model = %tier.model,
            complexity = %complexity,
            max_tokens,
            "sending chat completion"
        );
        let res = req.send().await.map_err(|e| transport_error(&e))?;
        let status = res.status();
        let text = res.text().await.map_err(|e| transport_error(&e))?;
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::Unavailable(format!("LLM API error {status}: {text}")));
        }
        if !status.is_success() {
            return Err(LlmError::Request(format!("LLM API error {status}: {text}")));
        }
        let (text, reported_model, input_tokens, output_tokens) = parse_completion(&text)?;
        Ok(Generation {
            text,
            model_name: reported_model.unwrap_or_else(|| tier.model.clone()),
            input_tokens,
            output_tokens,
            cost: tier.cost(input_tokens, output_tokens),
        })
    }
}
