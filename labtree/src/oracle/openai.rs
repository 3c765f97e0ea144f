//! OpenAI-compatible Chat Completions implementation of `ExpansionOracle`.
//!
//! Requires `OPENAI_API_KEY` (or explicit config; `OPENAI_BASE_URL` selects a
//! compatible endpoint). Structured suggestions are requested in json-object
//! mode and parsed leniently: code fences are stripped and the expansion
//! payload is accepted either as a bare array or as `{"children": [...]}`.
//!
//! Rate limits (429/quota) are retried here with exponential backoff plus
//! jitter; the engine never sees a transient failure unless the retry budget
//! is exhausted.

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};

use crate::error::OracleError;
use crate::prompts;
use crate::tree::EquipmentNode;

use super::{CandidateNode, ExpansionOracle, RetryPolicy};

/// Chat Completions oracle client.
///
/// **Interaction**: implements `ExpansionOracle`; constructed by the CLI and
/// handed to `ExpansionEngine` as `Arc<dyn ExpansionOracle>`.
pub struct OpenAiOracle {
    client: Client<OpenAIConfig>,
    model: String,
    retry: RetryPolicy,
    jitter: std::time::Duration,
    temperature: Option<f32>,
}

impl OpenAiOracle {
    /// Build with default config (API key and base URL from the environment).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            retry: RetryPolicy::default(),
            jitter: std::time::Duration::from_secs(1),
            temperature: None,
        }
    }

    /// Build with explicit config (custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            retry: RetryPolicy::default(),
            jitter: std::time::Duration::from_secs(1),
            temperature: None,
        }
    }

    /// Set the rate-limit retry policy (builder).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set temperature (builder). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// One completion with the retry loop around it.
    async fn complete(&self, prompt: String, json: bool) -> Result<String, OracleError> {
        let mut attempt = 0usize;
        loop {
            match self.try_complete(&prompt, json).await {
                Ok(text) => return Ok(text),
                Err(message) if is_rate_limit(&message) => {
                    if !self.retry.should_retry(attempt) {
                        return Err(OracleError::RateLimited {
                            attempts: attempt + 1,
                            message,
                        });
                    }
                    let delay = self.retry.jittered_delay(attempt, self.jitter);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "oracle rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(message) => return Err(OracleError::GenerationFailed(message)),
            }
        }
    }

    /// One raw completion attempt; errors come back as display strings so the
    /// retry loop can classify them.
    async fn try_complete(&self, prompt: &str, json: bool) -> Result<String, String> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                prompts::SYSTEM_INSTRUCTION,
            )),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(prompt)),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(messages);
        if json {
            args.response_format(ResponseFormat::JsonObject);
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args
            .build()
            .map_err(|e| format!("request build failed: {e}"))?;

        debug!(model = %self.model, json, prompt_len = prompt.len(), "oracle chat create");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "model returned no choices".to_string())?;
        let content = choice.message.content.unwrap_or_default();
        trace!(content = %content, "oracle response body");
        Ok(content)
    }
}

/// Quota-style failures as surfaced by OpenAI-compatible endpoints.
fn is_rate_limit(message: &str) -> bool {
    message.contains("429") || message.to_lowercase().contains("quota")
}

/// Strips a surrounding markdown code fence, if any; models add them even
/// when told not to.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") up to the first newline.
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Expansion payload: accepted as `{"children": [...]}` (json-object mode)
/// or as a bare array (models ignore shape instructions often enough).
fn parse_children(raw: &str) -> Option<Vec<CandidateNode>> {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        children: Vec<CandidateNode>,
    }

    let raw = strip_code_fences(raw);
    if let Ok(list) = serde_json::from_str::<Vec<CandidateNode>>(raw) {
        return Some(list);
    }
    serde_json::from_str::<Wrapper>(raw).ok().map(|w| w.children)
}

#[async_trait]
impl ExpansionOracle for OpenAiOracle {
    async fn analyze_initial_problem(&self, problem: &str) -> Result<CandidateNode, OracleError> {
        let content = self.complete(prompts::initial_prompt(problem), true).await?;
        serde_json::from_str::<CandidateNode>(strip_code_fences(&content)).map_err(|e| {
            OracleError::GenerationFailed(format!("unparseable initial analysis: {e}"))
        })
    }

    async fn expand_children(
        &self,
        node: &EquipmentNode,
        known_names: &[String],
    ) -> Result<Vec<CandidateNode>, OracleError> {
        let content = self
            .complete(prompts::expand_prompt(node, known_names), true)
            .await?;
        // Unusable content merges as an empty expansion, indistinguishable
        // from a true leaf (observed contract of the original service).
        match parse_children(&content) {
            Some(children) => Ok(children),
            None => {
                warn!(node = %node.name, "unparseable expansion payload, treating as leaf");
                Ok(Vec::new())
            }
        }
    }

    async fn generate_urs(&self, tree: &serde_json::Value) -> Result<String, OracleError> {
        let project = tree
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("Lab Automation System");
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        self.complete(prompts::urs_prompt(project, &date, tree), false)
            .await
    }
}
