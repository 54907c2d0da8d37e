//! The `invoke-model` kind and the completion service it delegates to.
//!
//! Transport, authentication and retry policy belong to the host. The
//! handler only renders a prompt and awaits whatever service was injected.

use super::{Arity, NodeHandler};
use crate::error::HandlerError;
use crate::workflow::{Config, Value};
use futures::future::{self, BoxFuture};
use itertools::Itertools;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: usize = 2000;

/// A fully rendered request for the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl CompletionRequest {
    /// Builds a request from a node config and the joined inbound text.
    ///
    /// `prompt` (or `user_prompt`) is a template where `{{input}}` and
    /// `{input}` are replaced by the input. The default template is the input.
    pub fn from_config(config: &Config, input: &str) -> Self {
        let template = config
            .get_str("prompt")
            .or_else(|| config.get_str("user_prompt"))
            .unwrap_or("{{input}}");
        Self {
            prompt: render_prompt(template, input),
            system_prompt: config
                .get_str("system_prompt")
                .unwrap_or(DEFAULT_SYSTEM_PROMPT)
                .to_string(),
            model: config.get_str("model").unwrap_or(DEFAULT_MODEL).to_string(),
            temperature: config.get_f64("temperature").unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: config.get_usize("max_tokens").unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

/// Substitutes `input` for every `{{input}}` and `{input}` placeholder. Only the
/// template is scanned, so placeholders inside `input` stay literal.
fn render_prompt(template: &str, input: &str) -> String {
    template
        .split("{{input}}")
        .map(|part| part.replace("{input}", input))
        .join(input)
}

/// External text-completion collaborator supplied by the host application.
pub trait CompletionService: Send + Sync {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, HandlerError>>;
}

/// A service that answers with the prompt itself, optionally prefixed.
/// Useful for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct EchoService {
    pub prefix: String,
}

impl EchoService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl CompletionService for EchoService {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, HandlerError>> {
        Box::pin(future::ready(Ok(format!("{}{}", self.prefix, request.prompt))))
    }
}

/// Handler for the `invoke-model` kind.
pub struct InvokeModelHandler {
    service: Arc<dyn CompletionService>,
}

impl InvokeModelHandler {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }
}

impl NodeHandler for InvokeModelHandler {
    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        if let Some(t) = config.get_f64("temperature") {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("'temperature' must be within 0.0..=2.0, found {}", t));
            }
        }
        if config.contains_key("max_tokens") && config.get_usize("max_tokens").is_none_or(|n| n == 0) {
            return Err("'max_tokens' must be a positive integer".to_string());
        }
        Ok(())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let input = inbound.iter().map(Value::to_text).join("\n");
            let request = CompletionRequest::from_config(config, &input);
            debug!(model = %request.model, prompt_len = request.prompt.len(), "Invoking completion service");
            let text = self.service.complete(request).await?;
            Ok(Value::Text(text))
        })
    }
}
