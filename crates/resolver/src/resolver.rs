//! The response resolver: knowledge lookup, then delegation, then fallback.

use crate::context::{ContextAssembler, HistoryWindow};
use crate::fallback::render_fallback;
use digibuddy_config::{AppConfig, DEFAULT_SYSTEM_PROMPT, ResolverConfig};
use digibuddy_core::error::KnowledgeError;
use digibuddy_core::knowledge::KnowledgeBase;
use digibuddy_core::message::Turn;
use digibuddy_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Exact,
    Fuzzy,
    Model,
    Fallback,
}

/// The outcome of one resolution. Always carries a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub text: String,

    /// `true` only when the reply is the fallback text.
    pub degraded: bool,

    pub source: ResolutionSource,

    /// Provider error detail, present only on the degraded path.
    pub error: Option<String>,
}

impl ResolutionResult {
    fn answered(text: impl Into<String>, source: ResolutionSource) -> Self {
        Self {
            text: text.into(),
            degraded: false,
            source,
            error: None,
        }
    }

    fn degraded(text: impl Into<String>, error: String) -> Self {
        Self {
            text: text.into(),
            degraded: true,
            source: ResolutionSource::Fallback,
            error: Some(error),
        }
    }
}

/// Resolves user messages to replies.
///
/// Holds only immutable state, so one instance is shared by all requests.
pub struct ResponseResolver {
    knowledge: Arc<KnowledgeBase>,
    provider: Arc<dyn Provider>,
    assembler: ContextAssembler,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    fallback: String,
}

impl ResponseResolver {
    /// Create a resolver with the default persona, temperature 0.7 and no
    /// output-length ceiling.
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        let fallback = render_fallback(&knowledge);
        Self {
            knowledge,
            provider,
            assembler: ContextAssembler::new(DEFAULT_SYSTEM_PROMPT),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            fallback,
        }
    }

    /// Create a resolver with every generation and resolver setting taken
    /// from `config`.
    pub fn from_config(
        config: &AppConfig,
        knowledge: Arc<KnowledgeBase>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        let mut resolver = Self::new(knowledge, provider, &config.model)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_system_prompt(&config.resolver.system_prompt)
            .with_history_window(HistoryWindow::from_limit(config.resolver.history_limit));
        if let Some(message) = &config.resolver.fallback_message {
            resolver = resolver.with_fallback_message(message);
        }
        resolver
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.assembler = ContextAssembler::new(prompt).with_window(self.assembler.window());
        self
    }

    pub fn with_history_window(mut self, window: HistoryWindow) -> Self {
        self.assembler = self.assembler.with_window(window);
        self
    }

    /// Replace the generated fallback reply.
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback = message.into();
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The provider request a delegation of `message` would send.
    pub fn delegation_request(&self, message: &str, history: &[Turn]) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: self.assembler.assemble(message, history),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Resolve one message. Never fails.
    pub async fn resolve(&self, message: &str, history: &[Turn]) -> ResolutionResult {
        if let Some(answer) = self.knowledge.exact_match(message) {
            info!(source = "exact", "Answered from knowledge base");
            return ResolutionResult::answered(answer, ResolutionSource::Exact);
        }

        if let Some(answer) = self.knowledge.fuzzy_match(message) {
            info!(source = "fuzzy", "Answered from knowledge base");
            return ResolutionResult::answered(answer, ResolutionSource::Fuzzy);
        }

        let request = self.delegation_request(message, history);
        debug!(
            provider = %self.provider.name(),
            model = %request.model,
            history = history.len(),
            messages = request.messages.len(),
            "Delegating to model"
        );

        match self.provider.complete(request).await {
            Ok(response) => {
                info!(source = "model", model = %response.model, "Answered by model");
                ResolutionResult::answered(response.message.content, ResolutionSource::Model)
            }
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Model delegation failed, using fallback");
                ResolutionResult::degraded(self.fallback.clone(), e.to_string())
            }
        }
    }
}

/// Load the knowledge base named by the resolver settings, or the built-in
/// one when no file is configured.
pub fn load_knowledge(config: &ResolverConfig) -> Result<KnowledgeBase, KnowledgeError> {
    match &config.knowledge_file {
        Some(path) => KnowledgeBase::load_from(path),
        None => Ok(KnowledgeBase::builtin()),
    }
}
