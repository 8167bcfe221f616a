//! Provider construction from configuration.

use crate::openai_compat::{DEFAULT_TIMEOUT, OpenAiCompatProvider};
use digibuddy_config::AppConfig;
use digibuddy_core::error::ProviderError;
use digibuddy_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the provider named by `config.provider`.
///
/// The per-provider section (`[providers.<name>]`) supplies the key, URL and
/// timeout; the top-level `api_key` is used when the section has none. A
/// missing key is not an error here: the first request fails instead and the
/// resolver answers with its fallback reply.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let section = config.providers.get(name);

    let api_key = section
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    let base_url = match section.and_then(|p| p.api_url.clone()) {
        Some(url) => url,
        None => default_base_url(name)?,
    };

    let timeout = section
        .and_then(|p| p.timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    if api_key.is_empty() && name != "ollama" {
        tracing::warn!(provider = %name, "No API key configured; model delegation will fall back");
    }

    let provider = OpenAiCompatProvider::new(name, base_url, api_key, timeout)?;
    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Result<String, ProviderError> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "Unknown provider '{other}'; set providers.{other}.api_url"
            )));
        }
    };
    Ok(url.into())
}
