use anyhow::{Result, anyhow};
use std::future::Future;
use std::pin::Pin;

mod openai;
pub(crate) mod retry;
mod stability;

pub use openai::OpenAI;
pub use stability::Stability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Stability,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Stability => "stability",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSelection {
    pub provider: ProviderKind,
    pub requested_model: Option<String>,
}

/// One generated background image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub model: String,
}

pub type GenerateFuture = Pin<Box<dyn Future<Output = Result<GeneratedImage>> + Send>>;

pub trait ImageProvider: Send + Sync {
    fn generate(&self, prompt: String, width: u32, height: u32) -> GenerateFuture;
}

#[derive(Debug, Clone)]
pub enum ProviderImpl {
    OpenAI(OpenAI),
    Stability(Stability),
}

impl ImageProvider for ProviderImpl {
    fn generate(&self, prompt: String, width: u32, height: u32) -> GenerateFuture {
        match self {
            ProviderImpl::OpenAI(provider) => provider.generate(prompt, width, height),
            ProviderImpl::Stability(provider) => provider.generate(prompt, width, height),
        }
    }
}

pub fn build_provider(provider: ProviderKind, key: String, model: Option<String>) -> ProviderImpl {
    match provider {
        ProviderKind::OpenAI => {
            let mut built = OpenAI::new(key);
            if let Some(model) = model {
                built = built.with_model(model);
            }
            ProviderImpl::OpenAI(built)
        }
        ProviderKind::Stability => {
            let mut built = Stability::new(key);
            if let Some(model) = model {
                built = built.with_engine(model);
            }
            ProviderImpl::Stability(built)
        }
    }
}

/// Resolve which provider to use from an optional `provider:model` argument,
/// falling back to whichever API key is present in the environment.
pub fn resolve_provider_selection(
    model_arg: Option<&str>,
    override_key: Option<&str>,
) -> Result<ProviderSelection> {
    match model_arg {
        Some(model) => parse_model_arg(model),
        None => default_provider_selection(override_key),
    }
}

pub fn resolve_key(provider: ProviderKind, override_key: Option<&str>) -> Result<String> {
    if let Some(key) = override_key {
        return Ok(key.to_string());
    }

    match provider {
        ProviderKind::OpenAI => get_env("OPENAI_API_KEY"),
        ProviderKind::Stability => get_env("STABILITY_API_KEY"),
    }
    .ok_or_else(|| anyhow!("API key not found for provider {}", provider.as_str()))
}

fn default_provider_selection(override_key: Option<&str>) -> Result<ProviderSelection> {
    if get_env("OPENAI_API_KEY").is_some() {
        return Ok(ProviderSelection {
            provider: ProviderKind::OpenAI,
            requested_model: None,
        });
    }

    if get_env("STABILITY_API_KEY").is_some() {
        return Ok(ProviderSelection {
            provider: ProviderKind::Stability,
            requested_model: None,
        });
    }

    if override_key.is_some() {
        return Ok(ProviderSelection {
            provider: ProviderKind::OpenAI,
            requested_model: None,
        });
    }

    Err(anyhow!(
        "no API keys found (checked OPENAI_API_KEY, STABILITY_API_KEY)"
    ))
}

fn parse_model_arg(model_arg: &str) -> Result<ProviderSelection> {
    let raw = model_arg.trim();
    if raw.is_empty() {
        return Err(anyhow!("provider argument is empty"));
    }

    let lower = raw.to_lowercase();
    if let Some(provider) = provider_from_name(&lower) {
        return Ok(ProviderSelection {
            provider,
            requested_model: None,
        });
    }

    if let Some((provider, model)) = parse_provider_model_pair(raw) {
        return Ok(ProviderSelection {
            provider,
            requested_model: model,
        });
    }

    Err(anyhow!(
        "unable to infer provider from '{}'. Use provider:model (openai:, stability:)",
        raw
    ))
}

fn parse_provider_model_pair(input: &str) -> Option<(ProviderKind, Option<String>)> {
    let (provider_part, model_part) = input.split_once(':')?;
    let provider = provider_from_name(&provider_part.to_lowercase())?;
    let model = if model_part.trim().is_empty() {
        None
    } else {
        Some(model_part.trim().to_string())
    };
    Some((provider, model))
}

fn provider_from_name(name: &str) -> Option<ProviderKind> {
    match name {
        "openai" => Some(ProviderKind::OpenAI),
        "stability" | "stabilityai" => Some(ProviderKind::Stability),
        _ => None,
    }
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_model_pair_parses() {
        let selection = resolve_provider_selection(Some("openai:gpt-image-1"), None).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);
        assert_eq!(selection.requested_model.as_deref(), Some("gpt-image-1"));
    }

    #[test]
    fn bare_provider_name_parses() {
        let selection = resolve_provider_selection(Some("stability"), None).unwrap();
        assert_eq!(selection.provider, ProviderKind::Stability);
        assert!(selection.requested_model.is_none());
    }

    #[test]
    fn provider_with_empty_model_part() {
        let selection = resolve_provider_selection(Some("openai:"), None).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);
        assert!(selection.requested_model.is_none());
    }

    #[test]
    fn unknown_provider_fails() {
        let err = resolve_provider_selection(Some("dalle"), None).unwrap_err();
        assert!(err.to_string().contains("unable to infer provider"));
    }

    #[test]
    fn override_key_is_used_verbatim() {
        let key = resolve_key(ProviderKind::OpenAI, Some("sk-test")).unwrap();
        assert_eq!(key, "sk-test");
    }
}
