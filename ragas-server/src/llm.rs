// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Judge LLM selection

use crate::config::LLMConfig;
use ragas_evals::llm_client::{LLMClient, OllamaClient, OpenAIClient};
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces a fresh judge client for each evaluation
pub type LlmFactory = Arc<dyn Fn() -> Arc<dyn LLMClient> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Ollama,
}

impl LlmProvider {
    /// Anything other than "openai" means the local server
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("openai") {
            LlmProvider::OpenAI
        } else {
            LlmProvider::Ollama
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Ollama => "ollama",
        }
    }
}

impl LLMConfig {
    fn openai_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Provider that [`select_llm`] actually resolves to
    pub fn effective_provider(&self) -> LlmProvider {
        match LlmProvider::parse(&self.provider) {
            LlmProvider::OpenAI if self.openai_key().is_some() => LlmProvider::OpenAI,
            _ => LlmProvider::Ollama,
        }
    }

    /// Model name of the effective provider
    pub fn effective_model(&self) -> &str {
        match self.effective_provider() {
            LlmProvider::OpenAI => &self.openai_model,
            LlmProvider::Ollama => &self.ollama_model,
        }
    }

    /// Whether "openai" was requested but cannot be honoured
    pub fn falls_back_to_ollama(&self) -> bool {
        LlmProvider::parse(&self.provider) == LlmProvider::OpenAI && self.openai_key().is_none()
    }
}

/// Build the judge client for the configured provider
pub fn select_llm(config: &LLMConfig) -> Arc<dyn LLMClient> {
    if config.falls_back_to_ollama() {
        warn!(
            model = %config.ollama_model,
            "RAGAS_LLM_PROVIDER=openai but OPENAI_API_KEY is not set, falling back to Ollama"
        );
    }

    match (config.effective_provider(), config.openai_key()) {
        (LlmProvider::OpenAI, Some(key)) => {
            debug!(model = %config.openai_model, "Using OpenAI judge");
            Arc::new(
                OpenAIClient::new(key.to_string(), config.openai_model.clone())
                    .with_base_url(config.openai_base_url.clone()),
            )
        }
        _ => {
            debug!(
                model = %config.ollama_model,
                base_url = %config.ollama_base_url,
                "Using Ollama judge"
            );
            Arc::new(OllamaClient::new(
                config.ollama_base_url.clone(),
                config.ollama_model.clone(),
            ))
        }
    }
}

/// Factory that resolves the judge from `config` on every call
pub fn llm_factory(config: LLMConfig) -> LlmFactory {
    Arc::new(move || select_llm(&config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ollama() {
        let config = LLMConfig::default();
        let llm = select_llm(&config);
        assert_eq!(llm.provider(), "ollama");
        assert_eq!(llm.model_name(), "llama3.2");
        assert_eq!(config.effective_model(), "llama3.2");
    }

    #[test]
    fn test_openai_with_key() {
        let config = LLMConfig {
            provider: "openai".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let llm = select_llm(&config);
        assert_eq!(llm.provider(), "openai");
        assert_eq!(llm.model_name(), "gpt-4o-mini");
        assert!(!config.falls_back_to_ollama());
    }

    #[test]
    fn test_openai_without_key_falls_back() {
        for key in [None, Some("  ".to_string())] {
            let config = LLMConfig {
                provider: "openai".to_string(),
                openai_api_key: key,
                ..Default::default()
            };
            assert!(config.falls_back_to_ollama());
            assert_eq!(config.effective_provider(), LlmProvider::Ollama);
            assert_eq!(select_llm(&config).provider(), "ollama");
        }
    }

    #[test]
    fn test_unknown_provider_is_ollama() {
        assert_eq!(LlmProvider::parse("anthropic"), LlmProvider::Ollama);
        assert_eq!(LlmProvider::parse("OpenAI"), LlmProvider::OpenAI);
    }

    #[test]
    fn test_factory_builds_fresh_clients() {
        let factory = llm_factory(LLMConfig::default());
        let a = factory();
        let b = factory();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
