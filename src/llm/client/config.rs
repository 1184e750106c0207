//! LLM client configuration.

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GROQ_API_KEY", "DOCWASH_API_KEY"];

/// Configuration for the chat-completion client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use for rewriting
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature; the provider default is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// API key. Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `GROQ_API_KEY` or `DOCWASH_API_KEY`: bearer credential
    /// - `DOCWASH_LLM_ENDPOINT`: API endpoint
    /// - `DOCWASH_LLM_MODEL`: Model name
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|key| !key.trim().is_empty())
        {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = lookup("DOCWASH_LLM_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(model) = lookup("DOCWASH_LLM_MODEL") {
            self.model = model;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// URL of the chat completions resource.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// URL of the model listing resource.
    pub fn models_url(&self) -> String {
        format!("{}/models", self.endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.endpoint, "https://api.groq.com/openai/v1");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.timeout_secs, 300);
        assert!(config.temperature.is_none());
        assert!(!config.has_api_key());
        assert_eq!(
            config.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = LlmConfig::default().with_overrides_from(lookup(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("DOCWASH_LLM_ENDPOINT", "http://localhost:8080/v1/"),
            ("DOCWASH_LLM_MODEL", "tiny"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.model, "tiny");
        assert_eq!(config.models_url(), "http://localhost:8080/v1/models");
    }

    #[test]
    fn test_fallback_api_key_var() {
        let config = LlmConfig::default()
            .with_overrides_from(lookup(&[("GROQ_API_KEY", " "), ("DOCWASH_API_KEY", "dw")]));
        assert_eq!(config.api_key.as_deref(), Some("dw"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = LlmConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
