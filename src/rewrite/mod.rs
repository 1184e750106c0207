//! AI rewrite of extracted text.
//!
//! A baseline rewrite turns raw extracted text into formal prose; later
//! rewrites apply a free-text instruction to the current content. Replies are
//! cleaned of marker characters before anyone sees them.

pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::llm::{LlmClient, LlmError};
use prompts::{render, DEFAULT_INSTRUCTION_PROMPT, DEFAULT_SYSTEM_PROMPT};

/// Something that can answer a system + user exchange.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl Rewriter for LlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.chat(system, user).await
    }
}

/// Rewrite configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Characters removed from every model reply and before export
    #[serde(default = "default_strip_chars")]
    pub strip_chars: Vec<char>,
    /// Custom system prompt for the baseline rewrite
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Custom instruction prompt (uses {instructions} and {content} placeholders)
    #[serde(default)]
    pub instruction_prompt: Option<String>,
}

fn default_strip_chars() -> Vec<char> {
    vec!['*']
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            strip_chars: default_strip_chars(),
            system_prompt: None,
            instruction_prompt: None,
        }
    }
}

impl RewriteConfig {
    /// Get the baseline system prompt, using custom or default.
    pub fn get_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Get the instruction prompt, using custom or default.
    pub fn get_instruction_prompt(&self) -> &str {
        self.instruction_prompt
            .as_deref()
            .unwrap_or(DEFAULT_INSTRUCTION_PROMPT)
    }

    /// Remove every marker character from `text`.
    pub fn strip_markers(&self, text: &str) -> String {
        strip_markers(text, &self.strip_chars)
    }
}

/// Remove every occurrence of `chars` from `text`.
pub fn strip_markers(text: &str, chars: &[char]) -> String {
    text.chars().filter(|c| !chars.contains(c)).collect()
}

/// First rewrite of freshly extracted text.
pub async fn baseline(
    rewriter: &dyn Rewriter,
    config: &RewriteConfig,
    extracted: &str,
) -> Result<String, LlmError> {
    info!("Requesting baseline rewrite ({} chars)", extracted.chars().count());
    let reply = rewriter
        .complete(config.get_system_prompt(), extracted)
        .await?;
    clean_reply(config, &reply)
}

/// Rewrite `content` according to `instructions`.
pub async fn refine(
    rewriter: &dyn Rewriter,
    config: &RewriteConfig,
    content: &str,
    instructions: &str,
) -> Result<String, LlmError> {
    info!("Applying instruction: {}", instructions);
    let system = render(config.get_instruction_prompt(), instructions, content);
    let reply = rewriter.complete(&system, content).await?;
    clean_reply(config, &reply)
}

fn clean_reply(config: &RewriteConfig, reply: &str) -> Result<String, LlmError> {
    let cleaned = config.strip_markers(reply);
    if cleaned.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    debug!(
        "Reply: {} chars ({} removed as markers)",
        cleaned.chars().count(),
        reply.chars().count() - cleaned.chars().count()
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every exchange and answers with a fixed reply.
    struct Recorder {
        reply: Result<String, ()>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl Recorder {
        fn answering(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Rewriter for Recorder {
        async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            self.reply
                .clone()
                .map_err(|_| LlmError::Connection("refused".to_string()))
        }
    }

    #[test]
    fn test_strip_markers_is_total() {
        let stripped = strip_markers("**Title**\n\n*a* b ***", &['*']);
        assert_eq!(stripped, "Title\n\na b ");
        assert!(!stripped.contains('*'));
        assert_eq!(strip_markers("#x_", &['#', '_']), "x");
    }

    #[test]
    fn test_default_config() {
        let config = RewriteConfig::default();
        assert_eq!(config.strip_chars, vec!['*']);
        assert!(config.get_system_prompt().starts_with("You are an exceptional writer"));
        assert!(config.get_instruction_prompt().contains("{instructions}"));
    }

    #[tokio::test]
    async fn test_baseline_uses_system_prompt_and_strips() {
        let rewriter = Recorder::answering("**Formal** text.");
        let config = RewriteConfig::default();

        let result = baseline(&rewriter, &config, "raw text").await.unwrap();
        assert_eq!(result, "Formal text.");

        let calls = rewriter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(calls[0].1, "raw text");
    }

    #[tokio::test]
    async fn test_refine_embeds_instruction_and_content() {
        let rewriter = Recorder::answering("Shorter.");
        let config = RewriteConfig::default();

        let result = refine(&rewriter, &config, "Current body.", "Be brief")
            .await
            .unwrap();
        assert_eq!(result, "Shorter.");

        let calls = rewriter.calls.lock().unwrap();
        assert!(calls[0].0.contains("Extra Instructions: Be brief"));
        assert!(calls[0].0.ends_with("Content:\nCurrent body."));
        assert_eq!(calls[0].1, "Current body.");
    }

    #[tokio::test]
    async fn test_marker_only_reply_is_empty_response() {
        let rewriter = Recorder::answering("** **");
        let err = baseline(&rewriter, &RewriteConfig::default(), "raw")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let rewriter = Recorder {
            reply: Err(()),
            calls: Mutex::new(Vec::new()),
        };
        let err = refine(&rewriter, &RewriteConfig::default(), "c", "i")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Connection(_)));
    }

    #[tokio::test]
    async fn test_custom_prompts() {
        let rewriter = Recorder::answering("ok");
        let config = RewriteConfig {
            strip_chars: vec![],
            system_prompt: Some("Be terse.".to_string()),
            instruction_prompt: Some("Do {instructions}.".to_string()),
        };

        baseline(&rewriter, &config, "t").await.unwrap();
        refine(&rewriter, &config, "t", "this").await.unwrap();

        let calls = rewriter.calls.lock().unwrap();
        assert_eq!(calls[0].0, "Be terse.");
        assert_eq!(calls[1].0, "Do this.");
    }
}
