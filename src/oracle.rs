//! LLM-backed relevance trimming.
//!
//! The document is line-numbered, sent to a chat model together with a
//! context string, and the model answers with a `START: n, END: m` range.
//! The range is applied strictly: anything other than `0/0` or an in-bounds
//! `start <= end` is a failure.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::OracleError;

const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "\
You are an expert text analyzer. Your task is to identify the most relevant contiguous block of lines in the provided line-numbered text that directly addresses the topics mentioned in the context. Ignore irrelevant sections like navigation menus, sidebars, headers, footers, advertisements, and unrelated comments. Focus solely on the core content related to the context.
Based *only* on the provided context and line-numbered content, identify the single most relevant contiguous block of lines that discusses the topics in the context. Exclude any surrounding noise (navbars, footers, irrelevant comments, etc.).

Respond *only* with the starting and ending line numbers of this block, formatted exactly as: `START: <start_line_number>, END: <end_line_number>`.

Example Response: `START: 15, END: 88`

If no relevant block is found, respond only with `START: 0, END: 0`.
";

/// A single prompt/response call to a language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError>;
}

/// OpenAI-compatible `chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
        let req = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
        };

        let resp = self
            .client
            .post(self.endpoint())
            .timeout(CHAT_TIMEOUT)
            .bearer_auth(&self.config.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(OracleError::EmptyReply)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Trims documents down to the region most relevant to a context string.
#[derive(Clone)]
pub struct ContentOracle {
    model: Arc<dyn ChatModel>,
}

impl ContentOracle {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Return the relevant excerpt, `""` when the model finds nothing
    /// relevant, or an error for any malformed reply.
    pub async fn trim(&self, context: &str, document: &str) -> Result<String, OracleError> {
        let lines: Vec<&str> = document.lines().collect();
        let prompt = user_prompt(context, &lines);
        let reply = self.model.complete(SYSTEM_PROMPT, &prompt).await?;

        match apply_range(&reply, &lines) {
            Ok(excerpt) => {
                if excerpt.is_empty() {
                    tracing::info!("oracle found no relevant block");
                }
                Ok(excerpt)
            }
            Err(e) => {
                tracing::error!(error = %e, reply = %reply, "oracle reply rejected");
                Err(e)
            }
        }
    }
}

fn user_prompt(context: &str, lines: &[&str]) -> String {
    let mut numbered = String::new();
    for (i, line) in lines.iter().enumerate() {
        numbered.push_str(&format!("{} | {}\n", i + 1, line));
    }
    format!("\nContext:\n\"{context}\"\n\nLine-numbered Content:\n```\n{numbered}```\n")
}

fn range_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"(?i)start:\s*([0-9]+)").unwrap_or_else(|e| unreachable!("start pattern: {e}")),
            Regex::new(r"(?i)end:\s*([0-9]+)").unwrap_or_else(|e| unreachable!("end pattern: {e}")),
        )
    })
}

fn capture_number(pattern: &Regex, reply: &str) -> Option<usize> {
    pattern.captures(reply)?.get(1)?.as_str().parse().ok()
}

/// Parse a `START: n, END: m` reply (case-insensitive, optional whitespace
/// after each colon).
pub fn parse_range(reply: &str) -> Result<(usize, usize), OracleError> {
    let (start, end) = range_patterns();
    match (capture_number(start, reply), capture_number(end, reply)) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(OracleError::Unparsable(reply.to_string())),
    }
}

/// Resolve a reply against the document lines (1-based, inclusive).
pub fn apply_range(reply: &str, lines: &[&str]) -> Result<String, OracleError> {
    let (start, end) = parse_range(reply)?;
    let total = lines.len();
    if start == 0 && end == 0 {
        return Ok(String::new());
    }
    if start == 0 || start > end || end > total {
        return Err(OracleError::OutOfRange { start, end, total });
    }
    Ok(lines[start - 1..end].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: [&str; 5] = ["one", "two", "three", "four", "five"];

    #[test]
    fn in_bounds_range_returns_inclusive_lines() {
        for start in 1..=DOC.len() {
            for end in start..=DOC.len() {
                let reply = format!("START: {start}, END: {end}");
                let expected = DOC[start - 1..end].join("\n");
                assert_eq!(apply_range(&reply, &DOC).unwrap(), expected);
            }
        }
    }

    #[test]
    fn zero_zero_means_nothing_relevant() {
        assert_eq!(apply_range("START: 0, END: 0", &DOC).unwrap(), "");
        assert_eq!(apply_range("start:0\nend:0", &[]).unwrap(), "");
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(parse_range("Start: 3\nEnd: 4").unwrap(), (3, 4));
        assert_eq!(parse_range("`START:15, END:  88`").unwrap(), (15, 88));
        assert_eq!(parse_range("start:\n  7 and later END:\t9").unwrap(), (7, 9));
    }

    #[test]
    fn invalid_ranges_fail() {
        for reply in [
            "START: 3, END: 2",
            "START: 1, END: 6",
            "START: 0, END: 2",
            "START: 2, END: 0",
            "the answer is lines 2 to 3",
            "START: two, END: three",
            "END: 3",
            "",
        ] {
            assert!(apply_range(reply, &DOC).is_err(), "{reply:?} should be rejected");
        }
    }

    #[test]
    fn prompt_numbers_lines_from_one() {
        let prompt = user_prompt("rust: async", &["alpha", "beta"]);
        assert!(prompt.contains("\"rust: async\""));
        assert!(prompt.contains("1 | alpha\n2 | beta\n"));
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl ChatModel for Fixed {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, OracleError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn trim_uses_model_reply() {
        let oracle = ContentOracle::new(Arc::new(Fixed("START: 2, END: 3")));
        assert_eq!(oracle.trim("ctx", "a\nb\nc\nd").await.unwrap(), "b\nc");

        let oracle = ContentOracle::new(Arc::new(Fixed("no idea")));
        assert!(matches!(
            oracle.trim("ctx", "a\nb").await,
            Err(OracleError::Unparsable(_))
        ));
    }
}
