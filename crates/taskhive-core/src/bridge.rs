//! Assist bridge: the external AI collaborator behind the three assisted
//! features (task scoring, subtask suggestion, group emoji).
//!
//! The bridge is deliberately thin — an OpenAI-compatible chat call with a
//! bearer key supplied per invocation by the resolver. Credential handling
//! lives entirely outside this module; it receives an already-resolved
//! [`Credential`] and never knows whether the key was personal or pooled.
//!
//! Every feature has a safe fallback for when no credential resolves or the
//! upstream call fails: a neutral score, an empty subtask list, a generic
//! folder emoji. Callers use those instead of surfacing an error.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::BridgeError;
use crate::resolver::Credential;

const ASSIST_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

/// Neutral midpoint on the 1-10 priority scale.
pub const FALLBACK_SCORE: u8 = 5;
/// Suggested when no model is reachable; the UI treats it as "no suggestion".
pub const FALLBACK_GROUP_EMOJI: &str = "📁";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Clone)]
pub struct AssistBridge {
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl AssistBridge {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_base: ASSIST_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        if !model.trim().is_empty() {
            self.model = model.trim().to_string();
        }
        self
    }

    /// Point at a different OpenAI-compatible endpoint (also used by tests).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn chat(
        &self,
        credential: &Credential,
        system: &str,
        user: &str,
    ) -> Result<String, BridgeError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system.to_string() },
                ChatMessage { role: "user".to_string(), content: user.to_string() },
            ],
            temperature: 0.3,
            max_tokens: 256,
        };

        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", credential.key()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(BridgeError::Upstream { status, body });
        }

        let parsed: ChatResponse = res.json().await?;
        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(BridgeError::EmptyResponse)?;
        debug!(chars = text.len(), "assist response received");
        Ok(text)
    }

    /// Priority score 1-10 for a task title. Unparseable output falls back
    /// to [`FALLBACK_SCORE`] rather than erroring.
    pub async fn score_task(
        &self,
        credential: &Credential,
        title: &str,
    ) -> Result<u8, BridgeError> {
        let system = "You rate task priority. Respond with a single integer from 1 (trivial) \
            to 10 (urgent and important). No other text.";
        let raw = self.chat(credential, system, title).await?;
        Ok(parse_score(&raw).unwrap_or(FALLBACK_SCORE))
    }

    /// Short subtask list for a task title, one per line.
    pub async fn suggest_subtasks(
        &self,
        credential: &Credential,
        title: &str,
    ) -> Result<Vec<String>, BridgeError> {
        let system = "Break the task into at most 5 concrete subtasks. \
            Respond with one subtask per line, no numbering, no other text.";
        let raw = self.chat(credential, system, title).await?;
        Ok(parse_subtasks(&raw))
    }

    /// A single emoji for a task group name.
    pub async fn suggest_group_emoji(
        &self,
        credential: &Credential,
        group_name: &str,
    ) -> Result<String, BridgeError> {
        let system = "Suggest one emoji that represents this task group. \
            Respond with the emoji only.";
        let raw = self.chat(credential, system, group_name).await?;
        let emoji = first_emoji_like(&raw);
        Ok(if emoji.is_empty() { FALLBACK_GROUP_EMOJI.to_string() } else { emoji })
    }
}

impl Default for AssistBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_score(raw: &str) -> Option<u8> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(2).collect();
    let n: u8 = digits.parse().ok()?;
    (1..=10).contains(&n).then_some(n)
}

fn parse_subtasks(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim())
        .map(|l| l.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')').trim())
        .filter(|l| !l.is_empty())
        .take(5)
        .map(str::to_string)
        .collect()
}

/// The first contiguous run of non-ASCII chars, so multi-scalar emoji (ZWJ
/// sequences, skin tones) come through whole instead of as their first
/// codepoint.
fn first_emoji_like(raw: &str) -> String {
    raw.chars()
        .skip_while(|c| c.is_ascii())
        .take_while(|c| !c.is_ascii())
        .collect()
}
