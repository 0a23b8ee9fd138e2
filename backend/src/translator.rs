use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use regional_pulse_shared::Language;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TranslatorConfig;

/// Separator between numbered items in the prompt and in the completion.
const ITEM_SEPARATOR: &str = "---";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("translation API key is not configured")]
    MissingApiKey,
    #[error("failed to reach translation provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("translation provider returned HTTP {status}")]
    Status { status: u16, details: Value },
    #[error("unexpected translation provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Batches texts into one chat-completion call and splits the answer back.
pub struct UpstreamTranslator {
    config: TranslatorConfig,
    client: reqwest::Client,
}

impl UpstreamTranslator {
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let mut client_builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(proxy_url) = config.proxy_url.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .with_context(|| format!("invalid TRANSLATE_PROXY_URL: {proxy_url}"))?;
            client_builder = client_builder.proxy(proxy);
        }
        let client = client_builder
            .build()
            .context("failed to build translation http client")?;

        Ok(Self {
            config,
            client,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Translate `texts` into `target`.
    ///
    /// The result always has one entry per input: when the completion does
    /// not split into exactly that many items the inputs are echoed back.
    pub async fn translate(
        &self,
        texts: &[String],
        target: Language,
    ) -> Result<Vec<String>, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey)?;

        let system_prompt = build_prompt(target);
        let user_content = combine_texts(texts);
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let raw = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            tracing::error!("translation provider error {status}: {details}");
            return Err(UpstreamError::Status {
                status,
                details,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| UpstreamError::Decode(err.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| UpstreamError::Decode("completion has no content".to_string()))?;

        let translations = split_completion(&content);
        if translations.len() != texts.len() {
            tracing::warn!(
                "translation count mismatch: expected {}, got {}; returning originals",
                texts.len(),
                translations.len()
            );
            return Ok(texts.to_vec());
        }
        Ok(translations)
    }
}

/// System prompt for translating into `target`.
pub fn build_prompt(target: Language) -> String {
    format!(
        "Translate the following {} text to {}. Each item is separated by \"{ITEM_SEPARATOR}\". \
         Return only the translated text in the same format, without any additional commentary \
         or formatting.",
        target.toggled().english_name(),
        target.english_name(),
    )
}

/// `1. first\n---\n2. second`.
pub fn combine_texts(texts: &[String]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| format!("{}. {text}", index + 1))
        .collect::<Vec<_>>()
        .join(&format!("\n{ITEM_SEPARATOR}\n"))
}

fn numbering_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("valid numbering regex"))
}

/// Split a completion on the separator and drop the `n. ` prefixes.
pub fn split_completion(content: &str) -> Vec<String> {
    content
        .trim()
        .split(ITEM_SEPARATOR)
        .map(|item| numbering_pattern().replace(item.trim_start(), "").trim().to_string())
        .collect()
}
