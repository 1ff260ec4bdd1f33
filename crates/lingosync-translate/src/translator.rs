//! The translation provider seam and its chat-completions implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::TargetLocale;
use crate::locale::{language_name_for, lookup_language_name};
use crate::truncate::truncate_keywords;

const PROVIDER_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling temperature for translations; low and fixed so repeated runs
/// stay close to deterministic.
const SAMPLING_TEMPERATURE: f32 = 0.3;

/// Upper bound on a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Translates App Store copy into a target language.
///
/// Implementations never fail: a provider outage degrades to returning the
/// input text untranslated, so one flaky call cannot sink a locale.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into the language identified by `target`: a locale
    /// code or a plain language name. Empty input returns an empty string
    /// without a provider call.
    async fn translate(&self, text: &str, target: &str) -> String;

    /// Like [`translate`](Self::translate), but asks the provider for a
    /// comma-separated keyword list and truncates the result to
    /// `max_length`.
    async fn translate_keywords(&self, text: &str, target: &str, max_length: usize) -> String;
}

#[derive(Debug, Error)]
enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion contained no choices")]
    EmptyCompletion,
}

/// Chat-completions-backed [`Translator`].
pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    source_language: &'static str,
    catalog: Vec<TargetLocale>,
}

impl OpenAiTranslator {
    /// Creates a translator for one run.
    ///
    /// `source_locale` names the locale the source text is written in;
    /// `catalog` is used to resolve target locale codes to language names.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        source_locale: &str,
        catalog: Vec<TargetLocale>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            source_language: language_name_for(source_locale),
            catalog,
        }
    }

    /// Resolves the target argument to a language name: a catalog code maps
    /// through the catalog, any other known locale code through the base
    /// table, and everything else is taken to already be a language name.
    fn target_language_name(&self, target: &str) -> String {
        if let Some(entry) = self.catalog.iter().find(|l| l.code == target) {
            return entry.display_name.to_string();
        }
        if let Some(name) = lookup_language_name(target) {
            return name.to_string();
        }
        target.to_string()
    }

    fn system_instruction(&self, target_language: &str, keywords: bool) -> String {
        let mut instruction = format!(
            "You are a professional translator. Translate the following text \
             from {} to {}. Maintain the tone and marketing style of the \
             original text and keep the result natural.",
            self.source_language, target_language
        );
        if keywords {
            instruction.push_str(
                " For keywords, provide a comma-separated list of \
                 search-relevant terms and keep it concise.",
            );
        }
        instruction
    }

    async fn request_translation(&self, system: &str, text: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: text },
            ],
            temperature: SAMPLING_TEMPERATURE,
        };

        let response = self
            .client
            .post(PROVIDER_URL)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyCompletion)?;

        Ok(content.trim().to_string())
    }

    async fn translate_or_fall_back(&self, text: &str, target: &str, keywords: bool) -> String {
        let target_language = self.target_language_name(target);
        let system = self.system_instruction(&target_language, keywords);

        debug!("translating {} chars to {}", text.chars().count(), target_language);

        match self.request_translation(&system, text).await {
            Ok(translated) => translated,
            Err(err) => {
                warn!("translation to {target_language} failed, keeping source text: {err}");
                text.to_string()
            }
        }
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str, target: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        self.translate_or_fall_back(text, target, false).await
    }

    async fn translate_keywords(&self, text: &str, target: &str, max_length: usize) -> String {
        if text.is_empty() {
            return String::new();
        }
        let translated = self.translate_or_fall_back(text, target, true).await;
        truncate_keywords(&translated, max_length)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
