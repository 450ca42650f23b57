use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::record::ContentRecord;

const SYSTEM_PROMPT: &str = "你是一位專業的 Human Design（人類圖）翻譯專家。\
請將以下英文內容翻譯成流暢、準確的繁體中文。\
保留專有名詞如 Gate、Channel、Center 等的英文原文，可以在括號中加中文說明。\
注意保持原文的專業性和深度。必須使用繁體中文。";
const USER_PREFIX: &str = "請將以下內容翻譯成繁體中文（台灣用語）：\n\n";
const FAILURE_MARK: &str = "[翻譯失敗]";

/// One text in, one translated text out.
pub trait Translator {
    /// Checked once before any field is sent; a failure here aborts the run.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn translate(&self, text: &str) -> Result<String>;
}

/// Chat-completions client for a DeepSeek-compatible endpoint.
pub struct ChatTranslator {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

impl ChatTranslator {
    pub fn new(settings: &Settings, api_key: Option<String>) -> Self {
        ChatTranslator {
            client: reqwest::Client::new(),
            url: settings.translate_url.clone(),
            model: settings.translate_model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: settings.translate_timeout(),
        }
    }
}

impl Translator for ChatTranslator {
    fn ensure_ready(&self) -> Result<()> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(Error::MissingCredential("DEEPSEEK_API_KEY")),
        }
    }

    async fn translate(&self, text: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential("DEEPSEEK_API_KEY"))?;
        let user = format!("{}{}", USER_PREFIX, text);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::http(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: self.url.clone(),
                status,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::http(&self.url, e))?;
        first_reply(parsed)
    }
}

fn first_reply(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .ok_or(Error::Response {
            service: "translation",
            details: "no choices in completion".into(),
        })
}

pub fn failure_placeholder(original: &str) -> String {
    format!("{} {}", FAILURE_MARK, original)
}

/// Copy of `record` with each populated text field translated, one call per
/// field. A failed field keeps its original text behind a failure marker.
pub async fn translate_record<T: Translator>(record: &ContentRecord, translator: &T) -> ContentRecord {
    let mut translated = record.clone();
    let fields = record.populated();

    let pb = ProgressBar::new(fields.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("   [{bar:30}] {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    for field in fields {
        let Some(original) = record.text(field) else {
            continue;
        };
        pb.set_message(field.name());
        debug!(field = field.name(), chars = original.len(), "translating");

        let text = match translator.translate(original).await {
            Ok(t) => t,
            Err(e) => {
                warn!("Translation of {} failed: {}", field.name(), e);
                failure_placeholder(original)
            }
        };
        translated.set_text(field, text);
        pb.inc(1);
    }

    pb.finish_and_clear();
    translated
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTranslator;

    #[tokio::test]
    async fn translates_populated_fields_only() {
        let record = ContentRecord {
            title: Some("Gate 58 - The Joyous".into()),
            line_title: Some("Line 3 - Electricity".into()),
            glyph_url: Some("https://example.com/g.jpg".into()),
            mandala_link: Some("../images/Gate-58-Rave-Mandala.png".into()),
            ..Default::default()
        };
        let translator = ScriptedTranslator::default();
        let zh = translate_record(&record, &translator).await;

        assert_eq!(translator.calls(), 2);
        assert_eq!(zh.title.as_deref(), Some("ZH:Gate 58 - The Joyous"));
        assert_eq!(zh.line_title.as_deref(), Some("ZH:Line 3 - Electricity"));
        assert_eq!(zh.glyph_url, record.glyph_url);
        assert_eq!(zh.mandala_link, record.mandala_link);
        assert!(zh.lead.is_none());
    }

    #[tokio::test]
    async fn failed_field_is_isolated() {
        let record = ContentRecord {
            lead: Some("FAIL here".into()),
            exaltation: Some("bright".into()),
            detriment: Some("dim".into()),
            ..Default::default()
        };
        let translator = ScriptedTranslator::default();
        let zh = translate_record(&record, &translator).await;

        assert_eq!(translator.calls(), 3);
        assert_eq!(zh.lead.as_deref(), Some("[翻譯失敗] FAIL here"));
        assert_eq!(zh.exaltation.as_deref(), Some("ZH:bright"));
        assert_eq!(zh.detriment.as_deref(), Some("ZH:dim"));
    }

    #[test]
    fn at_most_ten_calls() {
        let full = ContentRecord {
            title: Some("a".into()),
            subtitle: Some("a".into()),
            lead: Some("a".into()),
            cross_reference: Some("a".into()),
            quarter_theme: Some("a".into()),
            main_body: Some("a".into()),
            line_title: Some("a".into()),
            exaltation: Some("a".into()),
            detriment: Some("a".into()),
            footer_note: Some("a".into()),
            glyph_filename: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(full.populated().len(), 10);
    }

    #[test]
    fn reply_is_trimmed_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  閘門 58  \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_reply(parsed).unwrap(), "閘門 58");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_reply(empty), Err(Error::Response { .. })));
    }

    #[test]
    fn missing_key_is_reported_before_translation() {
        let settings = Settings::defaults();
        assert!(matches!(
            ChatTranslator::new(&settings, None).ensure_ready(),
            Err(Error::MissingCredential("DEEPSEEK_API_KEY"))
        ));
        assert!(ChatTranslator::new(&settings, Some("  ".into()))
            .ensure_ready()
            .is_err());
        assert!(ChatTranslator::new(&settings, Some("sk-test".into()))
            .ensure_ready()
            .is_ok());
    }
}
