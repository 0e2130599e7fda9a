//! Generative-model extraction.
//!
//! A [`Generator`] turns a prompt into free text. [`GenerativeExtractor`]
//! builds the prompts, cleans page content and parses the replies into raw
//! JSON records, which the normalizer then treats like any other source.

mod gemini;
mod prompt;
mod response;

pub use gemini::{API_KEY_ENV, DEFAULT_MODEL, GeminiGenerator, MODEL_ENV};
pub use prompt::{
    DEFAULT_PROMPT_CEILING, calendar_prompt, clean_html, full_extraction_prompt, sessions_prompt,
};
pub use response::{parse_model_json, records, season_events};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ExtractError;

/// Turns a prompt into model text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Runs one generation.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UpstreamUnreachable`] when the model cannot be
    /// reached and [`ExtractError::GenerativeOutputInvalid`] for empty replies.
    async fn generate(&self, prompt: &str) -> Result<String, ExtractError>;
}

/// What a generative call is about.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSubject<'a> {
    pub series_name: &'a str,
    pub season: i32,
    pub site_context: Option<&'a str>,
}

/// Prompt building and reply parsing around a [`Generator`].
#[derive(Clone)]
pub struct GenerativeExtractor {
    generator: Arc<dyn Generator>,
    prompt_ceiling: usize,
}

impl GenerativeExtractor {
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompt_ceiling: DEFAULT_PROMPT_CEILING,
        }
    }

    /// Overrides the cleaned-content character ceiling.
    #[must_use]
    pub fn with_prompt_ceiling(mut self, max_chars: usize) -> Self {
        self.prompt_ceiling = max_chars;
        self
    }

    async fn ask(&self, prompt: &str) -> Result<Value, ExtractError> {
        let reply = self.generator.generate(prompt).await?;
        parse_model_json(&reply)
    }

    /// Single pass: every event of the season with its sessions.
    ///
    /// # Errors
    ///
    /// Propagates generator and reply parsing errors.
    #[tracing::instrument(skip_all, fields(generator = self.generator.name(), series = subject.series_name))]
    pub async fn extract_full(
        &self,
        html: &str,
        subject: GenerationSubject<'_>,
    ) -> Result<Vec<Value>, ExtractError> {
        let cleaned = clean_html(html, self.prompt_ceiling);
        let prompt = full_extraction_prompt(
            &cleaned,
            subject.series_name,
            subject.season,
            subject.site_context,
        );
        let events = season_events(self.ask(&prompt).await?);
        info!(events = events.len(), "Single-pass generation finished");
        Ok(events)
    }

    /// Phase one: events with dates, venues and detail links.
    ///
    /// # Errors
    ///
    /// Propagates generator and reply parsing errors.
    #[tracing::instrument(skip_all, fields(generator = self.generator.name(), series = subject.series_name))]
    pub async fn extract_calendar(
        &self,
        html: &str,
        page_url: &str,
        subject: GenerationSubject<'_>,
    ) -> Result<Vec<Value>, ExtractError> {
        let cleaned = clean_html(html, self.prompt_ceiling);
        let prompt = calendar_prompt(
            &cleaned,
            subject.series_name,
            subject.season,
            page_url,
            subject.site_context,
        );
        let events = records(self.ask(&prompt).await?, "events");
        info!(events = events.len(), "Calendar generation finished");
        Ok(events)
    }

    /// Phase two: sessions of one event from its detail page.
    ///
    /// # Errors
    ///
    /// Propagates generator and reply parsing errors.
    #[tracing::instrument(skip_all, fields(event = event_name))]
    pub async fn extract_sessions(
        &self,
        html: &str,
        event_name: &str,
        subject: GenerationSubject<'_>,
    ) -> Result<Vec<Value>, ExtractError> {
        let cleaned = clean_html(html, self.prompt_ceiling);
        let prompt = sessions_prompt(
            &cleaned,
            event_name,
            subject.series_name,
            subject.season,
            subject.site_context,
        );
        let sessions = records(self.ask(&prompt).await?, "sessions");
        debug!(sessions = sessions.len(), "Session generation finished");
        Ok(sessions)
    }
}

impl std::fmt::Debug for GenerativeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeExtractor")
            .field("generator", &self.generator.name())
            .field("prompt_ceiling", &self.prompt_ceiling)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replies with a fixed string and records every prompt.
    struct ScriptedGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String, ExtractError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    const SUBJECT: GenerationSubject<'static> = GenerationSubject {
        series_name: "FIA WEC",
        season: 2026,
        site_context: Some("Events are cards."),
    };

    #[tokio::test]
    async fn test_extract_calendar_accepts_wrapped_object() {
        let generator = ScriptedGenerator::new(
            "```json\n{\"events\": [{\"name\": \"Qatar 1812km\", \"start_date\": \"2026-03-26\"}]}\n```",
        );
        let extractor = GenerativeExtractor::new(generator.clone());
        let events = extractor
            .extract_calendar("<p>cal</p>", "https://fiawec.com/en/calendar", SUBJECT)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("https://fiawec.com/en/calendar"));
        assert!(prompts[0].ends_with("Events are cards."));
    }

    #[tokio::test]
    async fn test_extract_sessions_single_object_becomes_one_record() {
        let generator = ScriptedGenerator::new(r#"{"name": "Race", "type": "RACE"}"#);
        let extractor = GenerativeExtractor::new(generator);
        let sessions = extractor
            .extract_sessions("<p/>", "Spa", SUBJECT)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_full_reads_events_key() {
        let generator = ScriptedGenerator::new(
            r#"{"name": "FIA WEC", "season": 2026, "events": [{"name": "A"}, {"name": "B"},]}"#,
        );
        let extractor = GenerativeExtractor::new(generator);
        let events = extractor.extract_full("<p/>", SUBJECT).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_reply_is_generative_error() {
        let generator = ScriptedGenerator::new("I could not find a calendar.");
        let extractor = GenerativeExtractor::new(generator);
        let err = extractor.extract_full("<p/>", SUBJECT).await.unwrap_err();
        assert!(matches!(err, ExtractError::GenerativeOutputInvalid { .. }));
    }

    #[tokio::test]
    async fn test_prompt_ceiling_truncates_page() {
        let generator = ScriptedGenerator::new("[]");
        let extractor = GenerativeExtractor::new(generator.clone()).with_prompt_ceiling(5);
        extractor
            .extract_sessions("abcdefghij", "Spa", SUBJECT)
            .await
            .unwrap();
        assert!(generator.prompts.lock().unwrap()[0].contains("abcde\n... (truncated)"));
    }
}
