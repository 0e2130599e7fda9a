//! The individual extraction tiers.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::generative::GenerativeExtractor;
use crate::model::CanonicalEvent;
use crate::normalize::{events_from_json, normalize_generated_races, normalize_sessions};
use crate::sources::{CaptureTarget, CapturedResponse, embedded_json};

use super::{Extractor, TierInput, courtesy_pause};

/// URL substrings that mark calendar-like endpoints during capture.
const CAPTURE_PATTERNS: [&str; 12] = [
    "calendar",
    "schedule",
    "races",
    "events",
    "season",
    "rounds",
    "meeting",
    "timetable",
    "programme",
    "championship",
    "series",
    "results",
];

/// Orders captured responses largest body first.
pub(super) fn largest_first(mut responses: Vec<CapturedResponse>) -> Vec<CapturedResponse> {
    responses.sort_by(|a, b| b.body.len().cmp(&a.body.len()));
    responses
}

fn page_required<'a>(page: Option<&'a str>, url: &str) -> Result<&'a str, ExtractError> {
    page.ok_or_else(|| ExtractError::unreachable(url, "calendar page content unavailable"))
}

impl Extractor {
    fn generative_or_config(&self) -> Result<&GenerativeExtractor, ExtractError> {
        self.generative.as_ref().ok_or_else(|| {
            ExtractError::configuration(
                "no generative model configured",
                "Set GEMINI_API_KEY so the generative fallback tiers can run",
            )
        })
    }

    #[tracing::instrument(skip(self, input), fields(tier = "hint_api"))]
    pub(super) async fn hint_api_tier(
        &self,
        api_url: &str,
        input: &TierInput<'_>,
    ) -> Result<Vec<CanonicalEvent>, ExtractError> {
        let response = self.fetcher.fetch(api_url, input.verify_tls()).await?;
        if !response.is_success() {
            return Err(ExtractError::unreachable(
                api_url,
                format!("HTTP {}", response.status),
            ));
        }
        let body: Value = serde_json::from_str(&response.content)
            .map_err(|error| ExtractError::malformed(api_url, format!("invalid JSON: {error}")))?;
        let events = events_from_json(&body, &input.ctx);
        if events.is_empty() {
            return Err(ExtractError::malformed(api_url, "no race array found"));
        }
        Ok(events)
    }

    pub(super) fn inline_json_tier(
        page: Option<&str>,
        input: &TierInput<'_>,
    ) -> Result<Vec<CanonicalEvent>, ExtractError> {
        let html = page_required(page, input.url)?;
        let documents = embedded_json(html);
        if documents.is_empty() {
            debug!("Page has no embedded JSON");
            return Ok(Vec::new());
        }
        for document in &documents {
            let events = events_from_json(document.mining_root(), &input.ctx);
            if !events.is_empty() {
                debug!(source = ?document.source, events = events.len(), "Embedded JSON yielded events");
                return Ok(events);
            }
        }
        Err(ExtractError::malformed(
            input.url,
            format!("{} embedded JSON documents held no race array", documents.len()),
        ))
    }

    #[tracing::instrument(skip(self, page, input), fields(tier = "api_capture"))]
    pub(super) async fn capture_tier(
        &self,
        page: Option<&str>,
        input: &TierInput<'_>,
    ) -> Result<Vec<CanonicalEvent>, ExtractError> {
        let patterns: Vec<String> = input
            .hint
            .map(|h| h.network_patterns.clone())
            .unwrap_or_default()
            .into_iter()
            .chain(CAPTURE_PATTERNS.iter().map(|p| (*p).to_string()))
            .collect();

        let target = CaptureTarget::new(input.url)
            .with_content(page)
            .with_tls_verification(input.verify_tls());
        let responses = self
            .capture
            .capture(target, &patterns, self.settings.capture_timeout)
            .await;
        debug!(responses = responses.len(), "Captured responses");

        for response in largest_first(responses) {
            let Some(body) = response.json() else {
                continue;
            };
            let events = events_from_json(&body, &input.ctx);
            if !events.is_empty() {
                debug!(endpoint = %response.url, events = events.len(), "Captured response yielded events");
                return Ok(events);
            }
        }
        Ok(Vec::new())
    }

    #[tracing::instrument(skip(self, page, input), fields(tier = "ai_single"))]
    pub(super) async fn ai_single_tier(
        &self,
        page: Option<&str>,
        input: &TierInput<'_>,
    ) -> Result<Vec<CanonicalEvent>, ExtractError> {
        let generative = self.generative_or_config()?;
        let html = page_required(page, input.url)?;
        let records = generative.extract_full(html, input.subject()).await?;
        Ok(normalize_generated_races(&records, &input.ctx))
    }

    #[tracing::instrument(skip(self, page, input), fields(tier = "ai_two_phase"))]
    pub(super) async fn ai_two_phase_tier(
        &self,
        page: Option<&str>,
        input: &TierInput<'_>,
    ) -> Result<Vec<CanonicalEvent>, ExtractError> {
        let generative = self.generative_or_config()?;
        let html = page_required(page, input.url)?;
        let records = generative
            .extract_calendar(html, input.url, input.subject())
            .await?;
        let mut events = normalize_generated_races(&records, &input.ctx);
        info!(events = events.len(), "Phase one found events");

        let mut requested = 0usize;
        for event in &mut events {
            let Some(detail_url) = event.detail_url.clone() else {
                continue;
            };
            if requested > 0 {
                courtesy_pause(self.settings.generative_delay).await;
            }
            requested += 1;
            self.report(&format!("Fetching sessions for {}", event.name));

            let detail = match self.fetcher.fetch(&detail_url, input.verify_tls()).await {
                Ok(page) if page.is_success() => page.content,
                Ok(page) => {
                    warn!(event = %event.name, status = page.status, "Detail page returned non-success status");
                    continue;
                }
                Err(error) => {
                    warn!(event = %event.name, error = %error, "Detail page fetch failed");
                    continue;
                }
            };
            match generative
                .extract_sessions(&detail, &event.name, input.subject())
                .await
            {
                Ok(records) => {
                    event.sessions = normalize_sessions(&records);
                    debug!(event = %event.name, sessions = event.sessions.len(), "Phase two sessions");
                }
                Err(error) if error.is_configuration() => return Err(error),
                Err(error) => {
                    warn!(event = %event.name, error = %error, "Session generation failed");
                }
            }
        }
        Ok(events)
    }
}
