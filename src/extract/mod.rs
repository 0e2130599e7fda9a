//! Tier dispatcher: turns one calendar URL into an [`ExtractionResult`].
//!
//! Tiers run strictly in this order and the first one that yields at least
//! one event wins:
//!
//! 1. Hint API (only for hints with an API strategy and URL template)
//! 2. Inline JSON embedded in the page
//! 3. Network capture of JSON endpoints the page talks to
//! 4. Generative single-pass extraction
//! 5. Generative two-phase extraction
//!
//! The page is fetched once and shared by every tier that needs its content.
//! A tier failure is logged and never stops the cascade; only
//! [`ExtractError::Configuration`] escapes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use racecal_core::extract::{ExtractRequest, Extractor};
//! use racecal_core::sources::{HttpPageFetcher, HttpTimeouts};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpPageFetcher::new(HttpTimeouts::default())?);
//! let extractor = Extractor::builder(fetcher).build();
//! let request = ExtractRequest::new("https://www.fiawec.com/en/calendar/80", "wec", 2026);
//! let result = extractor.fetch_season(&request).await?;
//! println!("{} events via {}", result.events().len(), result.method());
//! # Ok(())
//! # }
//! ```

mod enrich;
mod progress;
mod tiers;

pub use enrich::filter_upcoming;
pub use progress::ProgressObserver;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::generative::{GenerationSubject, GenerativeExtractor};
use crate::hints::{HintRegistry, SiteHint, build_default_hint_registry};
use crate::model::{CanonicalEvent, ExtractionMethod, ExtractionResult, SeasonDocument};
use crate::normalize::{CountryTimezones, NormalizeContext, TimezoneLookup};
use crate::series;
use crate::sources::{DisabledCapture, NetworkCapture, PageFetcher};

/// Timeouts and courtesy delays used by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorSettings {
    /// Network capture timeout for the calendar page.
    pub capture_timeout: Duration,
    /// Network capture timeout for each event detail page.
    pub detail_capture_timeout: Duration,
    /// Pause between detail-page fetches during session backfill.
    pub detail_delay: Duration,
    /// Pause between per-event requests of two-phase generation.
    pub generative_delay: Duration,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            capture_timeout: Duration::from_secs(30),
            detail_capture_timeout: Duration::from_secs(20),
            detail_delay: Duration::from_millis(1500),
            generative_delay: Duration::from_secs(2),
        }
    }
}

impl ExtractorSettings {
    /// Settings with every courtesy delay set to zero.
    #[must_use]
    pub fn without_delays(self) -> Self {
        Self {
            detail_delay: Duration::ZERO,
            generative_delay: Duration::ZERO,
            ..self
        }
    }
}

/// One top-level extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub url: String,
    pub series_id: String,
    pub season: i32,
    /// Drop events that are already over and have results.
    pub upcoming_only: bool,
}

impl ExtractRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, series_id: impl Into<String>, season: i32) -> Self {
        Self {
            url: url.into(),
            series_id: series_id.into(),
            season,
            upcoming_only: false,
        }
    }

    #[must_use]
    pub fn with_upcoming_only(mut self, upcoming_only: bool) -> Self {
        self.upcoming_only = upcoming_only;
        self
    }
}

/// Builder for [`Extractor`].
pub struct ExtractorBuilder {
    hints: Arc<HintRegistry>,
    fetcher: Arc<dyn PageFetcher>,
    capture: Arc<dyn NetworkCapture>,
    generative: Option<GenerativeExtractor>,
    timezones: Arc<dyn TimezoneLookup>,
    settings: ExtractorSettings,
    progress: Option<Arc<dyn ProgressObserver>>,
    today: Option<NaiveDate>,
}

impl ExtractorBuilder {
    #[must_use]
    pub fn hints(mut self, hints: Arc<HintRegistry>) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn capture(mut self, capture: Arc<dyn NetworkCapture>) -> Self {
        self.capture = capture;
        self
    }

    /// Enables the generative tiers.
    #[must_use]
    pub fn generative(mut self, generative: GenerativeExtractor) -> Self {
        self.generative = Some(generative);
        self
    }

    #[must_use]
    pub fn timezones(mut self, timezones: Arc<dyn TimezoneLookup>) -> Self {
        self.timezones = timezones;
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: ExtractorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Pins the date used by the upcoming filter and for undated records.
    #[must_use]
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    #[must_use]
    pub fn build(self) -> Extractor {
        Extractor {
            hints: self.hints,
            fetcher: self.fetcher,
            capture: self.capture,
            generative: self.generative,
            timezones: self.timezones,
            settings: self.settings,
            progress: self.progress,
            today: self.today,
        }
    }
}

/// Multi-tier calendar extractor.
///
/// Holds only shared, read-only collaborators; one instance can serve any
/// number of sequential or concurrent requests.
pub struct Extractor {
    hints: Arc<HintRegistry>,
    fetcher: Arc<dyn PageFetcher>,
    capture: Arc<dyn NetworkCapture>,
    generative: Option<GenerativeExtractor>,
    timezones: Arc<dyn TimezoneLookup>,
    settings: ExtractorSettings,
    progress: Option<Arc<dyn ProgressObserver>>,
    today: Option<NaiveDate>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("hints", &self.hints.len())
            .field("generative", &self.generative)
            .field("settings", &self.settings)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

/// Per-request state shared by the tiers.
pub(crate) struct TierInput<'a> {
    pub url: &'a str,
    pub season: i32,
    pub series_name: &'a str,
    pub hint: Option<&'a SiteHint>,
    pub ctx: NormalizeContext<'a>,
}

impl TierInput<'_> {
    fn verify_tls(&self) -> bool {
        self.hint.is_none_or(|h| h.verify_tls)
    }

    pub(crate) fn subject(&self) -> GenerationSubject<'_> {
        GenerationSubject {
            series_name: self.series_name,
            season: self.season,
            site_context: self.hint.and_then(|h| h.ai_context.as_deref()),
        }
    }
}

impl Extractor {
    /// Starts a builder with the built-in hints, no network capture, no
    /// generative tiers and the built-in timezone table.
    #[must_use]
    pub fn builder(fetcher: Arc<dyn PageFetcher>) -> ExtractorBuilder {
        ExtractorBuilder {
            hints: Arc::new(build_default_hint_registry()),
            fetcher,
            capture: Arc::new(DisabledCapture),
            generative: None,
            timezones: Arc::new(CountryTimezones::new()),
            settings: ExtractorSettings::default(),
            progress: None,
            today: None,
        }
    }

    fn report(&self, message: &str) {
        info!("{message}");
        if let Some(progress) = &self.progress {
            progress.on_progress(message);
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Extracts one season's calendar from `request.url`.
    ///
    /// Returns a result tagged with the tier that produced it, or tagged
    /// `none` with no events when every tier came up empty.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Configuration`] when the URL is missing or
    /// invalid, or when a generative tier is reached without a generator.
    #[tracing::instrument(
        skip(self, request),
        fields(url = %request.url, series = %request.series_id, season = request.season)
    )]
    pub async fn fetch_season(&self, request: &ExtractRequest) -> Result<ExtractionResult, ExtractError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(ExtractError::configuration(
                "no calendar URL given",
                "Pass the season calendar page URL",
            ));
        }
        if url::Url::parse(url).is_err() {
            return Err(ExtractError::configuration(
                &format!("'{url}' is not a valid URL"),
                "Use an absolute http(s) URL such as https://www.fiawec.com/en/calendar",
            ));
        }

        let hint = self.hints.lookup(url);
        if let Some(hint) = hint {
            debug!(domain = %hint.domain, strategy = ?hint.strategy, "Using site hint");
        }
        let series_name = series::display_name(&request.series_id);
        let input = TierInput {
            url,
            season: request.season,
            series_name,
            hint,
            ctx: NormalizeContext {
                series_id: &request.series_id,
                page_url: url,
                hint,
                timezones: self.timezones.as_ref(),
                fallback_date: self.today(),
            },
        };

        let (mut events, method) = self.run_tiers(&input).await?;

        // Two-phase output already carries its sessions and only gets date recomputation.
        if method != ExtractionMethod::AiTwoPhase {
            if request.upcoming_only {
                let before = events.len();
                events = filter_upcoming(events, self.today());
                debug!(before, after = events.len(), "Applied upcoming filter");
            }
            self.backfill_sessions(&mut events, &input).await;
        }
        for event in &mut events {
            event.recompute_dates();
        }

        let document = SeasonDocument {
            series_id: request.series_id.clone(),
            name: series_name.to_string(),
            season: request.season,
            events,
        };
        let result = ExtractionResult::new(document, method, url, Utc::now());
        info!(
            method = %result.method(),
            events = result.events().len(),
            "Extraction finished"
        );
        Ok(result)
    }

    async fn run_tiers(
        &self,
        input: &TierInput<'_>,
    ) -> Result<(Vec<CanonicalEvent>, ExtractionMethod), ExtractError> {
        if let Some(api_url) = input.hint.and_then(|h| h.api_url_for(input.season)) {
            self.report(&format!("Trying hint API {api_url}"));
            let outcome = self.hint_api_tier(&api_url, input).await;
            if let Some(events) = Self::settle(ExtractionMethod::HintApi, outcome)? {
                return Ok((events, ExtractionMethod::HintApi));
            }
        }

        let page = self.fetch_page(input).await;

        self.report("Looking for embedded JSON");
        let outcome = Self::inline_json_tier(page.as_deref(), input);
        if let Some(events) = Self::settle(ExtractionMethod::InlineJson, outcome)? {
            return Ok((events, ExtractionMethod::InlineJson));
        }

        self.report("Capturing network responses");
        let outcome = self.capture_tier(page.as_deref(), input).await;
        if let Some(events) = Self::settle(ExtractionMethod::ApiCapture, outcome)? {
            return Ok((events, ExtractionMethod::ApiCapture));
        }

        self.report("Trying single-pass generative extraction");
        let outcome = self.ai_single_tier(page.as_deref(), input).await;
        if let Some(events) = Self::settle(ExtractionMethod::AiSingle, outcome)? {
            return Ok((events, ExtractionMethod::AiSingle));
        }

        self.report("Trying two-phase generative extraction");
        let outcome = self.ai_two_phase_tier(page.as_deref(), input).await;
        if let Some(events) = Self::settle(ExtractionMethod::AiTwoPhase, outcome)? {
            return Ok((events, ExtractionMethod::AiTwoPhase));
        }

        warn!(url = input.url, "All extraction tiers exhausted");
        Ok((Vec::new(), ExtractionMethod::None))
    }

    /// Maps a tier outcome to "won", "missed" or an escaping error.
    fn settle(
        tier: ExtractionMethod,
        outcome: Result<Vec<CanonicalEvent>, ExtractError>,
    ) -> Result<Option<Vec<CanonicalEvent>>, ExtractError> {
        match outcome {
            Ok(events) if !events.is_empty() => {
                info!(tier = %tier, events = events.len(), "Tier succeeded");
                Ok(Some(events))
            }
            Ok(_) => {
                debug!(tier = %tier, "Tier found no events");
                Ok(None)
            }
            Err(error) if error.is_configuration() => Err(error),
            Err(error) => {
                warn!(tier = %tier, error = %error, "Tier failed");
                Ok(None)
            }
        }
    }

    async fn fetch_page(&self, input: &TierInput<'_>) -> Option<String> {
        match self.fetcher.fetch(input.url, input.verify_tls()).await {
            Ok(page) if page.is_success() => Some(page.content),
            Ok(page) => {
                warn!(url = input.url, status = page.status, "Calendar page returned non-success status");
                None
            }
            Err(error) => {
                warn!(url = input.url, error = %error, "Calendar page fetch failed");
                None
            }
        }
    }
}

/// Sleeps for `delay` unless it is zero.
async fn courtesy_pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ExtractorSettings::default();
        assert_eq!(settings.capture_timeout, Duration::from_secs(30));
        assert_eq!(settings.detail_capture_timeout, Duration::from_secs(20));
        assert_eq!(settings.detail_delay, Duration::from_millis(1500));
        assert_eq!(settings.generative_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_without_delays_keeps_timeouts() {
        let settings = ExtractorSettings::default().without_delays();
        assert!(settings.detail_delay.is_zero());
        assert!(settings.generative_delay.is_zero());
        assert_eq!(settings.capture_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_request_builder() {
        let request = ExtractRequest::new("https://fiawec.com", "wec", 2026).with_upcoming_only(true);
        assert!(request.upcoming_only);
        assert_eq!(request.season, 2026);
    }
}
