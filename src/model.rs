//! Canonical race-calendar shapes every tier converges to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Semantic session type.
///
/// `Warmup`, `Test` and `Other` are valid classifications but never survive
/// normalization; see [`SessionKind::is_retained`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    Practice,
    Qualifying,
    Sprint,
    Race,
    Warmup,
    Test,
    Other,
}

impl SessionKind {
    /// Parses an explicit upstream type code that already names a retained kind.
    ///
    /// `FEATURE` is the feeder-series name for the main race. Intermediate
    /// codes such as `WARMUP`, `TEST` or `OTHER` are not accepted so that
    /// keyword classification still gets a chance.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "PRACTICE" => Some(Self::Practice),
            "QUALIFYING" => Some(Self::Qualifying),
            "SPRINT" => Some(Self::Sprint),
            "RACE" | "FEATURE" => Some(Self::Race),
            _ => None,
        }
    }

    /// Only the main sessions of a weekend are kept in canonical output.
    #[must_use]
    pub fn is_retained(self) -> bool {
        matches!(
            self,
            Self::Practice | Self::Qualifying | Self::Sprint | Self::Race
        )
    }

    /// Returns the stable upper-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "PRACTICE",
            Self::Qualifying => "QUALIFYING",
            Self::Sprint => "SPRINT",
            Self::Race => "RACE",
            Self::Warmup => "WARMUP",
            Self::Test => "TEST",
            Self::Other => "OTHER",
        }
    }
}

/// Publication status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Tbd,
    Updated,
    Cancelled,
}

impl SessionStatus {
    /// Maps upstream status labels; anything unknown is `Scheduled`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "TBD" => Self::Tbd,
            "UPDATED" => Self::Updated,
            "CANCELLED" | "CANCELED" => Self::Cancelled,
            _ => Self::Scheduled,
        }
    }
}

/// One timed session within an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSession {
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub name: String,
    /// ISO 8601 timestamp with offset.
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: SessionStatus,
}

impl CanonicalSession {
    /// Calendar date component of the start timestamp, if it has one.
    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start.as_deref().and_then(date_prefix)
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Venue {
    pub circuit: String,
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub country_code: Option<String>,
    /// IANA timezone identifier.
    pub timezone: String,
}

/// One round of a championship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub event_id: String,
    pub series_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub round_number: Option<u32>,
    pub has_results: bool,
    pub detail_url: Option<String>,
    pub venue: Venue,
    pub sessions: Vec<CanonicalSession>,
}

impl CanonicalEvent {
    /// Recomputes the date range from the declared start date and session dates.
    ///
    /// No-op for events without sessions.
    pub fn recompute_dates(&mut self) {
        if self.sessions.is_empty() {
            return;
        }
        let dates = std::iter::once(self.start_date)
            .chain(self.sessions.iter().filter_map(CanonicalSession::start_date));
        let (min, max) = dates.fold((self.start_date, self.start_date), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
        self.start_date = min;
        self.end_date = max;
    }

    /// Date used by the upcoming filter.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.max(self.start_date)
    }
}

/// Which tier produced an [`ExtractionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    HintApi,
    InlineJson,
    ApiCapture,
    AiSingle,
    AiTwoPhase,
    /// No tier produced data.
    None,
}

impl ExtractionMethod {
    /// Returns the wire tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HintApi => "hint_api",
            Self::InlineJson => "inline_json",
            Self::ApiCapture => "api_capture",
            Self::AiSingle => "ai_single",
            Self::AiTwoPhase => "ai_two_phase",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Out-of-band provenance record handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub series_id: String,
    pub season: i32,
    pub extraction_method: ExtractionMethod,
    pub events_found: usize,
    pub url: String,
    pub retrieved_at: DateTime<Utc>,
}

/// Serialized season document: `{series_id, name, season, events}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDocument {
    pub series_id: String,
    pub name: String,
    pub season: i32,
    pub events: Vec<CanonicalEvent>,
}

/// Result envelope of one top-level extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    document: SeasonDocument,
    metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Builds the envelope; `events_found` is derived from the event list.
    #[must_use]
    pub fn new(
        document: SeasonDocument,
        method: ExtractionMethod,
        url: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        let metadata = ExtractionMetadata {
            series_id: document.series_id.clone(),
            season: document.season,
            extraction_method: method,
            events_found: document.events.len(),
            url: url.to_string(),
            retrieved_at,
        };
        Self { document, metadata }
    }

    #[must_use]
    pub fn document(&self) -> &SeasonDocument {
        &self.document
    }

    #[must_use]
    pub fn metadata(&self) -> &ExtractionMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn events(&self) -> &[CanonicalEvent] {
        &self.document.events
    }

    #[must_use]
    pub fn method(&self) -> ExtractionMethod {
        self.metadata.extraction_method
    }

    /// Splits the envelope into its document and metadata parts.
    #[must_use]
    pub fn into_parts(self) -> (SeasonDocument, ExtractionMetadata) {
        (self.document, self.metadata)
    }
}

/// Parses the leading `YYYY-MM-DD` of a date or timestamp string.
#[must_use]
pub fn date_prefix(value: &str) -> Option<NaiveDate> {
    let head = value.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
