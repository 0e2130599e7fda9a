//! Raw record to canonical event/session normalization.
//!
//! # Architecture
//!
//! - [`RawRecord`] - case-insensitive view over one JSON object
//! - [`RaceSchema`] / [`SessionSchema`] - upstream families selected by key-set probing
//! - [`normalize_race`] / [`normalize_session`] - per-record conversion
//! - [`TimezoneLookup`] - location to IANA timezone collaborator
//!
//! Normalization is pure: a record either becomes a canonical value or is
//! dropped, and dropped records never fail the surrounding batch.

mod race;
mod record;
mod session;
mod time;
mod timezone;

pub use race::{RaceSchema, absolutize_url, normalize_generated_race, normalize_race};
pub use record::{RawRecord, is_truthy};
pub use session::{SessionSchema, classify, normalize_session};
pub use time::utc_to_local_iso;
pub use timezone::{CountryTimezones, TimezoneLookup};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::hints::SiteHint;
use crate::miner::{RecordKind, find_records};
use crate::model::{CanonicalEvent, CanonicalSession};

/// Inputs shared by every record of one normalization batch.
#[derive(Clone, Copy)]
pub struct NormalizeContext<'a> {
    /// Series id stamped onto every event and used in event ids.
    pub series_id: &'a str,
    /// Page the records came from; relative detail links resolve against it.
    pub page_url: &'a str,
    pub hint: Option<&'a SiteHint>,
    pub timezones: &'a dyn TimezoneLookup,
    /// Start date assumed for records whose start date cannot be read.
    pub fallback_date: NaiveDate,
}

impl std::fmt::Debug for NormalizeContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizeContext")
            .field("series_id", &self.series_id)
            .field("page_url", &self.page_url)
            .field("hint", &self.hint.map(|h| h.domain.as_str()))
            .field("fallback_date", &self.fallback_date)
            .finish_non_exhaustive()
    }
}

/// Normalizes an array of race records, dropping unusable ones.
#[must_use]
pub fn normalize_races(records: &[Value], ctx: &NormalizeContext<'_>) -> Vec<CanonicalEvent> {
    let events: Vec<CanonicalEvent> = records
        .iter()
        .filter_map(RawRecord::from_value)
        .filter_map(|record| normalize_race(&record, ctx))
        .collect();
    if events.len() < records.len() {
        debug!(
            records = records.len(),
            kept = events.len(),
            "Dropped race records without name or start date"
        );
    }
    events
}

/// Normalizes generative-model race records; every object becomes an event.
#[must_use]
pub fn normalize_generated_races(records: &[Value], ctx: &NormalizeContext<'_>) -> Vec<CanonicalEvent> {
    records
        .iter()
        .filter_map(RawRecord::from_value)
        .map(|record| normalize_generated_race(&record, ctx))
        .collect()
}

/// Normalizes an array of session records, keeping only main sessions.
#[must_use]
pub fn normalize_sessions(records: &[Value]) -> Vec<CanonicalSession> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            RawRecord::from_value(value).and_then(|record| normalize_session(&record, index))
        })
        .collect()
}

/// Mines `value` for a race array and normalizes it.
#[must_use]
pub fn events_from_json(value: &Value, ctx: &NormalizeContext<'_>) -> Vec<CanonicalEvent> {
    normalize_races(find_records(value, RecordKind::Race, ctx.hint), ctx)
}

/// Mines `value` for a session array and normalizes it.
#[must_use]
pub fn sessions_from_json(value: &Value, hint: Option<&SiteHint>) -> Vec<CanonicalSession> {
    normalize_sessions(find_records(value, RecordKind::Session, hint))
}
