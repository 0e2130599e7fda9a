//! Post-processing of a successful tier: upcoming filter and session backfill.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::{CanonicalEvent, CanonicalSession};
use crate::normalize::sessions_from_json;
use crate::sources::{CaptureTarget, next_data, scripts_mentioning};

use super::tiers::largest_first;
use super::{Extractor, TierInput, courtesy_pause};

/// URL substrings that mark session-like endpoints on detail pages.
const DETAIL_CAPTURE_PATTERNS: [&str; 5] = ["session", "timetable", "programme", "race", "result"];

/// Keeps events that have not finished yet or have no results.
#[must_use]
pub fn filter_upcoming(events: Vec<CanonicalEvent>, today: NaiveDate) -> Vec<CanonicalEvent> {
    events
        .into_iter()
        .filter(|event| event.last_day() >= today || !event.has_results)
        .collect()
}

impl Extractor {
    /// Fills in sessions for session-less events that link to a detail page.
    ///
    /// Detail pages are visited one at a time with a courtesy delay between
    /// them. Misses leave the event without sessions.
    pub(super) async fn backfill_sessions(&self, events: &mut [CanonicalEvent], input: &TierInput<'_>) {
        let pending = events
            .iter()
            .filter(|e| e.sessions.is_empty() && e.detail_url.is_some())
            .count();
        if pending == 0 {
            return;
        }
        self.report(&format!("Backfilling sessions for {pending} events"));

        let mut visited = 0usize;
        let mut filled = 0usize;
        for event in events.iter_mut() {
            if !event.sessions.is_empty() {
                continue;
            }
            let Some(detail_url) = event.detail_url.clone() else {
                continue;
            };
            if visited > 0 {
                courtesy_pause(self.settings.detail_delay).await;
            }
            visited += 1;

            let sessions = self.detail_sessions(&detail_url, input).await;
            if sessions.is_empty() {
                debug!(event = %event.name, url = %detail_url, "No sessions found on detail page");
            } else {
                debug!(event = %event.name, sessions = sessions.len(), "Backfilled sessions");
                event.sessions = sessions;
                filled += 1;
            }
        }
        info!(visited, filled, "Session backfill finished");
    }

    async fn detail_sessions(&self, detail_url: &str, input: &TierInput<'_>) -> Vec<CanonicalSession> {
        let patterns: Vec<String> = DETAIL_CAPTURE_PATTERNS.iter().map(|p| (*p).to_string()).collect();
        let responses = self
            .capture
            .capture(
                CaptureTarget::new(detail_url).with_tls_verification(input.verify_tls()),
                &patterns,
                self.settings.detail_capture_timeout,
            )
            .await;
        for response in largest_first(responses) {
            if let Some(body) = response.json() {
                let sessions = sessions_from_json(&body, input.hint);
                if !sessions.is_empty() {
                    return sessions;
                }
            }
        }

        let html = match self.fetcher.fetch(detail_url, input.verify_tls()).await {
            Ok(page) if page.is_success() => page.content,
            Ok(page) => {
                debug!(url = %detail_url, status = page.status, "Detail page returned non-success status");
                return Vec::new();
            }
            Err(error) => {
                debug!(url = %detail_url, error = %error, "Detail page fetch failed");
                return Vec::new();
            }
        };

        if let Some(data) = next_data(&html) {
            let sessions = sessions_from_json(&data, input.hint);
            if !sessions.is_empty() {
                return sessions;
            }
        }
        scripts_mentioning(&html, "\"session")
            .iter()
            .map(|value| sessions_from_json(value, input.hint))
            .find(|sessions| !sessions.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Venue;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn event(name: &str, end: &str, has_results: bool) -> CanonicalEvent {
        CanonicalEvent {
            event_id: format!("wec_{name}"),
            series_id: "wec".to_string(),
            name: name.to_string(),
            start_date: date(end),
            end_date: date(end),
            round_number: None,
            has_results,
            detail_url: None,
            venue: Venue::default(),
            sessions: Vec::new(),
        }
    }

    #[test]
    fn test_filter_upcoming_drops_finished_with_results() {
        let today = date("2026-06-01");
        let kept = filter_upcoming(
            vec![
                event("past_done", "2026-03-01", true),
                event("past_no_results", "2026-03-01", false),
                event("today", "2026-06-01", true),
                event("future", "2026-09-01", true),
            ],
            today,
        );
        let names: Vec<&str> = kept.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["past_no_results", "today", "future"]);
    }
}
