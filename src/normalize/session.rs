//! Session record normalization and classification.

use crate::model::{CanonicalSession, SessionKind, SessionStatus};

use super::record::RawRecord;
use super::time::utc_to_local_iso;

const NAME_KEYS: [&str; 3] = ["sessionname", "name", "session_name"];
const SHORT_NAME_KEYS: [&str; 2] = ["sessionshortname", "shortname"];
const TYPE_KEYS: [&str; 3] = ["sessiontype", "type", "sessioncode"];
const START_KEYS: [&str; 4] = ["sessionstarttime", "start_time", "start", "session_start_time"];
const END_KEYS: [&str; 4] = ["sessionendtime", "end_time", "end", "session_end_time"];
const STATUS_KEYS: [&str; 2] = ["sessionlivestatus", "status"];
const ID_KEYS: [&str; 2] = ["id", "sessionid"];

const SPLIT_DATE_KEY: &str = "sessiondate";
const SPLIT_START_KEY: &str = "starttime";
const SPLIT_END_KEYS: [&str; 3] = ["contingencyfinishtime", "finishtime", "endtime"];
const SPLIT_OFFSET_KEY: &str = "offsetgmt";

/// How a session record encodes its times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSchema {
    /// Full ISO timestamps (`sessionStartTime`, `start`...).
    Timestamped,
    /// Separate `sessionDate`, UTC `startTime` and `offsetGMT` fields.
    SplitUtc,
    /// Name only, no usable times.
    Generic,
}

impl SessionSchema {
    /// Chooses the schema from the record's key set.
    #[must_use]
    pub fn detect(record: &RawRecord<'_>) -> Self {
        if record.first_str(START_KEYS).is_some() {
            Self::Timestamped
        } else if record.flag([SPLIT_DATE_KEY]) && record.flag([SPLIT_START_KEY]) {
            Self::SplitUtc
        } else {
            Self::Generic
        }
    }
}

/// Classifies a session from its explicit type code, name and short name.
///
/// A type code naming a retained kind wins. Otherwise keywords are checked in priority
/// order: practice, qualifying, sprint, feature race, race, warm-up.
#[must_use]
pub fn classify(name: &str, short_name: &str, type_code: &str) -> SessionKind {
    if let Some(kind) = SessionKind::from_code(type_code) {
        return kind;
    }

    let name = name.to_uppercase();
    let short = short_name.trim().to_uppercase();
    let code = type_code.trim().to_uppercase();

    if name.contains("PRACTICE") || short.contains("PRAC") {
        SessionKind::Practice
    } else if name.contains("QUAL") || short.contains("QUAL") {
        SessionKind::Qualifying
    } else if name.contains("SPRINT") || short == "SR" {
        SessionKind::Sprint
    } else if name.contains("FEATURE") || short == "FR" {
        SessionKind::Race
    } else if name.contains("RACE") || code == "RESULT" {
        SessionKind::Race
    } else if name.contains("WARM") {
        SessionKind::Warmup
    } else {
        SessionKind::Other
    }
}

/// Normalizes one session record; `index` is its position in the source array.
///
/// Returns `None` for records with neither a name nor a start time, and for
/// sessions outside practice, qualifying, sprint and race.
#[must_use]
pub fn normalize_session(record: &RawRecord<'_>, index: usize) -> Option<CanonicalSession> {
    let name = record.first_str(NAME_KEYS).unwrap_or_default();
    let short_name = record.first_str(SHORT_NAME_KEYS).unwrap_or_default();
    let type_code = record.first_str(TYPE_KEYS).unwrap_or_default();

    let (start, end) = match SessionSchema::detect(record) {
        SessionSchema::Timestamped => (record.first_str(START_KEYS), record.first_str(END_KEYS)),
        SessionSchema::SplitUtc => split_utc_times(record),
        SessionSchema::Generic => (None, record.first_str(END_KEYS)),
    };

    if name.is_empty() && start.is_none() {
        return None;
    }

    let kind = classify(&name, &short_name, &type_code);
    if !kind.is_retained() {
        return None;
    }

    let status = record
        .first_str(STATUS_KEYS)
        .map_or(SessionStatus::Scheduled, |label| SessionStatus::from_label(&label));
    let session_id = record
        .first_str(ID_KEYS)
        .unwrap_or_else(|| format!("s{}", index + 1));
    let display_name = if !name.is_empty() {
        name
    } else if !short_name.is_empty() {
        short_name
    } else {
        kind.as_str().to_string()
    };

    Some(CanonicalSession {
        session_id,
        kind,
        name: display_name,
        start,
        end,
        status,
    })
}

fn split_utc_times(record: &RawRecord<'_>) -> (Option<String>, Option<String>) {
    let (Some(date), Some(utc_start)) = (
        record.first_str([SPLIT_DATE_KEY]),
        record.first_str([SPLIT_START_KEY]),
    ) else {
        return (None, None);
    };
    let offset = record
        .first_str([SPLIT_OFFSET_KEY])
        .unwrap_or_else(|| "00:00".to_string());

    let start = utc_to_local_iso(&date, &utc_start, &offset);
    let end = record
        .first_str(SPLIT_END_KEYS)
        .map(|finish| utc_to_local_iso(&date, &finish, &offset));
    (Some(start), end)
}
