//! Depth-bounded search for race-like or session-like arrays in arbitrary JSON.
//!
//! Calendar sites ship their data in wildly different envelopes. Rather than
//! knowing each one, the miner walks the document looking for the first array
//! whose elements carry a recognizable key vocabulary.

use serde_json::{Map, Value};

use crate::hints::{HintField, SiteHint};

/// What kind of array to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Race,
    Session,
}

impl RecordKind {
    /// Maximum nesting depth searched; deeper values are never inspected.
    #[must_use]
    pub fn depth_bound(self) -> usize {
        match self {
            Self::Race => 5,
            Self::Session => 8,
        }
    }

    fn signal_keys(self) -> &'static [&'static str] {
        match self {
            Self::Race => &RACE_SIGNAL_KEYS,
            Self::Session => &SESSION_SIGNAL_KEYS,
        }
    }

    fn container_keys(self) -> &'static [&'static str] {
        match self {
            Self::Race => &RACE_CONTAINER_KEYS,
            Self::Session => &SESSION_CONTAINER_KEYS,
        }
    }

    fn container_alias_field(self) -> HintField {
        match self {
            Self::Race => HintField::Events,
            Self::Session => HintField::Sessions,
        }
    }
}

const RACE_SIGNAL_KEYS: [&str; 11] = [
    "raceid",
    "roundnumber",
    "racestartdate",
    "raceenddate",
    "start_date",
    "date_start",
    "circuitname",
    "circuitshortname",
    "circuit_name",
    "sessions",
    "hasraceresults",
];

/// A race array also matches when one key from each of these sets is present.
const RACE_PAIR_PRIMARY: [&str; 4] = ["sequence", "circuit", "hasraceresults", "racelivestatus"];
const RACE_PAIR_SECONDARY: [&str; 4] = ["name", "date", "city", "country"];

const RACE_CONTAINER_KEYS: [&str; 10] = [
    "Races", "races", "Events", "events", "Calendar", "calendar", "Meetings", "meetings",
    "Rounds", "rounds",
];

const SESSION_SIGNAL_KEYS: [&str; 8] = [
    "sessionname",
    "session_name",
    "sessiontype",
    "sessiondate",
    "sessionstarttime",
    "starttime",
    "start_time",
    "session_start_time",
];

const SESSION_CONTAINER_KEYS: [&str; 7] = [
    "sessions",
    "Sessions",
    "SessionResults",
    "sessionResults",
    "session_results",
    "timetable",
    "programme",
];

/// Finds the first array of `kind` records inside `value`.
///
/// Never fails: a miss is an empty slice.
#[must_use]
pub fn find_records<'a>(value: &'a Value, kind: RecordKind, hint: Option<&SiteHint>) -> &'a [Value] {
    find_at_depth(value, kind, hint, 0).unwrap_or_default()
}

fn find_at_depth<'a>(
    value: &'a Value,
    kind: RecordKind,
    hint: Option<&SiteHint>,
    depth: usize,
) -> Option<&'a [Value]> {
    if depth > kind.depth_bound() {
        return None;
    }

    match value {
        Value::Array(items) => accepts_array(items, kind, hint, false).then_some(items.as_slice()),
        Value::Object(map) => {
            if let Some(found) = find_in_containers(map, kind, hint) {
                return Some(found);
            }
            map.values()
                .find_map(|child| find_at_depth(child, kind, hint, depth + 1))
        }
        _ => None,
    }
}

fn find_in_containers<'a>(
    map: &'a Map<String, Value>,
    kind: RecordKind,
    hint: Option<&SiteHint>,
) -> Option<&'a [Value]> {
    let hinted = hint
        .map(|h| h.aliases(kind.container_alias_field()))
        .unwrap_or_default();
    let keys = hinted
        .iter()
        .map(String::as_str)
        .chain(kind.container_keys().iter().copied());

    for key in keys {
        if let Some(Value::Array(items)) = map.get(key)
            && accepts_array(items, kind, hint, true)
        {
            return Some(items.as_slice());
        }
    }
    None
}

fn accepts_array(items: &[Value], kind: RecordKind, hint: Option<&SiteHint>, in_container: bool) -> bool {
    let Some(first) = items.first() else {
        return false;
    };
    let Some(sample) = first.as_object() else {
        return false;
    };
    let keys: Vec<String> = sample.keys().map(|k| k.to_ascii_lowercase()).collect();
    let has = |candidate: &str| keys.iter().any(|k| k == candidate);
    let has_any = |candidates: &[&str]| candidates.iter().any(|c| has(*c));

    if has_any(kind.signal_keys()) {
        return true;
    }

    match kind {
        RecordKind::Race => {
            if has_any(&RACE_PAIR_PRIMARY[..]) && has_any(&RACE_PAIR_SECONDARY[..]) {
                return true;
            }
            hint.is_some_and(|h| {
                let names = h.aliases(HintField::Name);
                let starts = h.aliases(HintField::Start);
                !names.is_empty()
                    && !starts.is_empty()
                    && names.iter().any(|n| has(n.to_ascii_lowercase().as_str()))
                    && starts.iter().any(|s| has(s.to_ascii_lowercase().as_str()))
            })
        }
        RecordKind::Session => in_container && has("name"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hints::HintStrategy;
    use serde_json::json;

    #[test]
    fn test_finds_f1_style_races_under_unknown_wrapper() {
        let doc = json!({
            "props": {"pageProps": {"season": {"items": [
                {"RaceName": "Bahrain", "RaceStartDate": "2026-03-06", "RoundNumber": 1}
            ]}}}
        });
        let races = find_records(&doc, RecordKind::Race, None);
        assert_eq!(races.len(), 1);
        assert_eq!(races[0]["RaceName"], "Bahrain");
    }

    #[test]
    fn test_container_key_wins_over_recursion_order() {
        let doc = json!({
            "other": {"list": [{"raceId": 99, "name": "decoy"}]},
            "races": [{"circuit": "Jeddah", "name": "Saudi", "date": "2026-03-20"}]
        });
        let races = find_records(&doc, RecordKind::Race, None);
        assert_eq!(races[0]["name"], "Saudi");
    }

    #[test]
    fn test_pair_rule_requires_both_sets() {
        let only_primary = json!([{"sequence": 1, "venue": "x"}]);
        assert!(find_records(&only_primary, RecordKind::Race, None).is_empty());

        let both = json!([{"sequence": 1, "city": "Mexico City"}]);
        assert_eq!(find_records(&both, RecordKind::Race, None).len(), 1);
    }

    #[test]
    fn test_hint_name_and_start_aliases_accept_array() {
        let hint = SiteHint::new("example.com", HintStrategy::Auto)
            .with_aliases(HintField::Name, &["Title"])
            .with_aliases(HintField::Start, &["Begins"]);
        let doc = json!({"data": [{"Title": "Round 1", "Begins": "2026-04-01"}]});
        assert!(find_records(&doc, RecordKind::Race, None).is_empty());
        assert_eq!(find_records(&doc, RecordKind::Race, Some(&hint)).len(), 1);
    }

    #[test]
    fn test_hint_events_alias_checked_first() {
        let hint = SiteHint::new("example.com", HintStrategy::Auto)
            .with_aliases(HintField::Events, &["fixtures"]);
        let doc = json!({
            "races": [{"raceId": 1, "name": "second"}],
            "fixtures": [{"raceId": 2, "name": "first"}]
        });
        let races = find_records(&doc, RecordKind::Race, Some(&hint));
        assert_eq!(races[0]["name"], "first");
    }

    #[test]
    fn test_deep_nesting_beyond_bound_not_found() {
        let mut doc = json!([{"raceId": 1}]);
        for _ in 0..50 {
            doc = json!({"wrap": doc});
        }
        assert!(find_records(&doc, RecordKind::Race, None).is_empty());
    }

    #[test]
    fn test_depth_bound_edges() {
        let mut at_bound = json!([{"raceId": 1}]);
        for _ in 0..5 {
            at_bound = json!({"w": at_bound});
        }
        assert_eq!(find_records(&at_bound, RecordKind::Race, None).len(), 1);

        let past_bound = json!({"w": at_bound});
        assert!(find_records(&past_bound, RecordKind::Race, None).is_empty());
    }

    #[test]
    fn test_session_container_accepts_plain_name() {
        let doc = json!({"event": {"timetable": [{"name": "FP1", "start": "2026-03-06T11:30:00Z"}]}});
        assert_eq!(find_records(&doc, RecordKind::Session, None).len(), 1);

        let bare = json!({"event": {"list": [{"name": "FP1"}]}});
        assert!(find_records(&bare, RecordKind::Session, None).is_empty());
    }

    #[test]
    fn test_session_signal_keys() {
        let doc = json!({"a": {"b": [{"sessionName": "Race", "sessionDate": "2026-03-08"}]}});
        assert_eq!(find_records(&doc, RecordKind::Session, None).len(), 1);
    }

    #[test]
    fn test_scalars_and_empty_arrays_not_found() {
        assert!(find_records(&json!(42), RecordKind::Race, None).is_empty());
        assert!(find_records(&json!([]), RecordKind::Race, None).is_empty());
        assert!(find_records(&json!({"races": []}), RecordKind::Race, None).is_empty());
        assert!(find_records(&json!(["raceId"]), RecordKind::Race, None).is_empty());
    }
}
