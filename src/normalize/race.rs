//! Race record normalization.

use tracing::debug;
use url::Url;

use crate::hints::HintField;
use crate::model::{CanonicalEvent, Venue, date_prefix};
use crate::series::slugify;

use super::NormalizeContext;
use super::record::RawRecord;
use super::session::normalize_session;

/// Upstream family a race record belongs to, chosen by key-set probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceSchema {
    /// Formula 1 family Next.js payloads (`RaceName`, `RaceStartDate`...).
    NextData,
    /// `PulseLive` race feeds (`sequence`, `city`, `date`, `hasRaceResults`).
    PulseLive,
    /// `OpenF1` style meetings (`meeting_name`, `date_start`).
    OpenF1,
    Generic,
}

/// Alias chains preferred by one schema, searched before the generic chains.
struct SchemaAliases {
    name: &'static [&'static str],
    start: &'static [&'static str],
    end: &'static [&'static str],
    city: &'static [&'static str],
    round: &'static [&'static str],
}

const GENERIC: SchemaAliases = SchemaAliases {
    name: &["circuitshortname", "racename", "name", "circuitname", "meeting_name"],
    start: &["racestartdate", "start_date", "date_start", "date"],
    end: &["raceenddate", "end_date", "date_end"],
    city: &["circuitshortname", "city", "place", "location"],
    round: &["roundnumber", "round", "round_number", "sequence"],
};

const NEXT_DATA: SchemaAliases = SchemaAliases {
    name: &["racename", "circuitshortname"],
    start: &["racestartdate"],
    end: &["raceenddate"],
    city: &["circuitshortname"],
    round: &["roundnumber"],
};

const PULSE_LIVE: SchemaAliases = SchemaAliases {
    name: &["racename", "name", "city"],
    start: &["date", "racedate"],
    end: &["enddate", "date_end"],
    city: &["city"],
    round: &["sequence"],
};

const OPEN_F1: SchemaAliases = SchemaAliases {
    name: &["meeting_name", "meeting_official_name"],
    start: &["date_start"],
    end: &["date_end"],
    city: &["location", "circuit_short_name"],
    round: &[],
};

const NO_ALIASES: SchemaAliases = SchemaAliases {
    name: &[],
    start: &[],
    end: &[],
    city: &[],
    round: &[],
};

const COUNTRY_KEYS: [&str; 3] = ["countryname", "country", "country_name"];
const COUNTRY_CODE_KEYS: [&str; 2] = ["countrycode", "country_code"];
const TIMEZONE_KEYS: [&str; 2] = ["timezone", "tz"];
const REGION_KEYS: [&str; 2] = ["region", "state"];
const CIRCUIT_NAME_KEYS: [&str; 3] = ["circuitname", "circuit_name", "circuit"];
const DETAIL_KEYS: [&str; 3] = ["url", "detail_url", "link"];
const DETAIL_PATH_KEYS: [&str; 2] = ["racepath", "eventpath"];
const RESULTS_KEYS: [&str; 2] = ["hasraceresults", "has_results"];
const SESSION_KEYS: [&str; 3] = ["sessions", "sessionresults", "session_results"];

impl RaceSchema {
    /// Chooses the schema from the record's key set.
    #[must_use]
    pub fn detect(record: &RawRecord<'_>) -> Self {
        if record.has_any(&["racename", "racestartdate", "roundnumber"]) {
            Self::NextData
        } else if record.has_any(&["sequence", "racelivestatus"])
            || (record.has("hasraceresults") && record.has("city"))
        {
            Self::PulseLive
        } else if record.has_any(&["meeting_name", "meeting_key"]) {
            Self::OpenF1
        } else {
            Self::Generic
        }
    }

    fn aliases(self) -> &'static SchemaAliases {
        match self {
            Self::NextData => &NEXT_DATA,
            Self::PulseLive => &PULSE_LIVE,
            Self::OpenF1 => &OPEN_F1,
            Self::Generic => &NO_ALIASES,
        }
    }
}

/// Name used for generated records that carry none.
const UNKNOWN_EVENT_NAME: &str = "Unknown Event";

/// Builds a lookup chain: schema keys, then generic keys, then hint aliases.
///
/// Hint aliases steer mining towards the right array; inside a record the
/// known schema keys still win.
fn chain<'k>(
    schema: &'static [&'static str],
    generic: &'static [&'static str],
    hinted: &'k [String],
) -> impl Iterator<Item = &'k str> {
    schema
        .iter()
        .copied()
        .chain(generic.iter().copied())
        .chain(hinted.iter().map(String::as_str))
}

fn hint_aliases<'c>(ctx: &NormalizeContext<'c>, field: HintField) -> &'c [String] {
    ctx.hint.map(|h| h.aliases(field)).unwrap_or_default()
}

/// Normalizes one scraped race record.
///
/// Returns `None` when the record has no name or no start date at all. A
/// start date that is present but unreadable falls back to
/// [`NormalizeContext::fallback_date`].
#[must_use]
pub fn normalize_race(record: &RawRecord<'_>, ctx: &NormalizeContext<'_>) -> Option<CanonicalEvent> {
    let schema = RaceSchema::detect(record);
    let preferred = schema.aliases();
    let name = record.first_str(chain(preferred.name, GENERIC.name, hint_aliases(ctx, HintField::Name)))?;
    let start_raw =
        record.first_str(chain(preferred.start, GENERIC.start, hint_aliases(ctx, HintField::Start)))?;
    Some(build_race(record, ctx, schema, name, Some(start_raw)))
}

/// Normalizes one race record produced by a generative model.
///
/// Generated records are never dropped: a missing name becomes
/// `"Unknown Event"` and a missing or unreadable start date falls back to
/// [`NormalizeContext::fallback_date`].
#[must_use]
pub fn normalize_generated_race(record: &RawRecord<'_>, ctx: &NormalizeContext<'_>) -> CanonicalEvent {
    let schema = RaceSchema::detect(record);
    let preferred = schema.aliases();
    let name = record
        .first_str(chain(preferred.name, GENERIC.name, hint_aliases(ctx, HintField::Name)))
        .unwrap_or_else(|| UNKNOWN_EVENT_NAME.to_string());
    let start_raw =
        record.first_str(chain(preferred.start, GENERIC.start, hint_aliases(ctx, HintField::Start)));
    build_race(record, ctx, schema, name, start_raw)
}

fn build_race(
    record: &RawRecord<'_>,
    ctx: &NormalizeContext<'_>,
    schema: RaceSchema,
    name: String,
    start_raw: Option<String>,
) -> CanonicalEvent {
    let preferred = schema.aliases();
    let embedded_venue = record.first_object(["venue"]);

    let start_date = match start_raw.as_deref().and_then(date_prefix) {
        Some(date) => date,
        None => {
            debug!(name = %name, start = ?start_raw, fallback = %ctx.fallback_date, "Unreadable start date");
            ctx.fallback_date
        }
    };
    let end_date = record
        .first_str(chain(preferred.end, GENERIC.end, &[]))
        .and_then(|raw| date_prefix(&raw))
        .filter(|end| *end >= start_date)
        .unwrap_or(start_date);

    let venue = build_venue(record, embedded_venue.as_ref(), schema, &name, ctx);

    let round_number = record
        .first_str(chain(preferred.round, GENERIC.round, &[]))
        .and_then(|raw| raw.parse::<u32>().ok());
    let event_id = match round_number {
        Some(round) => format!("{}_{round}", ctx.series_id),
        None => format!("{}_{}", ctx.series_id, slugify(&name)),
    };

    let session_keys = hint_aliases(ctx, HintField::Sessions)
        .iter()
        .map(String::as_str)
        .chain(SESSION_KEYS);
    let sessions = record
        .first_array(session_keys)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    RawRecord::from_value(item).and_then(|sess| normalize_session(&sess, index))
                })
                .collect()
        })
        .unwrap_or_default();

    CanonicalEvent {
        event_id,
        series_id: ctx.series_id.to_string(),
        name,
        start_date,
        end_date,
        round_number,
        has_results: record.flag(RESULTS_KEYS),
        detail_url: detail_url(record, ctx.page_url),
        venue,
        sessions,
    }
}

fn build_venue(
    record: &RawRecord<'_>,
    embedded: Option<&RawRecord<'_>>,
    schema: RaceSchema,
    name: &str,
    ctx: &NormalizeContext<'_>,
) -> Venue {
    let from_record_or_venue = |keys: &[&str]| {
        record
            .first_str(keys.iter().copied())
            .or_else(|| embedded.and_then(|v| v.first_str(keys.iter().copied())))
    };

    let circuit = match record.first_object(["circuit"]) {
        Some(object) => object.first_str(["circuitname", "name"]),
        None => record.first_str(CIRCUIT_NAME_KEYS),
    }
    .or_else(|| embedded.and_then(|v| v.first_str(["circuit", "circuit_name", "name"])));

    let city = record
        .first_str(chain(schema.aliases().city, GENERIC.city, &[]))
        .or_else(|| embedded.and_then(|v| v.first_str(["city", "location"])))
        .unwrap_or_default();

    let mut country = from_record_or_venue(&COUNTRY_KEYS[..]).unwrap_or_default();
    let mut country_code = from_record_or_venue(&COUNTRY_CODE_KEYS[..]);
    if country.len() == 2 && country.chars().all(|c| c.is_ascii_uppercase()) {
        country_code = Some(std::mem::take(&mut country));
    }

    let timezone = from_record_or_venue(&TIMEZONE_KEYS[..])
        .or_else(|| {
            [country_code.as_deref(), Some(country.as_str()), Some(city.as_str())]
                .into_iter()
                .flatten()
                .filter(|location| !location.is_empty())
                .find_map(|location| ctx.timezones.timezone_for(location))
        })
        .or_else(|| ctx.hint.and_then(|h| h.timezone.clone()))
        .unwrap_or_else(|| "UTC".to_string());

    let circuit = circuit
        .filter(|c| !c.is_empty())
        .or_else(|| (!city.is_empty()).then(|| city.clone()))
        .unwrap_or_else(|| name.to_string());

    Venue {
        circuit,
        region: from_record_or_venue(&REGION_KEYS[..]),
        country: if country.is_empty() {
            country_code.clone().unwrap_or_default()
        } else {
            country
        },
        country_code,
        city,
        timezone,
    }
}

fn detail_url(record: &RawRecord<'_>, page_url: &str) -> Option<String> {
    let page = Url::parse(page_url).ok();

    let from_metadata = record
        .first_object(["metadata"])
        .and_then(|meta| meta.first_str(DETAIL_PATH_KEYS))
        .and_then(|path| {
            let origin = page.as_ref()?.origin().ascii_serialization();
            Url::parse(&origin).ok()?.join(&path).ok()
        })
        .map(|url| url.to_string());
    if from_metadata.is_some() {
        return from_metadata;
    }

    let explicit = record.first_str(DETAIL_KEYS)?;
    match page.as_ref() {
        Some(base) => absolutize_url(&explicit, base),
        None => Some(explicit),
    }
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Absolute `http(s)` URLs are returned unchanged and `//host/...` becomes
/// `https://host/...`.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base_url.join(value).ok().map(|url| url.to_string())
}
