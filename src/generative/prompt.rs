//! Page cleaning and prompt construction.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::compile_static_regex;

/// Default character ceiling for cleaned page content.
pub const DEFAULT_PROMPT_CEILING: usize = 300_000;

const TRUNCATION_MARKER: &str = "\n... (truncated)";

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<script\b.*?</script>"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<style\b.*?</style>"));
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<!--.*?-->"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"\s{2,}"));

/// Strips scripts, styles and comments, collapses whitespace runs and caps the length.
///
/// Content longer than `max_chars` characters is cut and `"\n... (truncated)"`
/// appended.
#[must_use]
pub fn clean_html(html: &str, max_chars: usize) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let without_styles = STYLE_RE.replace_all(&without_scripts, "");
    let without_comments = COMMENT_RE.replace_all(&without_styles, "");
    let collapsed = WHITESPACE_RE.replace_all(&without_comments, " ");

    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            warn!(
                chars = collapsed.chars().count(),
                max_chars, "Page content truncated for prompt"
            );
            format!("{}{TRUNCATION_MARKER}", &collapsed[..cut])
        }
        None => collapsed.into_owned(),
    }
}

fn with_site_context(prompt: String, site_context: Option<&str>) -> String {
    match site_context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{prompt}\n\n**IMPORTANT Site-Specific Hints:**\n{context}"),
        None => prompt,
    }
}

/// Single-pass prompt: the whole season including sessions.
#[must_use]
pub fn full_extraction_prompt(
    cleaned_html: &str,
    series_name: &str,
    season: i32,
    site_context: Option<&str>,
) -> String {
    let prompt = format!(
        r#"You are an expert at extracting motorsport schedule data from web pages.

Extract ALL race events for **{series_name} {season}** from the HTML below.

Return ONLY valid JSON:

{{
  "name": "{series_name}",
  "season": {season},
  "events": [
    {{
      "name": "Event Name",
      "round_number": 1,
      "start_date": "YYYY-MM-DD",
      "end_date": "YYYY-MM-DD",
      "venue": {{
        "circuit": "Circuit Name",
        "city": "City",
        "country": "Country",
        "timezone": "Europe/London"
      }},
      "sessions": [
        {{
          "name": "Practice 1",
          "type": "PRACTICE",
          "start": "YYYY-MM-DDTHH:MM:SS+HH:MM",
          "end": "YYYY-MM-DDTHH:MM:SS+HH:MM",
          "status": "SCHEDULED"
        }}
      ]
    }}
  ]
}}

**Instructions:**
- Extract every event and its sessions
- Session types: PRACTICE, QUALIFYING, SPRINT, RACE, WARMUP, TEST, OTHER
- Session status: SCHEDULED, TBD, UPDATED, CANCELLED
- Use ISO 8601 dates, and datetimes with a timezone offset
- Use an empty sessions array when an event lists no sessions
- timezone: IANA name inferred from the venue when not stated

HTML Content:
{cleaned_html}"#
    );
    with_site_context(prompt, site_context)
}

/// Phase one prompt: events, dates, venues and detail links only.
#[must_use]
pub fn calendar_prompt(
    cleaned_html: &str,
    series_name: &str,
    season: i32,
    page_url: &str,
    site_context: Option<&str>,
) -> String {
    let prompt = format!(
        r#"You are an expert at extracting motorsport schedule data from web pages.

From the HTML below, extract ALL race events or rounds for **{series_name} {season}**.

For each event return:
- name: event or Grand Prix name
- start_date / end_date: YYYY-MM-DD
- url: absolute link to the event's own detail page
- venue: circuit, city, country, timezone

The page URL is {page_url}; resolve relative links against it.

Return ONLY a valid JSON array:

[
  {{
    "name": "Qatar Grand Prix",
    "start_date": "2026-03-06",
    "end_date": "2026-03-08",
    "url": "https://example.com/event/qatar-gp",
    "venue": {{
      "circuit": "Lusail International Circuit",
      "city": "Lusail",
      "country": "Qatar",
      "timezone": "Asia/Qatar"
    }}
  }}
]

**Instructions:**
- Include events without dates yet, using null for missing dates
- The url matters most: look for <a href> links in or around each event entry
- Use null for url when an event has no page of its own
- timezone: infer from the venue if not stated

HTML Content:
{cleaned_html}"#
    );
    with_site_context(prompt, site_context)
}

/// Phase two prompt: sessions of one event from its detail page.
#[must_use]
pub fn sessions_prompt(
    cleaned_html: &str,
    event_name: &str,
    series_name: &str,
    season: i32,
    site_context: Option<&str>,
) -> String {
    let prompt = format!(
        r#"You are an expert at extracting motorsport session schedules from web pages.

From the HTML below, extract ALL sessions of **{event_name}** ({series_name} {season}).

Return ONLY a valid JSON array:

[
  {{
    "name": "Free Practice 1",
    "type": "PRACTICE",
    "start": "YYYY-MM-DDTHH:MM:SS+HH:MM",
    "end": "YYYY-MM-DDTHH:MM:SS+HH:MM",
    "status": "SCHEDULED"
  }}
]

**Instructions:**
- Session types: PRACTICE, QUALIFYING, SPRINT, RACE, WARMUP, TEST, OTHER
- Status: SCHEDULED, TBD, UPDATED, CANCELLED
- Datetimes are ISO 8601 WITH a timezone offset; use null when unknown
- Look for schedule tables, timetables and session listings
- Return [] when the page shows no sessions at all

HTML Content:
{cleaned_html}"#
    );
    with_site_context(prompt, site_context)
}
