//! JSON documents embedded in `<script>` tags.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::compile_static_regex;

const NEXT_DATA_ID: &str = "__NEXT_DATA__";
const NUXT_IDS: [&str; 2] = ["__NUXT_DATA__", "__NUXT__"];

static WINDOW_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?s)window\.__(?:INITIAL_STATE|DATA|PRELOADED_STATE)__\s*=\s*(\{.+?\});")
});

/// Where an embedded document was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedSource {
    /// Next.js `<script id="__NEXT_DATA__">`.
    NextData,
    /// Nuxt `__NUXT_DATA__` / `__NUXT__` script.
    Nuxt,
    /// `window.__INITIAL_STATE__`-style assignment inside a script.
    WindowState,
    /// A script whose whole body is JSON.
    Script,
}

/// One parsed inline JSON document.
#[derive(Debug, Clone)]
pub struct EmbeddedJson {
    pub source: EmbeddedSource,
    pub value: Value,
}

impl EmbeddedJson {
    /// The subtree worth mining.
    ///
    /// For Next.js payloads this is `props.pageProps.pageData` when present,
    /// else `props.pageProps`; other sources are mined whole.
    #[must_use]
    pub fn mining_root(&self) -> &Value {
        if self.source != EmbeddedSource::NextData {
            return &self.value;
        }
        self.value
            .pointer("/props/pageProps/pageData")
            .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))
            .or_else(|| self.value.pointer("/props/pageProps"))
            .unwrap_or(&self.value)
    }
}

struct Script {
    id: Option<String>,
    text: String,
}

fn scripts(html: &str) -> Vec<Script> {
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .map(|element| Script {
            id: element.value().attr("id").map(str::to_string),
            text: element.text().collect::<String>(),
        })
        .filter(|script| !script.text.trim().is_empty())
        .collect()
}

/// Extracts every inline JSON document from a page, in probing order.
///
/// Order: Next.js data, Nuxt data, `window.__*__` assignments, then scripts
/// whose whole body is JSON. Unparsable candidates are skipped.
#[must_use]
pub fn embedded_json(html: &str) -> Vec<EmbeddedJson> {
    let scripts = scripts(html);
    let mut found = Vec::new();

    let with_id = |id: &str| scripts.iter().find(|s| s.id.as_deref() == Some(id));

    if let Some(script) = with_id(NEXT_DATA_ID) {
        push_parsed(&mut found, EmbeddedSource::NextData, &script.text);
    }
    for id in NUXT_IDS {
        if let Some(script) = with_id(id) {
            push_parsed(&mut found, EmbeddedSource::Nuxt, &script.text);
        }
    }

    let anonymous = scripts.iter().filter(|s| {
        s.id.as_deref()
            .is_none_or(|id| id != NEXT_DATA_ID && !NUXT_IDS.contains(&id))
    });
    for script in anonymous {
        for caps in WINDOW_STATE_RE.captures_iter(&script.text) {
            if let Some(body) = caps.get(1) {
                push_parsed(&mut found, EmbeddedSource::WindowState, body.as_str());
            }
        }
        let trimmed = script.text.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            push_parsed(&mut found, EmbeddedSource::Script, trimmed);
        }
    }

    debug!(documents = found.len(), "Collected embedded JSON documents");
    found
}

fn push_parsed(found: &mut Vec<EmbeddedJson>, source: EmbeddedSource, text: &str) {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => found.push(EmbeddedJson { source, value }),
        Err(error) => debug!(source = ?source, error = %error, "Skipping unparsable inline JSON"),
    }
}

/// Returns the parsed Next.js data document, if the page has one.
#[must_use]
pub fn next_data(html: &str) -> Option<Value> {
    scripts(html)
        .into_iter()
        .find(|s| s.id.as_deref() == Some(NEXT_DATA_ID))
        .and_then(|s| serde_json::from_str(s.text.trim()).ok())
}

/// Parses every script that contains `needle` and is valid JSON as a whole.
#[must_use]
pub fn scripts_mentioning(html: &str, needle: &str) -> Vec<Value> {
    scripts(html)
        .into_iter()
        .filter(|s| s.text.contains(needle))
        .filter_map(|s| serde_json::from_str(s.text.trim()).ok())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NEXT_PAGE: &str = r#"<html><head>
        <script id="__NEXT_DATA__" type="application/json">
        {"props":{"pageProps":{"pageData":{"Races":[{"RaceName":"Bahrain"}]}}}}
        </script>
        <script>window.__INITIAL_STATE__ = {"calendar":{"rounds":[1]}};</script>
        <script type="application/ld+json">[{"@type":"SportsEvent"}]</script>
        <script>console.log("not json")</script>
    </head></html>"#;

    #[test]
    fn test_embedded_json_search_order() {
        let docs = embedded_json(NEXT_PAGE);
        let sources: Vec<EmbeddedSource> = docs.iter().map(|d| d.source).collect();
        assert_eq!(
            sources,
            [
                EmbeddedSource::NextData,
                EmbeddedSource::WindowState,
                EmbeddedSource::Script
            ]
        );
    }

    #[test]
    fn test_next_data_mining_root_prefers_page_data() {
        let docs = embedded_json(NEXT_PAGE);
        let root = docs[0].mining_root();
        assert!(root.get("Races").is_some());
    }

    #[test]
    fn test_next_data_mining_root_falls_back_to_page_props() {
        let doc = EmbeddedJson {
            source: EmbeddedSource::NextData,
            value: serde_json::json!({"props": {"pageProps": {"events": []}}}),
        };
        assert!(doc.mining_root().get("events").is_some());
    }

    #[test]
    fn test_nuxt_script_detected() {
        let html = r#"<script id="__NUXT_DATA__" type="application/json">[{"races":[]}]</script>"#;
        let docs = embedded_json(html);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, EmbeddedSource::Nuxt);
    }

    #[test]
    fn test_no_scripts_yields_nothing() {
        assert!(embedded_json("<html><body><p>Calendar</p></body></html>").is_empty());
        assert!(next_data("<html></html>").is_none());
    }

    #[test]
    fn test_scripts_mentioning() {
        let html = r#"<script>{"sessions":[{"name":"FP1"}]}</script><script>{"other":1}</script>"#;
        let found = scripts_mentioning(html, "\"session");
        assert_eq!(found.len(), 1);
    }
}
