//! Per-domain site hints consulted before generic extraction.
//!
//! A [`SiteHint`] tells the extractor about a known calendar site: whether it
//! exposes a JSON API, which field names it uses, which captured endpoints are
//! interesting, and which timezone to assume. Every tier works without hints;
//! a hint only ever narrows or shortcuts the search.
//!
//! The [`HintRegistry`] is built once (see [`build_default_hint_registry`])
//! and then shared read-only.

mod builtin;

pub use builtin::build_default_hint_registry;

use std::collections::HashMap;

use tracing::debug;
use url::Url;

/// How a site is best approached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintStrategy {
    /// A JSON API endpoint returns the season directly.
    Api,
    /// The page embeds its data in a Next.js `__NEXT_DATA__` script.
    NextData,
    /// The page renders client side; network capture or generation is needed.
    Playwright,
    /// No preference.
    Auto,
}

/// Logical record fields that may carry site-specific key aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintField {
    /// Container key holding the race array.
    Events,
    /// Race name key.
    Name,
    /// Race start date key.
    Start,
    /// Container key holding a race's sessions.
    Sessions,
}

/// Known facts about one calendar site.
#[derive(Debug, Clone)]
pub struct SiteHint {
    /// Registered domain without `www.` (e.g. `fiawec.com`).
    pub domain: String,
    pub strategy: HintStrategy,
    /// API URL; `{year}` is replaced with the requested season.
    pub api_url: Option<String>,
    aliases: HashMap<HintField, Vec<String>>,
    /// Substrings identifying interesting captured response URLs.
    pub network_patterns: Vec<String>,
    /// Free text appended to generative prompts.
    pub ai_context: Option<String>,
    /// IANA timezone assumed when a record carries no location.
    pub timezone: Option<String>,
    /// False for sites with broken certificate chains.
    pub verify_tls: bool,
}

impl SiteHint {
    /// Creates a hint with the given domain and strategy and nothing else.
    #[must_use]
    pub fn new(domain: impl Into<String>, strategy: HintStrategy) -> Self {
        Self {
            domain: domain.into(),
            strategy,
            api_url: None,
            aliases: HashMap::new(),
            network_patterns: Vec::new(),
            ai_context: None,
            timezone: None,
            verify_tls: true,
        }
    }

    /// Sets the API URL template.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the alias list for one logical field.
    #[must_use]
    pub fn with_aliases(mut self, field: HintField, keys: &[&str]) -> Self {
        self.aliases
            .insert(field, keys.iter().map(|k| (*k).to_string()).collect());
        self
    }

    #[must_use]
    pub fn with_network_patterns(mut self, patterns: &[&str]) -> Self {
        self.network_patterns = patterns.iter().map(|p| (*p).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_ai_context(mut self, context: impl Into<String>) -> Self {
        self.ai_context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Disables certificate verification for this site.
    #[must_use]
    pub fn without_tls_verification(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Returns the aliases registered for `field`, empty when none.
    #[must_use]
    pub fn aliases(&self, field: HintField) -> &[String] {
        self.aliases
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the API URL with the season substituted, when the hint-API tier applies.
    #[must_use]
    pub fn api_url_for(&self, season: i32) -> Option<String> {
        if self.strategy != HintStrategy::Api {
            return None;
        }
        self.api_url
            .as_deref()
            .map(|template| template.replace("{year}", &season.to_string()))
    }
}

/// Immutable domain to [`SiteHint`] mapping.
pub struct HintRegistry {
    hints: HashMap<String, SiteHint>,
}

impl HintRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hints: HashMap::new(),
        }
    }

    /// Registers a hint, replacing any previous hint for the same domain.
    pub fn register(&mut self, hint: SiteHint) {
        debug!(domain = %hint.domain, strategy = ?hint.strategy, "Registering site hint");
        self.hints.insert(hint.domain.to_ascii_lowercase(), hint);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Finds the hint for a page URL.
    ///
    /// An exact hostname match wins; otherwise the longest registered domain
    /// that the hostname ends with on a label boundary is used. Unparsable
    /// URLs and unknown hosts yield `None`.
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<&SiteHint> {
        let parsed = Url::parse(url.trim()).ok()?;
        let host = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();

        if let Some(hint) = self.hints.get(&host) {
            return Some(hint);
        }

        self.hints
            .iter()
            .filter(|(domain, _)| host.ends_with(&format!(".{domain}")))
            .max_by_key(|(domain, _)| domain.len())
            .map(|(_, hint)| hint)
    }
}

impl std::fmt::Debug for HintRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut domains: Vec<&str> = self.hints.keys().map(String::as_str).collect();
        domains.sort_unstable();
        f.debug_struct("HintRegistry")
            .field("hint_count", &self.hints.len())
            .field("domains", &domains)
            .finish()
    }
}

impl Default for HintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry_with(domains: &[&str]) -> HintRegistry {
        let mut registry = HintRegistry::new();
        for domain in domains {
            registry.register(SiteHint::new(*domain, HintStrategy::Auto));
        }
        registry
    }

    #[test]
    fn test_lookup_exact_host() {
        let registry = registry_with(&["fiawec.com"]);
        let hint = registry.lookup("https://fiawec.com/en/season/calendar").unwrap();
        assert_eq!(hint.domain, "fiawec.com");
    }

    #[test]
    fn test_lookup_www_subdomain_matches_registered_domain() {
        let registry = registry_with(&["fiawec.com"]);
        let hint = registry.lookup("https://www.fiawec.com/en/calendar").unwrap();
        assert_eq!(hint.domain, "fiawec.com");
    }

    #[test]
    fn test_lookup_unknown_host_none() {
        let registry = registry_with(&["fiawec.com"]);
        assert!(registry.lookup("https://example.com/calendar").is_none());
    }

    #[test]
    fn test_lookup_requires_label_boundary() {
        let registry = registry_with(&["wrc.com"]);
        assert!(registry.lookup("https://fakewrc.com/").is_none());
        assert!(registry.lookup("https://www.wrc.com/").is_some());
    }

    #[test]
    fn test_lookup_prefers_longest_domain() {
        let registry = registry_with(&["example.com", "races.example.com"]);
        let hint = registry.lookup("https://www.races.example.com/").unwrap();
        assert_eq!(hint.domain, "races.example.com");
    }

    #[test]
    fn test_lookup_ignores_port_and_case() {
        let registry = registry_with(&["127.0.0.1", "btcc.net"]);
        assert!(registry.lookup("http://127.0.0.1:8080/calendar").is_some());
        assert!(registry.lookup("https://WWW.BTCC.NET/calendar").is_some());
    }

    #[test]
    fn test_lookup_unparsable_url_none() {
        let registry = registry_with(&["fiawec.com"]);
        assert!(registry.lookup("fiawec.com/calendar").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_api_url_for_substitutes_season() {
        let hint = SiteHint::new("example.com", HintStrategy::Api)
            .with_api_url("https://api.example.com/{year}/races");
        assert_eq!(
            hint.api_url_for(2026).unwrap(),
            "https://api.example.com/2026/races"
        );
    }

    #[test]
    fn test_api_url_for_requires_api_strategy() {
        let hint = SiteHint::new("example.com", HintStrategy::NextData)
            .with_api_url("https://api.example.com/races");
        assert!(hint.api_url_for(2026).is_none());

        let bare = SiteHint::new("nascar.com", HintStrategy::Api);
        assert!(bare.api_url_for(2026).is_none());
    }

    #[test]
    fn test_aliases_default_empty() {
        let hint = SiteHint::new("example.com", HintStrategy::Auto)
            .with_aliases(HintField::Name, &["RaceName"]);
        assert_eq!(hint.aliases(HintField::Name), ["RaceName".to_string()]);
        assert!(hint.aliases(HintField::Start).is_empty());
    }

    #[test]
    fn test_registry_debug_lists_domains() {
        let registry = registry_with(&["b.com", "a.com"]);
        let debug = format!("{registry:?}");
        assert!(debug.contains("hint_count: 2"));
        assert!(debug.contains("\"a.com\", \"b.com\""));
    }
}
