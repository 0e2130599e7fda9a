//! Shared User-Agent string for page, capture and API traffic.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/racecal";

/// Default User-Agent for every outbound request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("racecal/{version} (calendar-tool; +{PROJECT_UA_URL})")
}
