//! Network capture implementations.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::time::{Instant, timeout};
use tracing::{debug, info};
use url::Url;

use crate::compile_static_regex;
use crate::normalize::absolutize_url;

use super::{CaptureTarget, CapturedResponse, NetworkCapture, PageFetcher};

/// Upper bound on endpoint requests per capture.
const MAX_ENDPOINT_REQUESTS: usize = 25;

static ABSOLUTE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"https?://[^\s"'<>\\`]+"#));

static QUOTED_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"["'](/[A-Za-z0-9_\-./?=&%:]+)["']"#));

const STATIC_ASSET_SUFFIXES: [&str; 10] = [
    ".js", ".css", ".png", ".jpg", ".jpeg", ".svg", ".webp", ".gif", ".woff", ".woff2",
];

/// Capture that scans a page for endpoint URLs and fetches the matching ones.
///
/// Without a browser this only sees endpoints referenced in the page source,
/// which covers sites that bootstrap from a JSON feed URL. The page is only
/// fetched when the target carries no content.
#[derive(Clone)]
pub struct HttpEndpointCapture {
    fetcher: Arc<dyn PageFetcher>,
}

impl HttpEndpointCapture {
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    async fn page_content(&self, target: CaptureTarget<'_>, limit: Duration) -> Option<String> {
        if let Some(content) = target.content {
            return Some(content.to_string());
        }
        match timeout(limit, self.fetcher.fetch(target.url, target.verify_tls)).await {
            Ok(Ok(page)) if page.is_success() => Some(page.content),
            Ok(Ok(page)) => {
                debug!(status = page.status, "Capture page returned non-success status");
                None
            }
            Ok(Err(error)) => {
                debug!(error = %error, "Capture page fetch failed");
                None
            }
            Err(_) => {
                debug!("Capture timed out fetching page");
                None
            }
        }
    }
}

impl std::fmt::Debug for HttpEndpointCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpointCapture").finish_non_exhaustive()
    }
}

/// Finds candidate endpoint URLs in `content` whose text contains any pattern.
///
/// JSON-escaped slashes are undone first. Candidates are absolutized against
/// `page_url`, deduplicated in order of appearance and stripped of static assets.
#[must_use]
pub fn endpoint_candidates(content: &str, page_url: &str, patterns: &[String]) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let lowered: Vec<String> = patterns.iter().map(|p| p.to_ascii_lowercase()).collect();
    let content = content.replace("\\/", "/");

    let absolute = ABSOLUTE_URL_RE.find_iter(&content).map(|m| m.as_str().to_string());
    let relative = QUOTED_PATH_RE
        .captures_iter(&content)
        .filter_map(|caps| caps.get(1))
        .filter(|m| !m.as_str().starts_with("//"))
        .filter_map(|m| absolutize_url(m.as_str(), &base));

    let mut seen = HashSet::new();
    absolute
        .chain(relative)
        .filter(|candidate| {
            let lower = candidate.to_ascii_lowercase();
            let path = lower.split(['?', '#']).next().unwrap_or_default();
            lowered.iter().any(|p| lower.contains(p.as_str()))
                && !STATIC_ASSET_SUFFIXES.iter().any(|s| path.ends_with(s))
                && candidate != page_url
        })
        .filter(|candidate| seen.insert(candidate.clone()))
        .take(MAX_ENDPOINT_REQUESTS)
        .collect()
}

#[async_trait]
impl NetworkCapture for HttpEndpointCapture {
    #[tracing::instrument(
        skip(self, target, patterns),
        fields(url = target.url, verify_tls = target.verify_tls, patterns = patterns.len())
    )]
    async fn capture(
        &self,
        target: CaptureTarget<'_>,
        patterns: &[String],
        limit: Duration,
    ) -> Vec<CapturedResponse> {
        let deadline = Instant::now() + limit;
        let mut captured = Vec::new();

        let Some(content) = self.page_content(target, limit).await else {
            return captured;
        };

        for endpoint in endpoint_candidates(&content, target.url, patterns) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(collected = captured.len(), "Capture deadline reached");
                break;
            }
            match timeout(remaining, self.fetcher.fetch(&endpoint, target.verify_tls)).await {
                Ok(Ok(response)) if response.is_success() => {
                    if serde_json::from_str::<serde_json::Value>(&response.content).is_ok() {
                        captured.push(CapturedResponse::new(endpoint, response.content));
                    }
                }
                Ok(Ok(response)) => {
                    debug!(endpoint = %endpoint, status = response.status, "Endpoint returned non-success status");
                }
                Ok(Err(error)) => debug!(endpoint = %endpoint, error = %error, "Endpoint fetch failed"),
                Err(_) => {
                    debug!(collected = captured.len(), "Capture deadline reached mid-request");
                    break;
                }
            }
        }

        info!(responses = captured.len(), "Network capture finished");
        captured
    }
}

/// Capture that never observes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCapture;

#[async_trait]
impl NetworkCapture for DisabledCapture {
    async fn capture(
        &self,
        _target: CaptureTarget<'_>,
        _patterns: &[String],
        _limit: Duration,
    ) -> Vec<CapturedResponse> {
        Vec::new()
    }
}
