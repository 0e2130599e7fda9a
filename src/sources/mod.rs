//! Network collaborators used by the extraction tiers.
//!
//! - [`PageFetcher`] - fetches a page body once per URL
//! - [`NetworkCapture`] - collects JSON responses of endpoints a page talks to
//! - [`embedded_json`] - pulls JSON documents out of inline `<script>` tags
//!
//! Both collaborator traits use `async_trait` so the extractor can hold them
//! as `Arc<dyn ...>` and tests can substitute counting doubles.

mod capture;
mod http;
mod inline;

pub use capture::{DisabledCapture, HttpEndpointCapture};
pub use http::{HttpPageFetcher, HttpTimeouts, build_http_client};
pub use inline::{EmbeddedJson, EmbeddedSource, embedded_json, next_data, scripts_mentioning};

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ExtractError;

/// A fetched page: body text plus HTTP status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub content: String,
    pub status: u16,
}

impl FetchedPage {
    #[must_use]
    pub fn new(content: impl Into<String>, status: u16) -> Self {
        Self {
            content: content.into(),
            status,
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One response observed during network capture.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub body: String,
}

impl CapturedResponse {
    #[must_use]
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Parses the body as JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Fetches page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`; a non-2xx status is returned, not raised.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UpstreamUnreachable`] on network failure or timeout.
    async fn fetch(&self, url: &str, verify_tls: bool) -> Result<FetchedPage, ExtractError>;
}

/// The page a capture observes.
#[derive(Debug, Clone, Copy)]
pub struct CaptureTarget<'a> {
    pub url: &'a str,
    /// Page body the caller already fetched, if any.
    pub content: Option<&'a str>,
    pub verify_tls: bool,
}

impl<'a> CaptureTarget<'a> {
    #[must_use]
    pub fn new(url: &'a str) -> Self {
        Self {
            url,
            content: None,
            verify_tls: true,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: Option<&'a str>) -> Self {
        self.content = content;
        self
    }

    #[must_use]
    pub fn with_tls_verification(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }
}

/// Observes JSON responses produced while loading a page.
#[async_trait]
pub trait NetworkCapture: Send + Sync {
    /// Returns responses whose URL contains any of `patterns`.
    ///
    /// Must return whatever was collected when `timeout` elapses rather than
    /// failing.
    async fn capture(
        &self,
        target: CaptureTarget<'_>,
        patterns: &[String],
        timeout: Duration,
    ) -> Vec<CapturedResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_page_success_range() {
        assert!(FetchedPage::new("", 200).is_success());
        assert!(FetchedPage::new("", 204).is_success());
        assert!(!FetchedPage::new("", 304).is_success());
        assert!(!FetchedPage::new("", 503).is_success());
    }

    #[test]
    fn test_capture_target_defaults_to_verified_fetch() {
        let target = CaptureTarget::new("https://a.test");
        assert!(target.verify_tls);
        assert!(target.content.is_none());

        let target = target.with_content(Some("<html>")).with_tls_verification(false);
        assert_eq!(target.content, Some("<html>"));
        assert!(!target.verify_tls);
    }

    #[test]
    fn test_captured_response_json() {
        assert!(CapturedResponse::new("u", "{\"a\":1}").json().is_some());
        assert!(CapturedResponse::new("u", "<html>").json().is_none());
    }
}
