//! Shared HTTP client policy and the default [`PageFetcher`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::user_agent;

use super::{FetchedPage, PageFetcher};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Connect and total-request timeouts for outbound HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl HttpTimeouts {
    #[must_use]
    pub fn from_secs(connect_secs: u64, read_secs: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect_secs),
            read: Duration::from_secs(read_secs),
        }
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self::from_secs(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }
}

/// Builds an HTTP client with the project user agent, gzip and the given timeouts.
///
/// `verify_tls = false` accepts invalid certificates; it is only used for
/// sites whose hint says their chain is broken.
///
/// # Errors
///
/// Returns [`ExtractError::Configuration`] when the client cannot be built.
pub fn build_http_client(timeouts: HttpTimeouts, verify_tls: bool) -> Result<Client, ExtractError> {
    match try_build(timeouts, verify_tls, false) {
        Ok(client) => Ok(client),
        Err(BuildFailure::Panic) => {
            // Some sandboxed environments panic while reading system proxy
            // settings; retry with environment proxies only.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            try_build(timeouts, verify_tls, true).map_err(BuildFailure::into_error)
        }
        Err(failure) => Err(failure.into_error()),
    }
}

enum BuildFailure {
    Panic,
    Build(reqwest::Error),
}

impl BuildFailure {
    fn into_error(self) -> ExtractError {
        match self {
            Self::Panic => ExtractError::configuration(
                "HTTP client construction panicked",
                "Check proxy environment variables (HTTPS_PROXY, HTTP_PROXY)",
            ),
            Self::Build(error) => ExtractError::configuration(
                &format!("HTTP client construction failed: {error}"),
                "Check TLS and proxy configuration",
            ),
        }
    }
}

fn try_build(timeouts: HttpTimeouts, verify_tls: bool, env_proxy_only: bool) -> Result<Client, BuildFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.read)
            .user_agent(user_agent::default_user_agent())
            .gzip(true);
        if !verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if env_proxy_only {
            builder = apply_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::Panic)?
}

fn apply_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    let https = first_env(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]);
    if let Some(proxy) = https.and_then(|p| Proxy::https(&p).ok()) {
        builder = builder.proxy(proxy);
    }
    let http = first_env(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]);
    if let Some(proxy) = http.and_then(|p| Proxy::http(&p).ok()) {
        builder = builder.proxy(proxy);
    }
    builder
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Default [`PageFetcher`] backed by `reqwest`.
///
/// Holds one verifying client and one lenient client, built up front.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    strict: Client,
    lenient: Client,
}

impl HttpPageFetcher {
    /// Builds both clients with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Configuration`] when a client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ExtractError> {
        Ok(Self {
            strict: build_http_client(timeouts, true)?,
            lenient: build_http_client(timeouts, false)?,
        })
    }

    pub(crate) fn client(&self, verify_tls: bool) -> &Client {
        if verify_tls { &self.strict } else { &self.lenient }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str, verify_tls: bool) -> Result<FetchedPage, ExtractError> {
        let response = self
            .client(verify_tls)
            .get(url)
            .send()
            .await
            .map_err(|error| ExtractError::unreachable(url, error))?;
        let status = response.status().as_u16();
        let content = response
            .text()
            .await
            .map_err(|error| ExtractError::unreachable(url, error))?;
        debug!(status, bytes = content.len(), "Fetched page");
        Ok(FetchedPage::new(content, status))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(10));
        assert_eq!(timeouts.read, Duration::from_secs(30));
    }

    #[test]
    fn test_build_http_client_both_modes() {
        assert!(build_http_client(HttpTimeouts::default(), true).is_ok());
        assert!(build_http_client(HttpTimeouts::default(), false).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_upstream_error() {
        let fetcher = HttpPageFetcher::new(HttpTimeouts::from_secs(1, 1)).unwrap();
        let err = fetcher
            .fetch("http://127.0.0.1:9/calendar", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UpstreamUnreachable { .. }));
    }
}
