//! Error types for calendar extraction.
//!
//! Only [`ExtractError::Configuration`] is allowed to escape
//! [`Extractor::fetch_season`](crate::extract::Extractor::fetch_season);
//! every other variant is contained by the tier or step that raised it.

use thiserror::Error;

/// Errors that can occur while extracting a race calendar.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The caller cannot proceed at all (missing URL, missing credential).
    #[error("configuration error: {message}\n  Suggestion: {suggestion}")]
    Configuration {
        /// What is misconfigured
        message: String,
        /// How to fix it
        suggestion: String,
    },

    /// Network failure or timeout while fetching a page, capture or API.
    #[error("upstream unreachable for '{url}': {reason}")]
    UpstreamUnreachable {
        /// URL that could not be retrieved
        url: String,
        /// Why retrieval failed
        reason: String,
    },

    /// JSON was present but held no recognizable race or session arrays.
    #[error("unrecognized data shape from '{source_name}': {reason}")]
    MalformedUpstreamShape {
        /// Where the data came from (URL or tier name)
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Generative model output could not be parsed even after repair.
    #[error("invalid model output: {reason}")]
    GenerativeOutputInvalid {
        /// Parser failure detail
        reason: String,
    },
}

impl ExtractError {
    /// Creates a `Configuration` error.
    #[must_use]
    pub fn configuration(message: &str, suggestion: &str) -> Self {
        Self::Configuration {
            message: message.to_string(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates an `UpstreamUnreachable` error.
    #[must_use]
    pub fn unreachable(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::UpstreamUnreachable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `MalformedUpstreamShape` error.
    #[must_use]
    pub fn malformed(source_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedUpstreamShape {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `GenerativeOutputInvalid` error.
    #[must_use]
    pub fn invalid_output(reason: impl std::fmt::Display) -> Self {
        Self::GenerativeOutputInvalid {
            reason: reason.to_string(),
        }
    }

    /// Returns true for the one class of error that aborts the whole pipeline.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
