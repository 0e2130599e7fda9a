//! Race calendar extraction library.
//!
//! Turns arbitrary motorsport calendar pages into a canonical season
//! document: events with venues and timed sessions. Extraction cascades
//! through tiers (site API hint, embedded JSON, captured network responses,
//! generative model) until one of them yields events.
//!
//! # Architecture
//!
//! - [`hints`] - Per-site hints keyed by domain
//! - [`miner`] - Depth-bounded search for race and session arrays in JSON
//! - [`normalize`] - Raw records to canonical events and sessions
//! - [`sources`] - Page fetching, embedded JSON and network capture
//! - [`generative`] - Prompting a model and repairing its JSON replies
//! - [`extract`] - The tier dispatcher and enrichment steps
//! - [`model`] - Canonical data types and the result envelope

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use regex::Regex;

pub mod error;
pub mod extract;
pub mod generative;
pub mod hints;
pub mod miner;
pub mod model;
pub mod normalize;
pub mod series;
pub mod sources;
mod user_agent;

// Re-export commonly used types
pub use error::ExtractError;
pub use extract::{ExtractRequest, Extractor, ExtractorBuilder, ExtractorSettings, ProgressObserver};
pub use generative::{GeminiGenerator, GenerativeExtractor, Generator};
pub use hints::{HintRegistry, SiteHint, build_default_hint_registry};
pub use model::{
    CanonicalEvent, CanonicalSession, ExtractionMetadata, ExtractionMethod, ExtractionResult,
    SeasonDocument, SessionKind, SessionStatus, Venue,
};
pub use sources::{
    CaptureTarget, HttpEndpointCapture, HttpPageFetcher, HttpTimeouts, NetworkCapture, PageFetcher,
};

/// Compiles a regex literal that is known to be valid.
///
/// # Panics
///
/// Panics if `pattern` does not compile; only call it with string literals
/// covered by tests.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}
