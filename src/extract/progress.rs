//! Progress reporting for long-running extractions.

/// Receives one human-readable line per extraction step.
///
/// The dispatcher also logs every line at `info`, so an observer is only
/// needed to surface progress somewhere other than the log.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, message: &str);
}
