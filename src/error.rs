//! Error taxonomy for the collection engine.
//!
//! Per-match and per-sample failures are logged and skipped by the
//! collector; only setup failures (sink init, configuration) abort a run.

use thiserror::Error;

/// Errors surfaced by the collection engine.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A sample spec or engine argument is invalid (e.g. empty sample name).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An underlying open/read/write/close failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The limit arbiter could not evaluate a candidate (size unavailable).
    #[error("failed to compute limits for '{0}'")]
    LimitCompute(String),

    /// Informational outcome: the sample identity was seen before.
    #[error("'{0}' is already collected")]
    AlreadyCollected(String),

    /// The archive or directory sink failed.
    #[error("output sink failure: {0}")]
    Sink(String),

    /// Propagated from the scanner driving the match callback.
    #[error("scanner failure: {0}")]
    Scanner(String),
}
