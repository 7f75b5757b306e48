//! HERA-specific error types

use thiserror::Error;

/// Configuration errors, raised while building a router
///
/// A router is never instantiated from a configuration that fails
/// any of these checks.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// `secondsInTimeUnit` was not supplied
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    /// Hop count must be at least one
    #[error("hopCount must be positive (got {0})")]
    InvalidHopCount(usize),

    /// Weight vectors disagree with the hop count
    #[error("{name} has {actual} entries but hopCount is {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Time unit must be a finite positive duration
    #[error("secondsInTimeUnit must be positive and finite (got {0})")]
    InvalidTimeUnit(f64),

    /// Aging base outside (0, 1]
    #[error("alpha must be in (0, 1] (got {0})")]
    InvalidAlpha(f64),

    /// Negative or non-finite weight
    #[error("{name}[{index}] must be finite and non-negative (got {value})")]
    InvalidWeight {
        name: &'static str,
        index: usize,
        value: f64,
    },
}

/// Errors that can occur in the HERA routing core
#[derive(Debug, Error)]
pub enum HeraError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The peer runs a routing scheme without reachability support
    #[error("Peer {peer} runs {scheme}, which does not answer reachability queries")]
    IncompatiblePeer { peer: String, scheme: &'static str },

    /// Snapshot encoding or decoding failed
    #[error("Snapshot codec error: {0}")]
    Snapshot(String),
}

/// Result type for HERA operations
pub type HeraResult<T> = Result<T, HeraError>;
