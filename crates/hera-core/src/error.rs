//! Error types for the core primitives

use thiserror::Error;

/// Errors related to peer identity
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid identity format: {0}")]
    InvalidFormat(String),

    #[error("Identity out of range: {0}")]
    OutOfRange(String),
}
