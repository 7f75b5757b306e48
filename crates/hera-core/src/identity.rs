//! Peer identity abstractions
//!
//! This module provides the [`PeerIdentity`] trait that abstracts over
//! different identity implementations. Routers only need equality,
//! hashing and a stable ordering (for deterministic dumps).

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::IdentityError;

/// Trait for peer identity abstraction
///
/// This trait allows the same routing logic to work with simulator
/// identities and any other opaque node identifier.
pub trait PeerIdentity:
    Clone + Eq + Ord + Hash + Send + Sync + Debug + Display + Serialize + DeserializeOwned + 'static
{
    /// Get a short display form (for logging)
    fn short_id(&self) -> String {
        format!("{}", self)
    }
}

/// Integer-backed identity for simulated nodes
///
/// Displayed as `n<k>`, e.g. `n0`, `n17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimulationIdentity(pub u32);

impl SimulationIdentity {
    /// Create a new simulation identity
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Generate identities `n0..n{count-1}`
    pub fn range(count: u32) -> Vec<Self> {
        (0..count).map(Self).collect()
    }

    /// Get the underlying index
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl Display for SimulationIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl FromStr for SimulationIdentity {
    type Err = IdentityError;

    /// Accepts both `n12` and a bare `12`, the two forms found in
    /// connection trace files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('n').unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdentityError::InvalidFormat(format!(
                "Invalid simulation identity: {}",
                s
            )));
        }
        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| IdentityError::OutOfRange(s.to_string()))
    }
}

impl PeerIdentity for SimulationIdentity {
    fn short_id(&self) -> String {
        self.0.to_string()
    }
}
