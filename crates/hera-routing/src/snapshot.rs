//! Immutable reachability snapshots
//!
//! A snapshot is the read-only view one router hands to another during
//! a transitive merge. It is an owned value, so handing it over never
//! shares mutable state between router instances, and it can be encoded
//! for exchange over a real link.

use std::collections::BTreeMap;

use hera_core::{PeerIdentity, SimTime};
use serde::{Deserialize, Serialize};

use crate::error::{HeraError, HeraResult};
use crate::hop_vector::HopVector;

/// A router's full reachability matrix at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "I: PeerIdentity")]
pub struct ReachabilitySnapshot<I: PeerIdentity> {
    /// Node whose matrix this is
    pub owner: I,
    /// Simulated time the matrix was aged to
    pub taken_at: SimTime,
    /// Hop vector per tracked destination
    pub entries: BTreeMap<I, HopVector>,
}

impl<I: PeerIdentity> ReachabilitySnapshot<I> {
    /// Empty snapshot for a node that has seen nobody yet
    pub fn empty(owner: I, taken_at: SimTime) -> Self {
        Self {
            owner,
            taken_at,
            entries: BTreeMap::new(),
        }
    }

    /// Hop vector for a destination, if tracked
    pub fn get(&self, destination: &I) -> Option<&HopVector> {
        self.entries.get(destination)
    }

    /// Number of tracked destinations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(destination, vector)` pairs in destination order
    pub fn iter(&self) -> impl Iterator<Item = (&I, &HopVector)> {
        self.entries.iter()
    }

    /// Encode to a compact binary form
    pub fn to_bytes(&self) -> HeraResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| HeraError::Snapshot(e.to_string()))
    }

    /// Decode from [`to_bytes`](Self::to_bytes) output
    pub fn from_bytes(bytes: &[u8]) -> HeraResult<Self> {
        postcard::from_bytes(bytes).map_err(|e| HeraError::Snapshot(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hera_core::SimulationIdentity;

    #[test]
    fn test_binary_codec() {
        let mut snapshot = ReachabilitySnapshot::empty(SimulationIdentity(1), 120.0);
        snapshot
            .entries
            .insert(SimulationIdentity(2), HopVector::from(vec![0.98, 0.0, 0.0]));
        snapshot
            .entries
            .insert(SimulationIdentity(7), HopVector::from(vec![0.0, 0.25, 0.01]));

        let bytes = snapshot.to_bytes().unwrap();
        let decoded = ReachabilitySnapshot::<SimulationIdentity>::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let mut snapshot = ReachabilitySnapshot::empty(SimulationIdentity(1), 0.0);
        snapshot
            .entries
            .insert(SimulationIdentity(2), HopVector::from(vec![1.0, 2.0]));
        let bytes = snapshot.to_bytes().unwrap();

        let result = ReachabilitySnapshot::<SimulationIdentity>::from_bytes(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(HeraError::Snapshot(_))));
    }
}
