//! Reachability store
//!
//! Each node owns one [`ReachabilityStore`]: a map from known peers to
//! [`HopVector`]s plus the clock of the last aging pass.
//!
//! Key rules:
//! - **Lazy aging**: every public operation first decays the whole matrix
//!   by `alpha ^ ((now - last) / unit)`. A call at the same instant is a
//!   no-op and does not touch the aging clock.
//! - **Direct contact**: `v[0] += lambda[0]`, unbounded.
//! - **Transitivity**: merging a peer's snapshot adds
//!   `lambda[h] * peer[dest][h - 1]` to `v[dest][h]` for `h >= 1`.
//! - **No self entry**: the node's own identity is never tracked.
//! - **Growth only**: entries are created lazily and never removed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hera_core::{PeerIdentity, SimTime};
use parking_lot::RwLock;

use crate::config::HeraConfig;
use crate::decision;
use crate::hop_vector::HopVector;
use crate::snapshot::ReachabilitySnapshot;

/// Matrix plus aging clock, guarded together
#[derive(Debug)]
struct MatrixState<I: PeerIdentity> {
    reach: HashMap<I, HopVector>,
    last_age_time: SimTime,
}

impl<I: PeerIdentity> MatrixState<I> {
    /// Decay every tracked score up to `now`
    ///
    /// Returns true if an aging pass was applied.
    fn age(&mut self, now: SimTime, config: &HeraConfig) -> bool {
        if now <= self.last_age_time {
            if now < self.last_age_time {
                tracing::warn!(
                    now,
                    last_age_time = self.last_age_time,
                    "Aging clock moved backwards, ignoring"
                );
            }
            return false;
        }

        let elapsed = (now - self.last_age_time) / config.unit_seconds();
        let mult = config.alpha().powf(elapsed);
        for vector in self.reach.values_mut() {
            vector.scale(mult);
        }
        self.last_age_time = now;

        tracing::trace!(elapsed, mult, tracked = self.reach.len(), "Aged reachability matrix");
        true
    }
}

/// Per-node reachability matrix with lazy exponential aging
///
/// All operations take `&self`; the matrix and its aging clock sit behind
/// a single lock so an aging pass and the access that triggered it are
/// observed together by other callers.
pub struct ReachabilityStore<I: PeerIdentity> {
    /// Our node's identity
    local_id: I,
    /// Shared, immutable parameters
    config: Arc<HeraConfig>,
    /// Matrix and aging clock
    state: RwLock<MatrixState<I>>,
}

impl<I: PeerIdentity> ReachabilityStore<I> {
    /// Create an empty store
    pub fn new(local_id: I, config: Arc<HeraConfig>) -> Self {
        Self {
            local_id,
            config,
            state: RwLock::new(MatrixState {
                reach: HashMap::new(),
                last_age_time: 0.0,
            }),
        }
    }

    /// Get the local node's identity
    pub fn local_id(&self) -> &I {
        &self.local_id
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<HeraConfig> {
        &self.config
    }

    /// Time of the last applied aging pass
    pub fn last_age_time(&self) -> SimTime {
        self.state.read().last_age_time
    }

    /// Decay all scores up to `now`
    ///
    /// Returns true if anything changed (i.e. `now` is later than the
    /// last aging pass).
    pub fn age(&self, now: SimTime) -> bool {
        self.state.write().age(now, &self.config)
    }

    /// Current hop vector for `peer`, creating a zero entry if absent
    ///
    /// Asking for the local node returns a zero vector without creating
    /// an entry.
    pub fn entry_for(&self, peer: &I, now: SimTime) -> HopVector {
        let mut state = self.state.write();
        state.age(now, &self.config);

        if peer == &self.local_id {
            return HopVector::zeros(self.config.hop_count());
        }

        let hop_count = self.config.hop_count();
        state
            .reach
            .entry(peer.clone())
            .or_insert_with(|| HopVector::zeros(hop_count))
            .clone()
    }

    /// Record a direct encounter with `peer`
    ///
    /// Adds `lambda[0]` to the peer's level-0 score and returns the new
    /// value. There is no cap; only aging between contacts moderates it.
    pub fn record_direct_contact(&self, peer: &I, now: SimTime) -> f64 {
        // Don't track reachability to ourselves
        if peer == &self.local_id {
            return 0.0;
        }

        let mut state = self.state.write();
        state.age(now, &self.config);

        let hop_count = self.config.hop_count();
        let entry = state
            .reach
            .entry(peer.clone())
            .or_insert_with(|| HopVector::zeros(hop_count));
        entry.add(0, self.config.lambda()[0]);
        entry[0]
    }

    /// Fold a peer's snapshot into our matrix one hop level up
    ///
    /// For every destination in the snapshot other than ourselves:
    ///   `v[dest][h] += lambda[h] * peer[dest][h - 1]` for `h = 1..H-1`.
    /// Level 0 is never touched here.
    ///
    /// Returns the number of destinations merged.
    pub fn merge_transitive(&self, peer_snapshot: &ReachabilitySnapshot<I>, now: SimTime) -> usize {
        let mut state = self.state.write();
        state.age(now, &self.config);

        let hop_count = self.config.hop_count();
        let lambda = self.config.lambda();
        let mut merged = 0;

        for (destination, peer_vector) in peer_snapshot.iter() {
            // A neighbour's view of us must not inflate our own entry
            if destination == &self.local_id {
                continue;
            }

            let local = state
                .reach
                .entry(destination.clone())
                .or_insert_with(|| HopVector::zeros(hop_count));
            for h in 1..hop_count {
                local.add(h, lambda[h] * peer_vector.get(h - 1));
            }
            merged += 1;
        }

        tracing::debug!(
            from = %peer_snapshot.owner,
            merged,
            tracked = state.reach.len(),
            "Merged transitive reachability"
        );
        merged
    }

    /// Aged copy of the full matrix
    pub fn snapshot(&self, now: SimTime) -> ReachabilitySnapshot<I> {
        let mut state = self.state.write();
        state.age(now, &self.config);

        ReachabilitySnapshot {
            owner: self.local_id.clone(),
            taken_at: state.last_age_time.max(now),
            entries: state
                .reach
                .iter()
                .map(|(id, vector)| (id.clone(), vector.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Decision function for `destination`
    ///
    /// Returns 0.0 if the destination is unknown. Does not create an
    /// entry.
    pub fn omega(&self, destination: &I, now: SimTime) -> f64 {
        let mut state = self.state.write();
        state.age(now, &self.config);
        decision::omega(state.reach.get(destination), self.config.gamma())
    }

    /// Omega for every tracked destination, in destination order
    pub fn all_omegas(&self, now: SimTime) -> Vec<(I, f64)> {
        let mut state = self.state.write();
        state.age(now, &self.config);

        let gamma = self.config.gamma();
        let mut omegas: Vec<(I, f64)> = state
            .reach
            .iter()
            .map(|(id, vector)| (id.clone(), vector.dot(gamma)))
            .collect();
        omegas.sort_by(|a, b| a.0.cmp(&b.0));
        omegas
    }

    /// Check whether `peer` has an entry (no aging, no creation)
    pub fn is_tracked(&self, peer: &I) -> bool {
        self.state.read().reach.contains_key(peer)
    }

    /// Get the number of tracked destinations
    pub fn known_destinations(&self) -> usize {
        self.state.read().reach.len()
    }
}

impl<I: PeerIdentity> std::fmt::Debug for ReachabilityStore<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityStore")
            .field("local_id", &self.local_id)
            .field("known_destinations", &self.known_destinations())
            .field("last_age_time", &self.last_age_time())
            .finish()
    }
}
