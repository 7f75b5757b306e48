//! HERA router
//!
//! [`HeraRouter`] is the per-node entry point the host drives:
//!
//! - `on_encounter` when a connection to a peer comes up
//! - `on_tick` once per update cycle while the node is idle
//! - `omega` / `snapshot` when a peer queries us
//! - `routing_info` for debug dumps

use std::fmt;
use std::sync::Arc;

use hera_core::{PeerIdentity, SimTime};
use serde::Serialize;

use crate::capability::{require_reachability, ReachabilityQuery, RoutingScheme};
use crate::config::{HeraConfig, HeraSettings};
use crate::error::{HeraError, HeraResult};
use crate::reachability::ReachabilityStore;
use crate::scheduler::{ForwardOutcome, ForwardingHost, ForwardingScheduler, QueueMode};
use crate::snapshot::ReachabilitySnapshot;

/// Scheme name reported to peers and in logs
pub const SCHEME_NAME: &str = "HERA";

/// What an encounter did to our matrix
#[derive(Debug)]
pub enum EncounterOutcome {
    /// Direct contact recorded and the peer's matrix merged
    Merged { direct_score: f64, destinations: usize },
    /// Direct contact recorded; the peer could not be merged
    DirectOnly { direct_score: f64, reason: HeraError },
}

impl EncounterOutcome {
    /// Level-0 score for the peer after the encounter
    pub fn direct_score(&self) -> f64 {
        match self {
            EncounterOutcome::Merged { direct_score, .. }
            | EncounterOutcome::DirectOnly { direct_score, .. } => *direct_score,
        }
    }

    /// Check if the peer's matrix was merged
    pub fn is_merged(&self) -> bool {
        matches!(self, EncounterOutcome::Merged { .. })
    }
}

/// Per-node HERA routing state
pub struct HeraRouter<I: PeerIdentity> {
    /// Reachability matrix and aging clock
    store: ReachabilityStore<I>,
    /// Tie-break for equal peer scores
    queue_mode: QueueMode,
}

impl<I: PeerIdentity> HeraRouter<I> {
    /// Create a router with an empty matrix
    pub fn new(local_id: I, config: Arc<HeraConfig>) -> Self {
        Self {
            store: ReachabilityStore::new(local_id, config),
            queue_mode: QueueMode::default(),
        }
    }

    /// Resolve settings and create a router, failing on bad configuration
    pub fn from_settings(local_id: I, settings: &HeraSettings) -> HeraResult<Self> {
        let config = settings.resolve()?;
        Ok(Self::new(local_id, Arc::new(config)))
    }

    /// Set the queue-mode tie-break
    pub fn with_queue_mode(mut self, queue_mode: QueueMode) -> Self {
        self.queue_mode = queue_mode;
        self
    }

    /// New router for another node using this one as prototype
    ///
    /// The configuration is shared; the matrix always starts empty since
    /// reachability is per-node history.
    pub fn replicate(&self, local_id: I) -> Self {
        Self {
            store: ReachabilityStore::new(local_id, Arc::clone(self.store.config())),
            queue_mode: self.queue_mode,
        }
    }

    /// Get the local node's identity
    pub fn local_id(&self) -> &I {
        self.store.local_id()
    }

    /// Get the configuration
    pub fn config(&self) -> &HeraConfig {
        self.store.config()
    }

    /// Get the tie-break mode
    pub fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }

    /// Direct access to the reachability store
    pub fn store(&self) -> &ReachabilityStore<I> {
        &self.store
    }

    /// Handle a connection to `peer` coming up
    ///
    /// The direct contact is always recorded. The peer's matrix is merged
    /// only if its scheme supports reachability queries.
    pub fn on_encounter(
        &self,
        peer: &I,
        peer_scheme: &dyn RoutingScheme<I>,
        now: SimTime,
    ) -> EncounterOutcome {
        let direct_score = self.store.record_direct_contact(peer, now);

        match require_reachability(peer, peer_scheme) {
            Ok(remote) => {
                let snapshot = remote.snapshot(now);
                let destinations = self.store.merge_transitive(&snapshot, now);
                tracing::debug!(
                    node = %self.local_id(),
                    peer = %peer,
                    direct_score,
                    destinations,
                    "Encounter"
                );
                EncounterOutcome::Merged {
                    direct_score,
                    destinations,
                }
            }
            Err(reason) => {
                tracing::warn!(
                    node = %self.local_id(),
                    peer = %peer,
                    error = %reason,
                    "Encounter with incompatible peer, merge skipped"
                );
                EncounterOutcome::DirectOnly {
                    direct_score,
                    reason,
                }
            }
        }
    }

    /// Run one forwarding cycle
    ///
    /// Call only while this node is idle and after the host's own
    /// direct-delivery pass found nothing to deliver.
    pub fn on_tick<H: ForwardingHost<I> + ?Sized>(&self, now: SimTime, host: &mut H) -> ForwardOutcome<I> {
        ForwardingScheduler::new(&self.store, &self.queue_mode).forward(host, now)
    }

    /// Our omega for `destination`
    pub fn omega(&self, destination: &I, now: SimTime) -> f64 {
        self.store.omega(destination, now)
    }

    /// Aged copy of our matrix
    pub fn snapshot(&self, now: SimTime) -> ReachabilitySnapshot<I> {
        self.store.snapshot(now)
    }

    /// Current omega per known destination
    pub fn routing_info(&self, now: SimTime) -> RoutingInfo<I> {
        RoutingInfo {
            node: self.local_id().clone(),
            time: now,
            predictions: self.store.all_omegas(now),
        }
    }
}

impl<I: PeerIdentity> RoutingScheme<I> for HeraRouter<I> {
    fn scheme_name(&self) -> &'static str {
        SCHEME_NAME
    }

    fn reachability(&self) -> Option<&dyn ReachabilityQuery<I>> {
        Some(self)
    }
}

impl<I: PeerIdentity> ReachabilityQuery<I> for HeraRouter<I> {
    fn omega(&self, destination: &I, now: SimTime) -> f64 {
        self.store.omega(destination, now)
    }

    fn snapshot(&self, now: SimTime) -> ReachabilitySnapshot<I> {
        self.store.snapshot(now)
    }
}

impl<I: PeerIdentity> fmt::Debug for HeraRouter<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeraRouter")
            .field("store", &self.store)
            .field("queue_mode", &self.queue_mode)
            .finish()
    }
}

/// Debug dump of a router's delivery predictions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "I: PeerIdentity")]
pub struct RoutingInfo<I: PeerIdentity> {
    /// Node the dump belongs to
    pub node: I,
    /// Time the matrix was aged to
    pub time: SimTime,
    /// `(destination, omega)` in destination order
    pub predictions: Vec<(I, f64)>,
}

impl<I: PeerIdentity> fmt::Display for RoutingInfo<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} delivery prediction(s)", self.predictions.len())?;
        for (destination, omega) in &self.predictions {
            writeln!(f, "  {} : {:.6}", destination, omega)?;
        }
        Ok(())
    }
}
