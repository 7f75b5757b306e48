//! Forwarding scheduler (GRTRMAX)
//!
//! Once per update cycle, for every idle connected peer and every
//! buffered message the peer lacks, compare our omega for the message's
//! destination with the peer's. A `(message, peer)` pair is a candidate
//! only when the peer's score is strictly greater. Candidates are tried
//! in descending peer score, ties broken by the queue mode, and the
//! cycle stops at the first accepted transfer.
//!
//! Everything outside the decision (buffers, links, the transfer state
//! machine) belongs to the host and is reached through
//! [`ForwardingHost`].

use std::cmp::Ordering;
use std::collections::HashMap;

use hera_core::{Message, MessageId, PeerIdentity, SimTime};
use serde::{Deserialize, Serialize};

use crate::capability::{require_reachability, RoutingScheme};
use crate::reachability::ReachabilityStore;

/// Result of a single transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    /// The transfer was started
    Accepted,
    /// Either side is already transferring
    Busy,
    /// The receiver refused (e.g. it already holds the message)
    Denied,
}

impl TransferResult {
    /// Check if the transfer went ahead
    pub fn is_accepted(&self) -> bool {
        matches!(self, TransferResult::Accepted)
    }
}

/// Secondary ordering for candidates with equal peer scores
pub trait QueueOrdering<I: PeerIdentity> {
    /// Compare two messages; `Less` means `a` is tried first
    fn compare(&self, a: &Message<I>, b: &Message<I>) -> Ordering;
}

/// Buffer ordering by arrival time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// Oldest arrival first
    #[default]
    Fifo,
    /// Newest arrival first
    Lifo,
}

impl<I: PeerIdentity> QueueOrdering<I> for QueueMode {
    fn compare(&self, a: &Message<I>, b: &Message<I>) -> Ordering {
        let by_arrival = a
            .received_at
            .partial_cmp(&b.received_at)
            .unwrap_or(Ordering::Equal);
        let by_arrival = match self {
            QueueMode::Fifo => by_arrival,
            QueueMode::Lifo => by_arrival.reverse(),
        };
        by_arrival.then_with(|| a.id.cmp(&b.id))
    }
}

/// What the surrounding simulator exposes to the scheduler
pub trait ForwardingHost<I: PeerIdentity> {
    /// Messages currently buffered at this node
    fn buffered_messages(&self) -> Vec<Message<I>>;

    /// Peers with an active connection to this node
    fn connected_peers(&self) -> Vec<I>;

    /// Check if a peer is idle (not mid-transfer)
    fn is_peer_idle(&self, peer: &I) -> bool;

    /// Check if a peer already holds a message
    fn peer_has_message(&self, peer: &I, message: &MessageId) -> bool;

    /// The routing scheme running on a peer, if the peer is known
    fn peer_scheme(&self, peer: &I) -> Option<&dyn RoutingScheme<I>>;

    /// Try to start sending `message` to `peer`
    fn attempt_transfer(&mut self, message: &Message<I>, peer: &I) -> TransferResult;
}

/// A `(message, peer)` pair that passed the GRTRMAX rule
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<I: PeerIdentity> {
    /// The message to hand over
    pub message: Message<I>,
    /// The peer to hand it to
    pub peer: I,
    /// Our omega for the message's destination
    pub local_score: f64,
    /// The peer's omega for the message's destination
    pub peer_score: f64,
}

/// Outcome of one forwarding cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutcome<I: PeerIdentity> {
    /// No pair passed the GRTRMAX rule
    NothingToForward,
    /// A transfer was started
    Transferred {
        message: Message<I>,
        peer: I,
        peer_score: f64,
    },
    /// Every candidate was tried and none was accepted
    Exhausted { attempted: usize },
}

impl<I: PeerIdentity> ForwardOutcome<I> {
    /// Check if a transfer was started
    pub fn is_transferred(&self) -> bool {
        matches!(self, ForwardOutcome::Transferred { .. })
    }
}

/// Selects and tries candidates for one node
pub struct ForwardingScheduler<'a, I: PeerIdentity> {
    store: &'a ReachabilityStore<I>,
    ordering: &'a dyn QueueOrdering<I>,
}

impl<'a, I: PeerIdentity> ForwardingScheduler<'a, I> {
    /// Create a scheduler over a node's store and tie-break policy
    pub fn new(store: &'a ReachabilityStore<I>, ordering: &'a dyn QueueOrdering<I>) -> Self {
        Self { store, ordering }
    }

    /// Collect and order all candidates for this cycle
    pub fn candidates<H: ForwardingHost<I> + ?Sized>(&self, host: &H, now: SimTime) -> Vec<Candidate<I>> {
        let messages = host.buffered_messages();
        if messages.is_empty() {
            return Vec::new();
        }

        // Our own scores don't change within a cycle
        let mut local_scores: HashMap<I, f64> = HashMap::new();
        let mut candidates = Vec::new();

        for peer in host.connected_peers() {
            if !host.is_peer_idle(&peer) {
                continue;
            }

            let Some(scheme) = host.peer_scheme(&peer) else {
                continue;
            };
            let remote = match require_reachability(&peer, scheme) {
                Ok(remote) => remote,
                Err(e) => {
                    tracing::debug!(peer = %peer, error = %e, "Skipping peer for forwarding");
                    continue;
                }
            };

            for message in &messages {
                if host.peer_has_message(&peer, &message.id) {
                    continue;
                }

                let destination = &message.destination;
                let local_score = *local_scores
                    .entry(destination.clone())
                    .or_insert_with(|| self.store.omega(destination, now));
                let peer_score = remote.omega(destination, now);

                // GRTRMAX: strictly better-positioned peers only
                if peer_score > local_score {
                    candidates.push(Candidate {
                        message: message.clone(),
                        peer: peer.clone(),
                        local_score,
                        peer_score,
                    });
                }
            }
        }

        self.sort(&mut candidates);
        candidates
    }

    /// Order candidates by peer score (descending), then queue mode
    pub fn sort(&self, candidates: &mut [Candidate<I>]) {
        candidates.sort_by(|a, b| {
            b.peer_score
                .partial_cmp(&a.peer_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.ordering.compare(&a.message, &b.message))
        });
    }

    /// Run one cycle: try candidates in order until one is accepted
    pub fn forward<H: ForwardingHost<I> + ?Sized>(&self, host: &mut H, now: SimTime) -> ForwardOutcome<I> {
        let candidates = self.candidates(&*host, now);
        if candidates.is_empty() {
            return ForwardOutcome::NothingToForward;
        }

        let mut attempted = 0;
        for candidate in candidates {
            attempted += 1;
            match host.attempt_transfer(&candidate.message, &candidate.peer) {
                TransferResult::Accepted => {
                    tracing::debug!(
                        message = %candidate.message.id,
                        peer = %candidate.peer,
                        local_score = candidate.local_score,
                        peer_score = candidate.peer_score,
                        "Forwarding to better-positioned peer"
                    );
                    return ForwardOutcome::Transferred {
                        message: candidate.message,
                        peer: candidate.peer,
                        peer_score: candidate.peer_score,
                    };
                }
                result => {
                    tracing::trace!(
                        message = %candidate.message.id,
                        peer = %candidate.peer,
                        ?result,
                        "Transfer not started"
                    );
                }
            }
        }

        ForwardOutcome::Exhausted { attempted }
    }
}
