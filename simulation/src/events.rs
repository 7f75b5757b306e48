//! Discrete-event queue
//!
//! Events fire in time order; events scheduled for the same instant fire
//! in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hera_core::{SimTime, SimulationIdentity};

/// Identifier of an in-flight transfer
pub type TransferId = u64;

/// Something that happens at a point in simulated time
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A connection comes up
    LinkUp(SimulationIdentity, SimulationIdentity),
    /// A connection goes down
    LinkDown(SimulationIdentity, SimulationIdentity),
    /// Generate the next random contact
    RandomEncounter,
    /// A message is created at `source`
    CreateMessage {
        source: SimulationIdentity,
        destination: SimulationIdentity,
        size: u64,
    },
    /// Generate the next random message
    RandomMessage,
    /// A transfer finishes (ignored if it was aborted)
    TransferDone(TransferId),
    /// Forwarding cycle for every idle node
    Update,
    /// Record every node's delivery predictions
    OmegaSample,
}

#[derive(Debug)]
struct Scheduled {
    time: SimTime,
    seq: u64,
    event: SimEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed: BinaryHeap is a max-heap and we want the earliest first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered event queue
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event
    pub fn push(&mut self, time: SimTime, event: SimEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { time, seq, event });
    }

    /// Remove the earliest event if it is due at or before `limit`
    pub fn pop_until(&mut self, limit: SimTime) -> Option<(SimTime, SimEvent)> {
        if self.heap.peek()?.time > limit {
            return None;
        }
        self.heap.pop().map(|s| (s.time, s.event))
    }

    /// Time of the earliest pending event
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|s| s.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
