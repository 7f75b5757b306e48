//! Buffered message metadata
//!
//! Routers never look at payloads; a [`Message`] carries only what the
//! forwarding decision and the queue-mode tie-break need.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::identity::PeerIdentity;
use crate::time::SimTime;

/// Unique identifier for a message
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display("M{_0}")]
pub struct MessageId(pub u64);

/// A message held in a node's buffer
///
/// Generic over the identity type, like every other routing type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "I: PeerIdentity")]
pub struct Message<I: PeerIdentity> {
    /// Unique message identifier
    pub id: MessageId,
    /// Original sender
    pub source: I,
    /// Final destination
    pub destination: I,
    /// Size in bytes
    pub size: u64,
    /// When the message was created at its source
    pub created_at: SimTime,
    /// When the current holder received (or created) this copy
    pub received_at: SimTime,
    /// Number of relays this copy has traversed
    pub hop_count: u32,
}

impl<I: PeerIdentity> Message<I> {
    /// Create a freshly originated message
    pub fn new(id: MessageId, source: I, destination: I, size: u64, created_at: SimTime) -> Self {
        Self {
            id,
            source,
            destination,
            size,
            created_at,
            received_at: created_at,
            hop_count: 0,
        }
    }

    /// Copy of this message as it arrives at the next hop
    pub fn relayed(&self, received_at: SimTime) -> Self {
        Self {
            received_at,
            hop_count: self.hop_count + 1,
            ..self.clone()
        }
    }

    /// Check whether `peer` is this message's final destination
    pub fn is_destined_for(&self, peer: &I) -> bool {
        &self.destination == peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SimulationIdentity;

    fn make_message() -> Message<SimulationIdentity> {
        Message::new(
            MessageId(3),
            SimulationIdentity(0),
            SimulationIdentity(5),
            1024,
            10.0,
        )
    }

    #[test]
    fn test_message_id_display() {
        assert_eq!(MessageId(12).to_string(), "M12");
    }

    #[test]
    fn test_new_message() {
        let msg = make_message();
        assert_eq!(msg.received_at, msg.created_at);
        assert_eq!(msg.hop_count, 0);
        assert!(msg.is_destined_for(&SimulationIdentity(5)));
        assert!(!msg.is_destined_for(&SimulationIdentity(0)));
    }

    #[test]
    fn test_relayed_copy() {
        let msg = make_message();
        let copy = msg.relayed(42.0);
        assert_eq!(copy.id, msg.id);
        assert_eq!(copy.created_at, 10.0);
        assert_eq!(copy.received_at, 42.0);
        assert_eq!(copy.hop_count, 1);
    }

    #[test]
    fn test_message_serde() {
        let msg = make_message();
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message<SimulationIdentity> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
