//! # HERA Core
//!
//! Shared primitives for the HERA (Hop-Expansion Reachability Algorithm)
//! routing stack.
//!
//! This crate holds the types that both the routing core and the
//! surrounding simulator agree on:
//!
//! - [`PeerIdentity`]: Abstraction over node identification
//! - [`SimulationIdentity`]: Integer-backed identity used by the simulator
//! - [`Message`] / [`MessageId`]: Buffered messages as seen by a router
//! - [`SimTime`]: Simulated time in seconds

pub mod error;
pub mod identity;
pub mod message;
pub mod time;

// Re-export main types
pub use error::*;
pub use identity::*;
pub use message::*;
pub use time::*;
