//! # HERA Routing
//!
//! Hop-Expansion Reachability Algorithm for delay-tolerant networks.
//!
//! Every node keeps a reachability matrix: for each peer it has ever
//! heard of, a vector of `H` hop-level scores. Level 0 counts direct
//! encounters, level `h` counts evidence relayed through `h` other nodes.
//! Scores decay exponentially over time and are collapsed into a single
//! delivery-likelihood estimate (omega) with a weight vector.
//!
//! ## Core Components
//!
//! - [`HeraRouter`]: Per-node entry point driven by the host simulator
//! - [`ReachabilityStore`]: The matrix with lazy aging
//! - [`ForwardingScheduler`]: GRTRMAX candidate selection
//! - [`HeraConfig`] / [`HeraSettings`]: Validated parameters and their raw form
//! - [`RoutingScheme`] / [`ReachabilityQuery`]: Capability interface between peers
//!
//! ## Encounter Flow
//!
//! When a connection comes up, each endpoint:
//!
//! 1. Ages its matrix up to the current time
//! 2. Adds `lambda[0]` to the peer's level-0 score
//! 3. Merges the peer's aged matrix into its own, one hop level up
//!
//! A peer that does not run HERA declines the capability; step 3 is
//! skipped and the encounter reports [`EncounterOutcome::DirectOnly`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hera_core::SimulationIdentity;
//! use hera_routing::{HeraConfig, HeraRouter};
//!
//! let config = Arc::new(HeraConfig::with_time_unit(60.0).unwrap());
//! let a = HeraRouter::new(SimulationIdentity(0), Arc::clone(&config));
//! let b = a.replicate(SimulationIdentity(1));
//!
//! a.on_encounter(&SimulationIdentity(1), &b, 0.0);
//! assert_eq!(a.omega(&SimulationIdentity(1), 0.0), 1.0);
//! ```

pub mod capability;
pub mod config;
pub mod decision;
pub mod error;
pub mod hop_vector;
pub mod reachability;
pub mod router;
pub mod scheduler;
pub mod snapshot;

// Re-export main types
pub use capability::{require_reachability, ReachabilityQuery, RoutingScheme};
pub use config::{HeraConfig, HeraSettings, SETTINGS_NAMESPACE};
pub use error::{ConfigError, HeraError, HeraResult};
pub use hop_vector::HopVector;
pub use reachability::ReachabilityStore;
pub use router::{EncounterOutcome, HeraRouter, RoutingInfo, SCHEME_NAME};
pub use scheduler::{
    Candidate, ForwardOutcome, ForwardingHost, ForwardingScheduler, QueueMode, QueueOrdering,
    TransferResult,
};
pub use snapshot::ReachabilitySnapshot;
