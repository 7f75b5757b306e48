//! # HERA Simulator
//!
//! A discrete-event delay-tolerant network simulator that drives HERA
//! routers the way a mobility simulator would.
//!
//! ## Overview
//!
//! Nodes meet and part according to a connection trace or a random
//! encounter model. Messages are created at random nodes for random
//! destinations and copied from buffer to buffer across connections.
//!
//! - **Encounters**: both endpoints update their reachability matrices
//! - **Update cycles**: idle nodes deliver directly when they can, and
//!   otherwise let their router pick a better-positioned peer
//! - **Transfers**: take `size / transmitSpeed` seconds and abort when
//!   the connection drops
//! - **Mixed runs**: selected nodes run plain direct delivery, which
//!   declines the reachability capability
//!
//! ## Architecture
//!
//! - **Settings** (`settings.rs`): TOML scenario files
//! - **Trace** (`trace.rs`): Connection trace reader
//! - **Events** (`events.rs`): Time-ordered event queue
//! - **World** (`world.rs`): Nodes, links, buffers and transfers
//! - **Report** (`report.rs`): Message statistics and omega samples
//! - **Scenarios** (`scenarios.rs`): Worked example and random runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use hera_sim::{SimSettings, World};
//!
//! let settings = SimSettings::load("settings/campus.toml")?;
//! let mut world = World::from_settings(settings)?;
//! let report = world.run();
//! println!("{}", report);
//! ```

pub mod events;
pub mod report;
pub mod scenarios;
pub mod settings;
pub mod trace;
pub mod world;

#[cfg(test)]
mod integration_scenarios;

// Re-export main types
pub use events::{EventQueue, SimEvent};
pub use report::{write_omega_csv, MessageStats, OmegaSample, SimReport, SimStats};
pub use settings::{SettingsError, SimSettings};
pub use trace::{load_trace, parse_trace, ConnectionEvent, TraceError};
pub use world::{DirectDeliveryScheme, Fabric, NodeRouter, World, WorldError};

// Re-export core types for convenience
pub use hera_core::SimulationIdentity;
