//! Capability interfaces between router instances
//!
//! Routers never reach into each other's state. A peer is queried only
//! through [`ReachabilityQuery`], and a peer running some other routing
//! scheme simply declines the capability by returning `None` from
//! [`RoutingScheme::reachability`].

use hera_core::{PeerIdentity, SimTime};

use crate::error::{HeraError, HeraResult};
use crate::snapshot::ReachabilitySnapshot;

/// Read-side queries a HERA peer answers
pub trait ReachabilityQuery<I: PeerIdentity> {
    /// The peer's own omega for `destination`, aged to `now`
    fn omega(&self, destination: &I, now: SimTime) -> f64;

    /// The peer's full matrix, aged to `now`
    fn snapshot(&self, now: SimTime) -> ReachabilitySnapshot<I>;
}

/// Any router that can sit on the other end of a connection
pub trait RoutingScheme<I: PeerIdentity>: Send + Sync {
    /// Human-readable scheme name (for logs and errors)
    fn scheme_name(&self) -> &'static str;

    /// Reachability support, if this scheme has it
    fn reachability(&self) -> Option<&dyn ReachabilityQuery<I>> {
        None
    }
}

/// Resolve a peer's reachability capability or report the incompatibility
pub fn require_reachability<'a, I: PeerIdentity>(
    peer: &I,
    scheme: &'a dyn RoutingScheme<I>,
) -> HeraResult<&'a dyn ReachabilityQuery<I>> {
    scheme
        .reachability()
        .ok_or_else(|| HeraError::IncompatiblePeer {
            peer: peer.to_string(),
            scheme: scheme.scheme_name(),
        })
}
