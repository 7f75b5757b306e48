//! Node context injection for simulation logging
//!
//! A simulation processes events for many nodes on one thread. This
//! module keeps the node currently being processed in thread-local
//! storage so every span opened while handling its event can be tagged
//! with it.

use std::cell::RefCell;

use hera_core::PeerIdentity;
use uuid::Uuid;

/// Node context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContextData {
    /// The node's identity as a short string
    pub node_id: String,
    /// Identifier of the run the node belongs to
    pub run_id: Uuid,
}

thread_local! {
    static NODE_CONTEXT: RefCell<Option<NodeContextData>> = const { RefCell::new(None) };
}

/// RAII guard for node context
///
/// When this guard is created, it sets the node context for the current
/// thread. When it's dropped, it restores the previous context (if any).
///
/// # Example
///
/// ```
/// use hera_core::SimulationIdentity;
/// use hera_logging::NodeContextGuard;
///
/// let _guard = NodeContextGuard::new(&SimulationIdentity(3));
/// assert_eq!(NodeContextGuard::current_node_id().as_deref(), Some("3"));
/// ```
pub struct NodeContextGuard {
    previous: Option<NodeContextData>,
}

impl NodeContextGuard {
    /// Create a guard with a fresh run ID
    pub fn new<I: PeerIdentity>(identity: &I) -> Self {
        Self::with_run_id(identity, Uuid::new_v4())
    }

    /// Create a guard tagged with an existing run ID
    ///
    /// Simulations create one run ID up front and reuse it for every node.
    pub fn with_run_id<I: PeerIdentity>(identity: &I, run_id: Uuid) -> Self {
        let previous = NODE_CONTEXT.with(|ctx| ctx.borrow().clone());

        let new_ctx = NodeContextData {
            node_id: identity.short_id(),
            run_id,
        };
        NODE_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(new_ctx));

        Self { previous }
    }

    /// Get the current node context (if any)
    pub fn current() -> Option<NodeContextData> {
        NODE_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current node ID (if set)
    pub fn current_node_id() -> Option<String> {
        Self::current().map(|ctx| ctx.node_id)
    }

    /// Get the current run ID (if set)
    pub fn current_run_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.run_id)
    }
}

impl Drop for NodeContextGuard {
    fn drop(&mut self) {
        NODE_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Convenience macro to run a block inside a node context
///
/// # Example
///
/// ```ignore
/// with_node_context!(&node, {
///     tracing::info!("Handling encounter");
/// });
/// ```
#[macro_export]
macro_rules! with_node_context {
    ($identity:expr, $body:block) => {{
        let _guard = $crate::context::NodeContextGuard::new($identity);
        $body
    }};
}
