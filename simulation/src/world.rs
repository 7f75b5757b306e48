//! Simulated world
//!
//! The world owns everything a router does not: connections, message
//! buffers, in-flight transfers and the event queue. Each update cycle,
//! every idle node first tries to hand a buffered message straight to a
//! connected destination; only if that fails does it ask its router to
//! forward.
//!
//! Routers live apart from the mutable [`Fabric`] so that one node's
//! router can be driven while the fabric is borrowed mutably and every
//! other router is read through its capability interface.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use hera_core::{Message, MessageId, SimTime, SimulationIdentity};
use hera_logging::NodeContextGuard;
use hera_routing::{
    EncounterOutcome, ForwardingHost, HeraRouter, QueueMode, QueueOrdering, RoutingScheme,
    TransferResult,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::events::{EventQueue, SimEvent, TransferId};
use crate::report::{OmegaSample, SimReport, SimStats};
use crate::settings::{SettingsError, SimSettings};
use crate::trace::{load_trace, ConnectionEvent, TraceError};

type Id = SimulationIdentity;

/// Errors raised while building a world
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Connection trace: {0}")]
    Trace(#[from] TraceError),
}

/// Routing scheme that only ever hands messages to their destination
///
/// It declines the reachability capability, so HERA nodes meeting it
/// record the contact but have nothing to merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDeliveryScheme;

impl RoutingScheme<Id> for DirectDeliveryScheme {
    fn scheme_name(&self) -> &'static str {
        "DirectDelivery"
    }
}

/// The routing scheme running on one node
#[derive(Debug)]
pub enum NodeRouter {
    Hera(HeraRouter<Id>),
    Direct(DirectDeliveryScheme),
}

impl NodeRouter {
    /// The scheme as peers see it
    pub fn scheme(&self) -> &dyn RoutingScheme<Id> {
        match self {
            NodeRouter::Hera(router) => router,
            NodeRouter::Direct(scheme) => scheme,
        }
    }

    /// The HERA router, if this node runs one
    pub fn as_hera(&self) -> Option<&HeraRouter<Id>> {
        match self {
            NodeRouter::Hera(router) => Some(router),
            NodeRouter::Direct(_) => None,
        }
    }
}

/// Per-node buffer and transfer state
#[derive(Debug, Default)]
struct NodeState {
    /// Messages awaiting forwarding, in arrival order
    buffer: Vec<Message<Id>>,
    /// Every message this node has held or received
    seen: HashSet<MessageId>,
    /// Transfer this node is sending or receiving
    active_transfer: Option<TransferId>,
}

#[derive(Debug)]
struct Transfer {
    from: Id,
    to: Id,
    message: Message<Id>,
}

/// Connections, buffers, transfers and the clockwork around them
#[derive(Debug)]
pub struct Fabric {
    nodes: Vec<NodeState>,
    links: BTreeSet<(Id, Id)>,
    transfers: HashMap<TransferId, Transfer>,
    next_transfer: TransferId,
    transmit_speed: f64,
    queue: EventQueue,
    stats: SimStats,
}

fn link_key(a: Id, b: Id) -> (Id, Id) {
    if a < b { (a, b) } else { (b, a) }
}

impl Fabric {
    fn new(node_count: u32, transmit_speed: f64) -> Self {
        Self {
            nodes: (0..node_count).map(|_| NodeState::default()).collect(),
            links: BTreeSet::new(),
            transfers: HashMap::new(),
            next_transfer: 0,
            transmit_speed,
            queue: EventQueue::new(),
            stats: SimStats::default(),
        }
    }

    fn node(&self, id: Id) -> Option<&NodeState> {
        self.nodes.get(id.index() as usize)
    }

    fn node_mut(&mut self, id: Id) -> Option<&mut NodeState> {
        self.nodes.get_mut(id.index() as usize)
    }

    fn contains(&self, id: Id) -> bool {
        self.node(id).is_some()
    }

    /// Check whether a connection between `a` and `b` is up
    pub fn is_linked(&self, a: Id, b: Id) -> bool {
        self.links.contains(&link_key(a, b))
    }

    /// Peers currently connected to `node`, in identity order
    pub fn neighbors(&self, node: Id) -> Vec<Id> {
        self.links
            .iter()
            .filter_map(|&(a, b)| {
                if a == node {
                    Some(b)
                } else if b == node {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Check whether `node` is neither sending nor receiving
    pub fn is_idle(&self, node: Id) -> bool {
        self.node(node).is_some_and(|n| n.active_transfer.is_none())
    }

    /// Check whether `node` has ever held or received `message`
    pub fn holds(&self, node: Id, message: &MessageId) -> bool {
        self.node(node).is_some_and(|n| n.seen.contains(message))
    }

    /// Messages buffered at `node`
    pub fn buffer(&self, node: Id) -> &[Message<Id>] {
        self.node(node).map(|n| n.buffer.as_slice()).unwrap_or(&[])
    }

    /// Bring a link up; false if it already was
    fn add_link(&mut self, a: Id, b: Id) -> bool {
        self.links.insert(link_key(a, b))
    }

    /// Take a link down, aborting any transfer across it
    fn remove_link(&mut self, a: Id, b: Id) {
        if !self.links.remove(&link_key(a, b)) {
            return;
        }

        let aborted: Vec<TransferId> = self
            .transfers
            .iter()
            .filter(|(_, t)| link_key(t.from, t.to) == link_key(a, b))
            .map(|(&id, _)| id)
            .collect();

        for id in aborted {
            if let Some(transfer) = self.transfers.remove(&id) {
                self.release(&transfer);
                self.stats.aborted += 1;
                debug!(
                    message = %transfer.message.id,
                    from = %transfer.from,
                    to = %transfer.to,
                    "Transfer aborted by link down"
                );
            }
        }
    }

    fn release(&mut self, transfer: &Transfer) {
        for id in [transfer.from, transfer.to] {
            if let Some(node) = self.node_mut(id) {
                node.active_transfer = None;
            }
        }
    }

    /// Place a newly created message in its source's buffer
    fn originate(&mut self, message: Message<Id>) {
        self.stats.created += 1;
        if let Some(node) = self.node_mut(message.source) {
            node.seen.insert(message.id);
            node.buffer.push(message);
        }
    }

    /// Start sending a copy of `message` from `from` to `to`
    fn start_transfer(&mut self, from: Id, to: Id, message: &Message<Id>, now: SimTime) -> TransferResult {
        if !self.is_linked(from, to) {
            return TransferResult::Denied;
        }
        if !self.is_idle(from) || !self.is_idle(to) {
            return TransferResult::Busy;
        }
        if self.holds(to, &message.id) {
            self.stats.duplicates_refused += 1;
            return TransferResult::Denied;
        }

        let id = self.next_transfer;
        self.next_transfer += 1;
        for node in [from, to] {
            if let Some(state) = self.node_mut(node) {
                state.active_transfer = Some(id);
            }
        }

        let duration = message.size as f64 / self.transmit_speed;
        self.queue.push(now + duration, SimEvent::TransferDone(id));
        self.transfers.insert(
            id,
            Transfer {
                from,
                to,
                message: message.clone(),
            },
        );
        self.stats.started += 1;

        trace!(message = %message.id, %from, %to, duration, "Transfer started");
        TransferResult::Accepted
    }

    /// Finish a transfer; a no-op if it was aborted meanwhile
    fn complete_transfer(&mut self, id: TransferId, now: SimTime) {
        let Some(transfer) = self.transfers.remove(&id) else {
            return;
        };
        self.release(&transfer);
        self.stats.relayed += 1;

        let received = transfer.message.relayed(now);
        let message_id = received.id;
        let first_time = self
            .node_mut(transfer.to)
            .is_some_and(|node| node.seen.insert(message_id));

        if received.is_destined_for(&transfer.to) {
            if first_time {
                self.stats
                    .record_delivery(now - received.created_at, received.hop_count);
                info!(
                    message = %message_id,
                    to = %transfer.to,
                    hops = received.hop_count,
                    latency = now - received.created_at,
                    "Message delivered"
                );
            }
            // The sender has no further use for its copy
            if let Some(sender) = self.node_mut(transfer.from) {
                sender.buffer.retain(|m| m.id != message_id);
            }
        } else if let Some(node) = self.node_mut(transfer.to) {
            node.buffer.push(received);
        }
    }

    /// Hand one buffered message straight to a connected destination
    ///
    /// Returns true if a transfer was started.
    fn deliver_direct(&mut self, node: Id, now: SimTime, queue_mode: QueueMode) -> bool {
        let mut messages = self.buffer(node).to_vec();
        messages.sort_by(|a, b| queue_mode.compare(a, b));

        for message in &messages {
            let destination = message.destination;
            if !self.is_linked(node, destination)
                || !self.is_idle(destination)
                || self.holds(destination, &message.id)
            {
                continue;
            }
            if self
                .start_transfer(node, destination, message, now)
                .is_accepted()
            {
                return true;
            }
        }
        false
    }
}

/// What one node's router sees of the world during its forwarding cycle
struct NodeHost<'a> {
    local: Id,
    now: SimTime,
    routers: &'a [NodeRouter],
    fabric: &'a mut Fabric,
}

impl ForwardingHost<Id> for NodeHost<'_> {
    fn buffered_messages(&self) -> Vec<Message<Id>> {
        self.fabric.buffer(self.local).to_vec()
    }

    fn connected_peers(&self) -> Vec<Id> {
        self.fabric.neighbors(self.local)
    }

    fn is_peer_idle(&self, peer: &Id) -> bool {
        self.fabric.is_idle(*peer)
    }

    fn peer_has_message(&self, peer: &Id, message: &MessageId) -> bool {
        self.fabric.holds(*peer, message)
    }

    fn peer_scheme(&self, peer: &Id) -> Option<&dyn RoutingScheme<Id>> {
        self.routers.get(peer.index() as usize).map(NodeRouter::scheme)
    }

    fn attempt_transfer(&mut self, message: &Message<Id>, peer: &Id) -> TransferResult {
        self.fabric.start_transfer(self.local, *peer, message, self.now)
    }
}

/// A complete simulation run
pub struct World {
    settings: SimSettings,
    routers: Vec<NodeRouter>,
    fabric: Fabric,
    rng: StdRng,
    now: SimTime,
    next_message: u64,
    omega_samples: Vec<OmegaSample>,
    run_id: Uuid,
}

impl World {
    /// Create a world with nodes and routers but no traffic
    ///
    /// Update cycles (and omega sampling, if configured) are scheduled;
    /// connections and messages are added with the `schedule_*` and
    /// `enable_*` methods.
    pub fn new(settings: SimSettings) -> Result<Self, WorldError> {
        settings.validate()?;
        let config = Arc::new(settings.router_config()?);
        let scenario = &settings.scenario;

        let prototype =
            HeraRouter::new(Id::new(0), config).with_queue_mode(scenario.queue_mode);
        let direct: HashSet<u32> = scenario.direct_delivery_nodes.iter().copied().collect();
        let routers: Vec<NodeRouter> = (0..scenario.nodes)
            .map(|n| {
                if direct.contains(&n) {
                    NodeRouter::Direct(DirectDeliveryScheme)
                } else {
                    NodeRouter::Hera(prototype.replicate(Id::new(n)))
                }
            })
            .collect();

        let mut fabric = Fabric::new(scenario.nodes, scenario.transmit_speed);
        fabric.queue.push(scenario.update_interval, SimEvent::Update);
        if let Some(interval) = settings.report.omega_sample_interval {
            fabric.queue.push(interval, SimEvent::OmegaSample);
        }

        let rng = StdRng::seed_from_u64(scenario.seed);
        let run_id = Uuid::new_v4();
        info!(
            scenario = %scenario.name,
            nodes = scenario.nodes,
            direct_delivery = direct.len(),
            %run_id,
            "World created"
        );

        Ok(Self {
            rng,
            settings,
            routers,
            fabric,
            now: 0.0,
            next_message: 0,
            omega_samples: Vec::new(),
            run_id,
        })
    }

    /// Build a world with the traffic its settings describe
    ///
    /// Connections come from the trace file if one is set, otherwise from
    /// the random encounter model. Messages always come from the random
    /// message generator.
    pub fn from_settings(mut settings: SimSettings) -> Result<Self, WorldError> {
        let trace = match &settings.scenario.trace_file {
            Some(path) => Some(load_trace(path)?),
            None => None,
        };

        if let Some(events) = &trace {
            let needed = events.iter().map(|e| e.max_index() + 1).max().unwrap_or(0);
            if needed > settings.scenario.nodes {
                warn!(
                    configured = settings.scenario.nodes,
                    needed, "Trace mentions more nodes than configured, growing the world"
                );
                settings.scenario.nodes = needed;
            }
        }

        let mut world = Self::new(settings)?;
        match trace {
            Some(events) => world.apply_trace(&events),
            None => world.enable_random_encounters(),
        }
        world.enable_random_messages();
        Ok(world)
    }

    /// Schedule every event of a connection trace
    pub fn apply_trace(&mut self, events: &[ConnectionEvent]) {
        for event in events {
            self.schedule_link(event.time, event.a, event.b, event.up);
        }
        debug!(events = events.len(), "Connection trace scheduled");
    }

    /// Schedule a connection change
    pub fn schedule_link(&mut self, time: SimTime, a: Id, b: Id, up: bool) {
        let event = if up {
            SimEvent::LinkUp(a, b)
        } else {
            SimEvent::LinkDown(a, b)
        };
        self.fabric.queue.push(time, event);
    }

    /// Schedule a message creation
    pub fn schedule_message(&mut self, time: SimTime, source: Id, destination: Id, size: u64) {
        self.fabric.queue.push(
            time,
            SimEvent::CreateMessage {
                source,
                destination,
                size,
            },
        );
    }

    /// Start the random encounter model
    pub fn enable_random_encounters(&mut self) {
        let delay = self.next_encounter_delay();
        self.fabric.queue.push(self.now + delay, SimEvent::RandomEncounter);
    }

    /// Start the random message generator
    pub fn enable_random_messages(&mut self) {
        let delay = self.next_message_delay();
        self.fabric.queue.push(self.now + delay, SimEvent::RandomMessage);
    }

    /// Run to the configured end time and report
    pub fn run(&mut self) -> SimReport {
        self.run_until(self.settings.scenario.end_time);
        self.report()
    }

    /// Process every event due at or before `limit`
    pub fn run_until(&mut self, limit: SimTime) {
        while let Some((time, event)) = self.fabric.queue.pop_until(limit) {
            self.now = time;
            self.handle(event);
        }
        self.now = self.now.max(limit);
    }

    fn handle(&mut self, event: SimEvent) {
        match event {
            SimEvent::LinkUp(a, b) => self.link_up(a, b),
            SimEvent::LinkDown(a, b) => self.fabric.remove_link(a, b),
            SimEvent::RandomEncounter => {
                self.random_encounter();
                let delay = self.next_encounter_delay();
                self.fabric.queue.push(self.now + delay, SimEvent::RandomEncounter);
            }
            SimEvent::CreateMessage {
                source,
                destination,
                size,
            } => self.create_message(source, destination, size),
            SimEvent::RandomMessage => {
                let (source, destination) = self.random_pair();
                let [min, max] = self.settings.events.message_size;
                let size = self.rng.random_range(min..=max);
                self.create_message(source, destination, size);

                let delay = self.next_message_delay();
                self.fabric.queue.push(self.now + delay, SimEvent::RandomMessage);
            }
            SimEvent::TransferDone(id) => self.fabric.complete_transfer(id, self.now),
            SimEvent::Update => {
                self.update();
                let interval = self.settings.scenario.update_interval;
                self.fabric.queue.push(self.now + interval, SimEvent::Update);
            }
            SimEvent::OmegaSample => {
                self.sample_omegas();
                if let Some(interval) = self.settings.report.omega_sample_interval {
                    self.fabric.queue.push(self.now + interval, SimEvent::OmegaSample);
                }
            }
        }
    }

    fn link_up(&mut self, a: Id, b: Id) {
        if a == b || !self.fabric.contains(a) || !self.fabric.contains(b) {
            warn!(%a, %b, "Ignoring connection to unknown node");
            return;
        }
        if !self.fabric.add_link(a, b) {
            return;
        }
        self.fabric.stats.encounters += 1;

        // Both endpoints learn from the encounter, lower identity first
        let (low, high) = link_key(a, b);
        for (node, peer) in [(low, high), (high, low)] {
            let Some(router) = self.routers[node.index() as usize].as_hera() else {
                continue;
            };
            let _ctx = NodeContextGuard::with_run_id(&node, self.run_id);
            let peer_scheme = self.routers[peer.index() as usize].scheme();

            if let Some(remote) = peer_scheme.reachability() {
                match remote.snapshot(self.now).to_bytes() {
                    Ok(bytes) => self.fabric.stats.control_bytes += bytes.len() as u64,
                    Err(e) => warn!(%peer, error = %e, "Failed to encode snapshot"),
                }
            }

            if let EncounterOutcome::DirectOnly { .. } =
                router.on_encounter(&peer, peer_scheme, self.now)
            {
                self.fabric.stats.incompatible_encounters += 1;
            }
        }
    }

    fn create_message(&mut self, source: Id, destination: Id, size: u64) {
        if source == destination || !self.fabric.contains(source) || !self.fabric.contains(destination) {
            warn!(%source, %destination, "Ignoring message with invalid endpoints");
            return;
        }
        let id = MessageId(self.next_message);
        self.next_message += 1;

        debug!(message = %id, %source, %destination, size, "Message created");
        self.fabric
            .originate(Message::new(id, source, destination, size, self.now));
    }

    /// One forwarding cycle over every idle node, in identity order
    fn update(&mut self) {
        let queue_mode = self.settings.scenario.queue_mode;
        for (index, router) in self.routers.iter().enumerate() {
            let node = Id::new(index as u32);
            if !self.fabric.is_idle(node) || self.fabric.buffer(node).is_empty() {
                continue;
            }

            let _ctx = NodeContextGuard::with_run_id(&node, self.run_id);
            if self.fabric.deliver_direct(node, self.now, queue_mode) {
                continue;
            }

            if let NodeRouter::Hera(router) = router {
                let mut host = NodeHost {
                    local: node,
                    now: self.now,
                    routers: &self.routers,
                    fabric: &mut self.fabric,
                };
                router.on_tick(self.now, &mut host);
            }
        }
    }

    fn sample_omegas(&mut self) {
        for router in self.routers.iter().filter_map(NodeRouter::as_hera) {
            let info = router.routing_info(self.now);
            let node = info.node;
            let time = self.now;
            self.omega_samples
                .extend(info.predictions.into_iter().map(|(destination, omega)| OmegaSample {
                    time,
                    node,
                    destination,
                    omega,
                }));
        }
    }

    fn random_encounter(&mut self) {
        let (a, b) = self.random_pair();
        if self.fabric.is_linked(a, b) {
            return;
        }
        let [min, max] = self.settings.mobility.contact_duration;
        let duration = self.rng.random_range(min..=max);

        self.link_up(a, b);
        self.fabric.queue.push(self.now + duration, SimEvent::LinkDown(a, b));
    }

    /// Two distinct nodes chosen uniformly
    fn random_pair(&mut self) -> (Id, Id) {
        let count = self.routers.len() as u32;
        let a = self.rng.random_range(0..count);
        let mut b = self.rng.random_range(0..count - 1);
        if b >= a {
            b += 1;
        }
        (Id::new(a), Id::new(b))
    }

    /// Exponential inter-arrival time for the encounter model
    fn next_encounter_delay(&mut self) -> SimTime {
        let u: f64 = self.rng.random();
        -(1.0 - u).ln() / self.settings.mobility.encounter_rate
    }

    fn next_message_delay(&mut self) -> SimTime {
        let [min, max] = self.settings.events.message_interval;
        self.rng.random_range(min..=max)
    }

    /// Summarize the run so far
    pub fn report(&self) -> SimReport {
        SimReport {
            scenario: self.settings.scenario.name.clone(),
            end_time: self.now,
            nodes: self.routers.len() as u32,
            stats: self.fabric.stats.summary(),
            routing: self
                .routers
                .iter()
                .filter_map(NodeRouter::as_hera)
                .map(|router| router.routing_info(self.now))
                .collect(),
            omega_samples: self.omega_samples.clone(),
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The settings this world was built from
    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    /// The router on `node`
    pub fn router(&self, node: Id) -> Option<&NodeRouter> {
        self.routers.get(node.index() as usize)
    }

    /// The HERA router on `node`, if it runs one
    pub fn hera(&self, node: Id) -> Option<&HeraRouter<Id>> {
        self.router(node).and_then(NodeRouter::as_hera)
    }

    /// Buffers, links and counters
    pub fn fabric(&self) -> &Fabric {
        &self.fabric
    }

    /// Raw counters
    pub fn stats(&self) -> &SimStats {
        &self.fabric.stats
    }

    /// Samples collected so far
    pub fn omega_samples(&self) -> &[OmegaSample] {
        &self.omega_samples
    }
}
