//! HERA routing performance benchmarks
//!
//! Benchmarks for the hot paths of a simulation run:
//! - Aging a large matrix
//! - Merging a peer snapshot
//! - Omega lookups
//! - A full forwarding cycle
//!
//! Run with: cargo bench -p hera-routing

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use hera_core::{Message, MessageId, SimulationIdentity};
use hera_routing::{
    ForwardingHost, HeraConfig, HeraRouter, ReachabilitySnapshot, RoutingScheme, TransferResult,
};

// ============================================================================
// Helpers
// ============================================================================

fn make_id(n: u32) -> SimulationIdentity {
    SimulationIdentity(n)
}

fn make_config() -> Arc<HeraConfig> {
    Arc::new(HeraConfig::with_time_unit(60.0).unwrap())
}

/// Router that has directly met `peers` nodes
fn make_populated_router(local: u32, peers: u32) -> HeraRouter<SimulationIdentity> {
    let router = HeraRouter::new(make_id(local), make_config());
    let other = router.replicate(make_id(u32::MAX));
    for n in 0..peers {
        if n != local {
            router.on_encounter(&make_id(n), &other, 0.0);
        }
    }
    router
}

struct BenchHost<'a> {
    messages: Vec<Message<SimulationIdentity>>,
    peers: Vec<&'a HeraRouter<SimulationIdentity>>,
}

impl ForwardingHost<SimulationIdentity> for BenchHost<'_> {
    fn buffered_messages(&self) -> Vec<Message<SimulationIdentity>> {
        self.messages.clone()
    }

    fn connected_peers(&self) -> Vec<SimulationIdentity> {
        self.peers.iter().map(|p| *p.local_id()).collect()
    }

    fn is_peer_idle(&self, _peer: &SimulationIdentity) -> bool {
        true
    }

    fn peer_has_message(&self, _peer: &SimulationIdentity, _message: &MessageId) -> bool {
        false
    }

    fn peer_scheme(
        &self,
        peer: &SimulationIdentity,
    ) -> Option<&dyn RoutingScheme<SimulationIdentity>> {
        self.peers
            .iter()
            .find(|p| p.local_id() == peer)
            .map(|p| *p as &dyn RoutingScheme<SimulationIdentity>)
    }

    fn attempt_transfer(
        &mut self,
        _message: &Message<SimulationIdentity>,
        _peer: &SimulationIdentity,
    ) -> TransferResult {
        // Refuse everything so every candidate is visited
        TransferResult::Denied
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_matrix_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("reachability_matrix");

    for size in [100u32, 1_000] {
        let router = make_populated_router(0, size);
        let mut now = 0.0;
        group.bench_function(format!("age_{}_entries", size), |b| {
            b.iter(|| {
                now += 1.0;
                router.store().age(black_box(now))
            })
        });

        let router = make_populated_router(0, size);
        let peer = make_populated_router(size, size * 2);
        let snapshot: ReachabilitySnapshot<SimulationIdentity> = peer.snapshot(0.0);
        group.bench_function(format!("merge_{}_destinations", snapshot.len()), |b| {
            b.iter(|| router.store().merge_transitive(black_box(&snapshot), 0.0))
        });

        let router = make_populated_router(0, size);
        group.bench_function(format!("omega_{}_entries", size), |b| {
            let mut n = 0u32;
            b.iter(|| {
                n = (n + 1) % size;
                router.omega(black_box(&make_id(n)), 0.0)
            })
        });

        group.bench_function(format!("snapshot_{}_entries", size), |b| {
            b.iter(|| router.snapshot(black_box(0.0)))
        });
    }

    group.finish();
}

fn bench_forwarding_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("forwarding");

    let local = make_populated_router(0, 10);
    let peers: Vec<_> = (1..=10).map(|n| make_populated_router(n, 200)).collect();
    let messages: Vec<_> = (0..50u64)
        .map(|n| {
            Message::new(
                MessageId(n),
                make_id(0),
                make_id(100 + (n as u32 % 50)),
                1_000,
                n as f64,
            )
        })
        .collect();

    let mut host = BenchHost {
        messages,
        peers: peers.iter().collect(),
    };

    group.bench_function("on_tick_50_messages_10_peers", |b| {
        b.iter(|| local.on_tick(black_box(0.0), &mut host))
    });

    group.finish();
}

criterion_group!(benches, bench_matrix_operations, bench_forwarding_cycle);
criterion_main!(benches);
