//! World-level scenarios over small deterministic traces
//!
//! These exercise the full path: settings, event queue, encounters on
//! both endpoints, direct delivery, HERA forwarding and transfer timing.

use hera_core::{MessageId, SimulationIdentity};

use crate::settings::SimSettings;
use crate::world::{NodeRouter, World};

const N0: SimulationIdentity = SimulationIdentity(0);
const N1: SimulationIdentity = SimulationIdentity(1);
const N2: SimulationIdentity = SimulationIdentity(2);
const N3: SimulationIdentity = SimulationIdentity(3);

fn small_world(nodes: u32, transmit_speed: f64) -> World {
    let mut settings = SimSettings::random(nodes, 1_000.0, 1);
    settings.scenario.transmit_speed = transmit_speed;
    World::new(settings).unwrap()
}

#[test]
fn test_link_down_aborts_transfer() {
    // 10 KB at 1 KB/s: every transfer takes 10 seconds
    let mut world = small_world(2, 1_000.0);
    world.schedule_link(0.0, N0, N1, true);
    world.schedule_message(0.0, N0, N1, 10_000);
    world.schedule_link(5.0, N0, N1, false);
    world.schedule_link(20.0, N0, N1, true);

    world.run_until(15.0);
    assert_eq!(world.stats().started, 1);
    assert_eq!(world.stats().aborted, 1);
    assert_eq!(world.stats().delivered, 0);
    assert_eq!(world.fabric().buffer(N0).len(), 1);

    world.run_until(100.0);
    let stats = world.report().stats;
    assert_eq!(stats.started, 2);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.latency_avg, Some(30.0));
    // Delivered copies leave the sender's buffer
    assert!(world.fabric().buffer(N0).is_empty());
}

#[test]
fn test_direct_delivery_short_circuits_forwarding() {
    let mut world = small_world(3, 1_000_000.0);
    // n2 knows n1 far better than n0 does
    for k in 0..5 {
        let t = k as f64 * 10.0;
        world.schedule_link(t, N1, N2, true);
        world.schedule_link(t + 5.0, N1, N2, false);
    }
    world.schedule_link(50.0, N0, N2, true);
    world.schedule_link(50.0, N0, N1, true);
    world.schedule_message(50.0, N0, N1, 1_000);

    world.run_until(60.0);
    let stats = world.report().stats;
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.hopcount_avg, Some(1.0));
    assert!(!world.fabric().holds(N2, &MessageId(0)));
}

#[test]
fn test_forwarding_moves_copy_toward_destination() {
    let mut world = small_world(3, 1_000_000.0);
    world.schedule_link(0.0, N1, N2, true);
    world.schedule_link(10.0, N1, N2, false);
    world.schedule_link(20.0, N0, N1, true);
    world.schedule_message(20.0, N0, N2, 1_000);

    world.run_until(30.0);
    assert!(world.fabric().holds(N1, &MessageId(0)));
    // Multi-copy: the source keeps its own copy
    assert_eq!(world.fabric().buffer(N0).len(), 1);
    assert_eq!(world.fabric().buffer(N1)[0].hop_count, 1);
}

#[test]
fn test_worse_positioned_peer_gets_nothing() {
    let mut world = small_world(3, 1_000_000.0);
    // n0 has met n2; n1 never has
    world.schedule_link(0.0, N0, N2, true);
    world.schedule_link(10.0, N0, N2, false);
    world.schedule_link(20.0, N0, N1, true);
    world.schedule_message(20.0, N0, N2, 1_000);

    world.run_until(60.0);
    assert_eq!(world.stats().started, 0);
    assert!(!world.fabric().holds(N1, &MessageId(0)));
}

#[test]
fn test_busy_nodes_wait_for_transfer_to_finish() {
    let mut world = small_world(2, 1_000.0);
    world.schedule_link(0.0, N0, N1, true);
    world.schedule_message(0.0, N0, N1, 10_000);
    world.schedule_message(0.0, N0, N1, 10_000);

    world.run_until(10.5);
    assert_eq!(world.stats().started, 1);

    world.run_until(30.0);
    assert_eq!(world.stats().started, 2);
    assert_eq!(world.stats().delivered, 2);
}

#[test]
fn test_mixed_protocol_encounter() {
    let mut settings = SimSettings::random(3, 1_000.0, 1);
    settings.scenario.direct_delivery_nodes = vec![0];
    let mut world = World::new(settings).unwrap();

    world.schedule_link(0.0, N0, N1, true);
    world.schedule_message(0.0, N1, N2, 1_000);
    world.run_until(30.0);

    assert!(matches!(world.router(N0), Some(NodeRouter::Direct(_))));
    assert_eq!(world.stats().encounters, 1);
    assert_eq!(world.stats().incompatible_encounters, 1);
    assert_eq!(world.stats().started, 0);

    // n1 still counts the direct contact
    let n1 = world.hera(N1).unwrap();
    assert!(n1.store().is_tracked(&N0));
    assert!(n1.omega(&N0, world.now()) > 0.0);
    assert!(world.hera(N0).is_none());
}

#[test]
fn test_omega_sampling() {
    let mut settings = SimSettings::random(2, 1_000.0, 1);
    settings.report.omega_sample_interval = Some(60.0);
    let mut world = World::new(settings).unwrap();
    world.schedule_link(0.0, N0, N1, true);

    world.run_until(180.0);
    let samples = world.omega_samples();
    assert_eq!(samples.len(), 6);
    assert_eq!(samples[0].time, 60.0);
    assert_eq!(samples[0].node, N0);
    assert_eq!(samples[0].destination, N1);
    assert!((samples[0].omega - 0.98).abs() < 1e-9);
}

#[test]
fn test_trace_driven_line() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/settings/line.toml");
    let settings = SimSettings::load(path).unwrap();
    let mut world = World::from_settings(settings).unwrap();

    let report = world.run();
    assert_eq!(report.stats.encounters, 6);
    assert_eq!(report.routing.len(), 4);

    // n3 -> n2 -> n1 -> n0 spreads n3's reachability two hops out
    let n0 = world.hera(N0).unwrap();
    let entry = n0.store().entry_for(&N3, world.now());
    assert_eq!(entry[0], 0.0);
    assert!(entry[2] > 0.0);
}

#[test]
fn test_bundled_settings_parse() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/settings/campus.toml");
    let settings = SimSettings::load(path).unwrap();
    assert_eq!(settings.scenario.nodes, 40);
    assert_eq!(settings.scenario.direct_delivery_nodes.len(), 5);
}
