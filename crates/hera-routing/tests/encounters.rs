//! Encounter and aging behavior across several routers
//!
//! These tests drive routers the way the simulator does: both endpoints
//! of a new connection call `on_encounter`, lower identity first.

use std::sync::Arc;

use hera_core::SimulationIdentity;
use hera_routing::{
    EncounterOutcome, HeraConfig, HeraError, HeraRouter, HopVector, RoutingScheme,
};

const EPS: f64 = 1e-9;

fn id(n: u32) -> SimulationIdentity {
    SimulationIdentity(n)
}

fn three_hop_config() -> Arc<HeraConfig> {
    Arc::new(
        HeraConfig::new(3, vec![1.0, 0.5, 0.05], vec![1.0, 0.5, 0.05], 0.98, 60.0)
            .expect("valid config"),
    )
}

fn encounter(
    a: &HeraRouter<SimulationIdentity>,
    b: &HeraRouter<SimulationIdentity>,
    now: f64,
) {
    a.on_encounter(b.local_id(), b, now);
    b.on_encounter(a.local_id(), a, now);
}

fn assert_vector(actual: &HopVector, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (h, want) in expected.iter().enumerate() {
        assert!(
            (actual[h] - want).abs() < EPS,
            "level {}: expected {}, got {}",
            h,
            want,
            actual[h]
        );
    }
}

#[test]
fn test_worked_scenario() {
    let config = three_hop_config();
    let a = HeraRouter::new(id(0), Arc::clone(&config));
    let b = a.replicate(id(1));
    let c = a.replicate(id(2));

    // t=0: B meets C
    encounter(&b, &c, 0.0);
    assert_vector(&b.store().entry_for(&id(2), 0.0), &[1.0, 0.0, 0.0]);

    // t=60: A meets B; B's matrix is aged once before being merged
    a.on_encounter(&id(1), &b, 60.0);

    assert_vector(&b.store().entry_for(&id(2), 60.0), &[0.98, 0.0, 0.0]);
    assert_vector(&a.store().entry_for(&id(1), 60.0), &[1.0, 0.0, 0.0]);
    assert_vector(&a.store().entry_for(&id(2), 60.0), &[0.0, 0.49, 0.0]);
    assert!((a.omega(&id(2), 60.0) - 0.245).abs() < EPS);
}

#[test]
fn test_repeated_contacts_accumulate_without_cap() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let b = a.replicate(id(1));

    for _ in 0..25 {
        a.on_encounter(&id(1), &b, 0.0);
    }

    // Same instant: no aging, pure accrual
    assert!((a.store().entry_for(&id(1), 0.0)[0] - 25.0).abs() < EPS);
    assert!(a.omega(&id(1), 0.0) > 1.0);
}

#[test]
fn test_self_is_never_tracked() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let b = a.replicate(id(1));

    encounter(&a, &b, 0.0);
    encounter(&a, &b, 10.0);

    // B knows A directly; merging B into A must skip A itself
    assert!(b.store().is_tracked(&id(0)));
    assert!(!a.store().is_tracked(&id(0)));
    assert_eq!(a.omega(&id(0), 10.0), 0.0);
    assert!(a.snapshot(10.0).get(&id(0)).is_none());
}

#[test]
fn test_aging_is_idempotent_at_same_instant() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let b = a.replicate(id(1));
    a.on_encounter(&id(1), &b, 0.0);

    let first = a.omega(&id(1), 120.0);
    let second = a.omega(&id(1), 120.0);
    assert_eq!(first, second);
    assert!((first - 0.98_f64.powi(2)).abs() < EPS);
}

#[test]
fn test_aging_is_fractional() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let b = a.replicate(id(1));
    a.on_encounter(&id(1), &b, 0.0);

    // Half a unit applies sqrt(alpha)
    let omega = a.omega(&id(1), 30.0);
    assert!((omega - 0.98_f64.sqrt()).abs() < EPS);
}

#[test]
fn test_clock_regression_is_ignored() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let b = a.replicate(id(1));
    a.on_encounter(&id(1), &b, 120.0);

    let before = a.omega(&id(1), 120.0);
    let after = a.omega(&id(1), 60.0);
    assert_eq!(before, after);
    assert_eq!(a.store().last_age_time(), 120.0);
}

#[test]
fn test_two_hop_chain_propagates_one_level_per_encounter() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let b = a.replicate(id(1));
    let c = a.replicate(id(2));
    let d = a.replicate(id(3));

    encounter(&c, &d, 0.0); // C knows D at level 0
    encounter(&b, &c, 0.0); // B knows D at level 1
    encounter(&a, &b, 0.0); // A knows D at level 2

    let a_to_d = a.store().entry_for(&id(3), 0.0);
    assert_eq!(a_to_d[0], 0.0);
    assert_eq!(a_to_d[1], 0.0);
    assert!((a_to_d[2] - 0.05 * 0.5 * 1.0).abs() < EPS);
}

struct Epidemic;

impl RoutingScheme<SimulationIdentity> for Epidemic {
    fn scheme_name(&self) -> &'static str {
        "Epidemic"
    }
}

#[test]
fn test_incompatible_peer_is_handled() {
    let a = HeraRouter::new(id(0), three_hop_config());

    let outcome = a.on_encounter(&id(7), &Epidemic, 0.0);
    assert!(matches!(
        outcome,
        EncounterOutcome::DirectOnly {
            reason: HeraError::IncompatiblePeer { .. },
            ..
        }
    ));

    // The direct contact still counts
    assert_vector(&a.store().entry_for(&id(7), 0.0), &[1.0, 0.0, 0.0]);
    assert_eq!(a.store().known_destinations(), 1);
}

#[test]
fn test_peer_with_wider_vectors_is_read_within_bounds() {
    let a = HeraRouter::new(id(0), three_hop_config());
    let wide = HeraRouter::new(id(1), Arc::new(HeraConfig::with_time_unit(60.0).unwrap()));
    let c = wide.replicate(id(2));

    encounter(&wide, &c, 0.0);
    let outcome = a.on_encounter(&id(1), &wide, 0.0);

    assert!(outcome.is_merged());
    assert_eq!(a.store().entry_for(&id(2), 0.0).len(), 3);
}

#[test]
fn test_long_running_growth_is_unbounded_and_stable() {
    const NODES: u32 = 200;
    let prototype = HeraRouter::new(id(0), three_hop_config());
    let routers: Vec<_> = (0..NODES).map(|n| prototype.replicate(id(n))).collect();

    // Node 0 meets everyone over a long horizon
    let mut now = 0.0;
    for round in 0..5 {
        for peer in routers.iter().skip(1) {
            now += 600.0;
            encounter(&routers[0], peer, now);
        }
        assert_eq!(
            routers[0].store().known_destinations(),
            (NODES - 1) as usize,
            "round {}",
            round
        );
    }

    // Entries are never evicted, only decayed; scores stay finite
    for (dest, omega) in routers[0].routing_info(now).predictions {
        assert!(omega.is_finite(), "omega for {} is not finite", dest);
        assert!(omega >= 0.0);
    }
}
