//! Pre-defined scenarios
//!
//! Includes the three-node worked example and a seeded random run.

use hera_core::{SimulationIdentity, SimTime};
use hera_routing::{HeraSettings, HopVector};
use tracing::info;

use crate::report::SimReport;
use crate::settings::SimSettings;
use crate::world::{World, WorldError};

const A: SimulationIdentity = SimulationIdentity(0);
const B: SimulationIdentity = SimulationIdentity(1);
const C: SimulationIdentity = SimulationIdentity(2);

/// Settings for the worked example: H=3, lambda = gamma = [1, 0.5, 0.05]
pub fn worked_example_settings() -> SimSettings {
    let mut settings = SimSettings::random(3, 180.0, 0);
    settings.scenario.name = "worked-example".to_string();
    settings.router = HeraSettings {
        seconds_in_time_unit: Some(60.0),
        hop_count: Some(3),
        lambda: Some(vec![1.0, 0.5, 0.05]),
        gamma: Some(vec![1.0, 0.5, 0.05]),
        alpha: Some(0.98),
    };
    settings
}

/// Matrix values observed at the end of the encounter phase
#[derive(Debug, Clone)]
pub struct WorkedExample {
    pub b_to_c: HopVector,
    pub a_to_b: HopVector,
    pub a_to_c: HopVector,
    pub omega_a_c: f64,
    pub omega_b_c: f64,
    pub report: SimReport,
}

fn entry(world: &World, node: SimulationIdentity, peer: SimulationIdentity, now: SimTime) -> HopVector {
    world
        .hera(node)
        .map(|router| router.store().entry_for(&peer, now))
        .unwrap_or_default()
}

/// Run the worked example:
///
/// ```text
/// t=0    B meets C                     B.reach[C] = [1, 0, 0]
/// t=60   A meets B                     B's matrix ages by 0.98 first
///                                      A.reach[B] = [1, 0, 0]
///                                      A.reach[C] = [0, 0.49, 0]
///                                      omega_A(C) = 0.245
///        B merges A's view back        B.reach[C] = [0.98, 0, 0.0245]
/// t=60   A creates a message for C     A is not connected to C
///        update: omega_B(C) > omega_A(C), A forwards to B
/// t=120  B meets C                     B delivers directly
/// ```
pub fn run_worked_example() -> Result<WorkedExample, WorldError> {
    info!("=== Running Worked Example ===");

    let mut world = World::new(worked_example_settings())?;
    world.schedule_link(0.0, B, C, true);
    world.schedule_link(30.0, B, C, false);
    world.schedule_link(60.0, A, B, true);
    world.schedule_message(60.0, A, C, 1_000);
    world.schedule_link(120.0, B, C, true);

    println!("\n--- t=0: B meets C ---");
    world.run_until(0.0);
    println!("  B.reach[C] = {:?}", entry(&world, B, C, 0.0).as_slice());

    println!("\n--- t=60: A meets B ---");
    world.run_until(60.0);
    let b_to_c = entry(&world, B, C, 60.0);
    let a_to_b = entry(&world, A, B, 60.0);
    let a_to_c = entry(&world, A, C, 60.0);
    let omega_a_c = world.hera(A).map_or(0.0, |r| r.omega(&C, 60.0));
    let omega_b_c = world.hera(B).map_or(0.0, |r| r.omega(&C, 60.0));
    println!("  B.reach[C] = {:?} (aged, then merged from A)", b_to_c.as_slice());
    println!("  A.reach[B] = {:?}", a_to_b.as_slice());
    println!("  A.reach[C] = {:?}", a_to_c.as_slice());
    println!("  omega_A(C) = {:.6}", omega_a_c);
    println!("  omega_B(C) = {:.6}", omega_b_c);

    println!("\n--- t=60: A holds a message for C and forwards to B ---");
    world.run_until(61.0);
    println!("  A buffer: {} message(s)", world.fabric().buffer(A).len());
    println!("  B buffer: {} message(s)", world.fabric().buffer(B).len());

    println!("\n--- t=120: B meets C and delivers ---");
    let report = {
        world.run_until(world.settings().scenario.end_time);
        world.report()
    };

    println!("\n=== Final Statistics ===");
    println!("{}", report);
    println!("\n=== Routing Info ===");
    print!("{}", report.routing_dump());

    Ok(WorkedExample {
        b_to_c,
        a_to_b,
        a_to_c,
        omega_a_c,
        omega_b_c,
        report,
    })
}

/// Run a seeded random scenario with default router parameters
pub fn run_random(nodes: u32, duration: SimTime, seed: u64) -> Result<SimReport, WorldError> {
    info!(nodes, duration, seed, "=== Running Random Scenario ===");
    let mut world = World::from_settings(SimSettings::random(nodes, duration, seed))?;
    Ok(world.run())
}
