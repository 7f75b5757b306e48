//! Run statistics and reports

use std::fmt;
use std::io::{self, Write};

use hera_core::{SimTime, SimulationIdentity};
use hera_routing::RoutingInfo;
use serde::Serialize;

/// Counters accumulated while a run is in progress
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub created: u64,
    pub started: u64,
    /// Completed transfers, deliveries included
    pub relayed: u64,
    pub aborted: u64,
    pub delivered: u64,
    pub duplicates_refused: u64,
    pub encounters: u64,
    /// Encounter endpoints that skipped the merge step
    pub incompatible_encounters: u64,
    /// Encoded size of every reachability snapshot exchanged
    pub control_bytes: u64,
    latencies: Vec<f64>,
    hop_counts: Vec<u32>,
}

impl SimStats {
    /// Record a first-time delivery
    pub fn record_delivery(&mut self, latency: SimTime, hop_count: u32) {
        self.delivered += 1;
        self.latencies.push(latency);
        self.hop_counts.push(hop_count);
    }

    /// Compute the summary figures
    pub fn summary(&self) -> MessageStats {
        let hops: Vec<f64> = self.hop_counts.iter().map(|&h| f64::from(h)).collect();
        MessageStats {
            created: self.created,
            started: self.started,
            relayed: self.relayed,
            aborted: self.aborted,
            delivered: self.delivered,
            duplicates_refused: self.duplicates_refused,
            encounters: self.encounters,
            incompatible_encounters: self.incompatible_encounters,
            control_bytes: self.control_bytes,
            delivery_prob: ratio(self.delivered as f64, self.created as f64),
            overhead_ratio: ratio(
                self.relayed as f64 - self.delivered as f64,
                self.delivered as f64,
            ),
            latency_avg: mean(&self.latencies),
            latency_med: median(&self.latencies),
            hopcount_avg: mean(&hops),
            hopcount_med: median(&hops),
        }
    }
}

/// Final message statistics of a run
///
/// Ratios and averages are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageStats {
    pub created: u64,
    pub started: u64,
    pub relayed: u64,
    pub aborted: u64,
    pub delivered: u64,
    pub duplicates_refused: u64,
    pub encounters: u64,
    pub incompatible_encounters: u64,
    pub control_bytes: u64,
    pub delivery_prob: Option<f64>,
    pub overhead_ratio: Option<f64>,
    pub latency_avg: Option<f64>,
    pub latency_med: Option<f64>,
    pub hopcount_avg: Option<f64>,
    pub hopcount_med: Option<f64>,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

fn mean(values: &[f64]) -> Option<f64> {
    ratio(values.iter().sum(), values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// One node's omega for one destination at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmegaSample {
    pub time: SimTime,
    pub node: SimulationIdentity,
    pub destination: SimulationIdentity,
    pub omega: f64,
}

/// Write samples as `time,node,destination,omega` CSV
pub fn write_omega_csv<W: Write>(samples: &[OmegaSample], mut out: W) -> io::Result<()> {
    writeln!(out, "time,node,destination,omega")?;
    for sample in samples {
        writeln!(
            out,
            "{},{},{},{:.6}",
            sample.time, sample.node, sample.destination, sample.omega
        )?;
    }
    out.flush()
}

/// Everything a finished run produces
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub scenario: String,
    pub end_time: SimTime,
    pub nodes: u32,
    pub stats: MessageStats,
    /// Final delivery predictions of every HERA node
    pub routing: Vec<RoutingInfo<SimulationIdentity>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omega_samples: Vec<OmegaSample>,
}

impl SimReport {
    /// Render the per-node routing dump
    pub fn routing_dump(&self) -> String {
        let mut out = String::new();
        for info in &self.routing {
            out.push_str(&format!("{}: {}", info.node, info));
        }
        out
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "Message stats for scenario {}", self.scenario)?;
        writeln!(f, "sim_time: {:.4}", self.end_time)?;
        writeln!(f, "nodes: {}", self.nodes)?;
        writeln!(f, "created: {}", s.created)?;
        writeln!(f, "started: {}", s.started)?;
        writeln!(f, "relayed: {}", s.relayed)?;
        writeln!(f, "aborted: {}", s.aborted)?;
        writeln!(f, "delivered: {}", s.delivered)?;
        writeln!(f, "duplicates_refused: {}", s.duplicates_refused)?;
        writeln!(f, "encounters: {}", s.encounters)?;
        writeln!(f, "incompatible_encounters: {}", s.incompatible_encounters)?;
        writeln!(f, "control_bytes: {}", s.control_bytes)?;
        writeln!(f, "delivery_prob: {}", fmt_optional(s.delivery_prob))?;
        writeln!(f, "overhead_ratio: {}", fmt_optional(s.overhead_ratio))?;
        writeln!(f, "latency_avg: {}", fmt_optional(s.latency_avg))?;
        writeln!(f, "latency_med: {}", fmt_optional(s.latency_med))?;
        writeln!(f, "hopcount_avg: {}", fmt_optional(s.hopcount_avg))?;
        write!(f, "hopcount_med: {}", fmt_optional(s.hopcount_med))
    }
}
