//! Scenario settings
//!
//! Settings live in a TOML file with one table per concern:
//!
//! ```toml
//! [Scenario]
//! name = "campus"
//! endTime = 43200.0
//! nodes = 40
//!
//! [HeraRouter]
//! secondsInTimeUnit = 60.0
//!
//! [Events]
//! messageInterval = [25.0, 35.0]
//! messageSize = [500000, 1000000]
//!
//! [Mobility]
//! encounterRate = 0.05
//! contactDuration = [60.0, 600.0]
//! ```

use std::path::{Path, PathBuf};

use hera_routing::{ConfigError, HeraConfig, HeraSettings, QueueMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid HeraRouter settings: {0}")]
    Router(#[from] ConfigError),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Complete settings for one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSettings {
    #[serde(rename = "Scenario")]
    pub scenario: ScenarioSettings,

    #[serde(rename = "HeraRouter", default)]
    pub router: HeraSettings,

    #[serde(rename = "Events", default)]
    pub events: EventSettings,

    #[serde(rename = "Mobility", default)]
    pub mobility: MobilitySettings,

    #[serde(rename = "Report", default)]
    pub report: ReportSettings,
}

/// `[Scenario]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSettings {
    /// Run name, used in reports
    pub name: String,
    /// Simulated seconds to run for
    pub end_time: f64,
    /// Seconds between forwarding cycles
    #[serde(default = "default_update_interval")]
    pub update_interval: f64,
    /// Number of nodes, identified `n0..n{nodes-1}`
    pub nodes: u32,
    /// Seed for every random choice in the run
    #[serde(default)]
    pub seed: u64,
    /// Tie-break order for equally scored candidates
    #[serde(default)]
    pub queue_mode: QueueMode,
    /// Link speed in bytes per second
    #[serde(default = "default_transmit_speed")]
    pub transmit_speed: f64,
    /// Connection trace replacing the random encounter model
    #[serde(default)]
    pub trace_file: Option<PathBuf>,
    /// Nodes running direct delivery instead of HERA
    #[serde(default)]
    pub direct_delivery_nodes: Vec<u32>,
}

fn default_update_interval() -> f64 {
    1.0
}

fn default_transmit_speed() -> f64 {
    250_000.0
}

/// `[Events]` table: message generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSettings {
    /// Seconds between created messages, uniform in `[min, max]`
    pub message_interval: [f64; 2],
    /// Message size in bytes, uniform in `[min, max]`
    pub message_size: [u64; 2],
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            message_interval: [25.0, 35.0],
            message_size: [500_000, 1_000_000],
        }
    }
}

/// `[Mobility]` table: random encounter model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobilitySettings {
    /// New contacts per second across the whole network
    pub encounter_rate: f64,
    /// Contact length in seconds, uniform in `[min, max]`
    pub contact_duration: [f64; 2],
}

impl Default for MobilitySettings {
    fn default() -> Self {
        Self {
            encounter_rate: 0.05,
            contact_duration: [60.0, 600.0],
        }
    }
}

/// `[Report]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    /// Seconds between omega samples; sampling is off when absent
    #[serde(default)]
    pub omega_sample_interval: Option<f64>,
}

impl SimSettings {
    /// Read and validate a settings file
    ///
    /// A relative `traceFile` is resolved against the settings file's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut settings = Self::from_toml_str(&text)?;
        let resolved = match (&settings.scenario.trace_file, path.parent()) {
            (Some(trace), Some(dir)) if trace.is_relative() => Some(dir.join(trace)),
            _ => None,
        };
        if resolved.is_some() {
            settings.scenario.trace_file = resolved;
        }
        Ok(settings)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings for a purely random run with default router parameters
    pub fn random(nodes: u32, end_time: f64, seed: u64) -> Self {
        Self {
            scenario: ScenarioSettings {
                name: format!("random-{}-{}", nodes, seed),
                end_time,
                update_interval: default_update_interval(),
                nodes,
                seed,
                queue_mode: QueueMode::default(),
                transmit_speed: default_transmit_speed(),
                trace_file: None,
                direct_delivery_nodes: Vec::new(),
            },
            router: HeraSettings::with_time_unit(60.0),
            events: EventSettings::default(),
            mobility: MobilitySettings::default(),
            report: ReportSettings::default(),
        }
    }

    /// Resolve the router configuration
    pub fn router_config(&self) -> Result<HeraConfig, SettingsError> {
        Ok(self.router.resolve()?)
    }

    /// Check every value a run depends on
    pub fn validate(&self) -> Result<(), SettingsError> {
        let scenario = &self.scenario;
        positive("endTime", scenario.end_time)?;
        positive("updateInterval", scenario.update_interval)?;
        positive("transmitSpeed", scenario.transmit_speed)?;
        if scenario.nodes < 2 {
            return Err(invalid("nodes", format!("need at least 2, got {}", scenario.nodes)));
        }
        if let Some(&n) = scenario
            .direct_delivery_nodes
            .iter()
            .find(|&&n| n >= scenario.nodes)
        {
            return Err(invalid("directDeliveryNodes", format!("node {} does not exist", n)));
        }

        ordered_range("messageInterval", self.events.message_interval)?;
        positive("messageInterval", self.events.message_interval[0])?;
        let [min_size, max_size] = self.events.message_size;
        if min_size == 0 || min_size > max_size {
            return Err(invalid(
                "messageSize",
                format!("expected 0 < min <= max, got [{}, {}]", min_size, max_size),
            ));
        }

        positive("encounterRate", self.mobility.encounter_rate)?;
        ordered_range("contactDuration", self.mobility.contact_duration)?;
        positive("contactDuration", self.mobility.contact_duration[0])?;

        if let Some(interval) = self.report.omega_sample_interval {
            positive("omegaSampleInterval", interval)?;
        }

        self.router_config()?;
        Ok(())
    }
}

fn invalid(key: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { key, reason }
}

fn positive(key: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(key, format!("must be positive, got {}", value)))
    }
}

fn ordered_range(key: &'static str, [min, max]: [f64; 2]) -> Result<(), SettingsError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(invalid(key, format!("expected min <= max, got [{}, {}]", min, max)))
    }
}
