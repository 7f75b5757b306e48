//! Connection trace reader
//!
//! Traces use the external-events line format:
//!
//! ```text
//! # time CONN a b up|down
//! 0 CONN 1 2 up
//! 120.5 CONN n1 n2 down
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;
use std::path::Path;

use hera_core::{SimTime, SimulationIdentity};
use thiserror::Error;

/// Errors raised while reading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// One connection state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionEvent {
    pub time: SimTime,
    pub a: SimulationIdentity,
    pub b: SimulationIdentity,
    pub up: bool,
}

impl ConnectionEvent {
    /// Highest node index mentioned by this event
    pub fn max_index(&self) -> u32 {
        self.a.index().max(self.b.index())
    }
}

/// Read a trace file
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<ConnectionEvent>, TraceError> {
    let file = std::fs::File::open(path)?;
    parse_trace(std::io::BufReader::new(file))
}

/// Parse trace lines from any reader, keeping file order
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<ConnectionEvent>, TraceError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        events.push(parse_line(trimmed).map_err(|reason| TraceError::Malformed {
            line: index + 1,
            reason,
        })?);
    }
    Ok(events)
}

fn parse_line(line: &str) -> Result<ConnectionEvent, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [time, kind, a, b, state] = fields.as_slice() else {
        return Err(format!("expected 5 fields, got {}", fields.len()));
    };

    let time: SimTime = time
        .parse()
        .map_err(|_| format!("invalid time '{}'", time))?;
    if !time.is_finite() || time < 0.0 {
        return Err(format!("time must be non-negative, got {}", time));
    }
    if *kind != "CONN" {
        return Err(format!("unsupported event '{}'", kind));
    }

    let a: SimulationIdentity = a.parse().map_err(|e| format!("{}", e))?;
    let b: SimulationIdentity = b.parse().map_err(|e| format!("{}", e))?;
    if a == b {
        return Err(format!("node {} connected to itself", a));
    }

    let up = match *state {
        "up" => true,
        "down" => false,
        other => return Err(format!("expected up or down, got '{}'", other)),
    };

    Ok(ConnectionEvent { time, a, b, up })
}
