//! Per-tick log lines

use fca_core::{Decision, SimulationSnapshot};

/// Output flavour for the telemetry consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TelemetryFormat {
    /// `[1.0s] BRAKE! TTC: 1.52s`
    Text,
    /// One JSON snapshot per line
    Json,
}

pub fn format_line(snapshot: &SimulationSnapshot, format: TelemetryFormat) -> anyhow::Result<String> {
    match format {
        TelemetryFormat::Json => Ok(serde_json::to_string(snapshot)?),
        TelemetryFormat::Text => Ok(text_line(snapshot)),
    }
}

fn text_line(snapshot: &SimulationSnapshot) -> String {
    let r = &snapshot.result;
    let degraded = if r.degraded { " (degraded)" } else { "" };
    match r.decision {
        Decision::Collision => {
            format!("[{:.1}s] COLLISION DETECTED at {:.2}m!", snapshot.elapsed_secs, r.distance)
        }
        Decision::Brake => format!("[{:.1}s] BRAKE! TTC: {:.2}s{}", snapshot.elapsed_secs, r.ttc, degraded),
        Decision::Safe => format!("[{:.1}s] TTC: {:.2}s - Safe{}", snapshot.elapsed_secs, r.ttc, degraded),
    }
}
