//! Forward Collision Avoidance Simulator CLI
//!
//! Runs the tick loop on its own thread and consumes the published
//! snapshots from the main thread: a text dashboard and a per-tick log.

mod hud;
mod telemetry;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fca_core::{SimState, Simulation, SimulationConfig, SnapshotReader, StopHandle, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hud::HudToggles;
use telemetry::TelemetryFormat;

#[derive(Parser)]
#[command(name = "fca_sim")]
#[command(about = "Forward collision avoidance simulation (Kalman-filtered TTC braking)", long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in preset: realistic, high_noise, deterministic
    #[arg(long, default_value = "realistic", conflicts_with = "config")]
    preset: String,

    /// Override run length in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Override ticks per second
    #[arg(long)]
    rate: Option<f64>,

    /// Override RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Keep updating the filters on collision ticks
    #[arg(long, default_value = "false")]
    update_filters_on_collision: bool,

    /// Run on a virtual clock without waiting between ticks
    #[arg(long, default_value = "false")]
    fast: bool,

    /// Per-tick log format
    #[arg(long, value_enum, default_value = "text")]
    format: TelemetryFormat,

    /// Show the text dashboard
    #[arg(long, default_value = "false")]
    hud: bool,

    /// Dashboard items to hide (comma-separated: speed,ttc,distance)
    #[arg(long)]
    hide: Option<String>,

    /// Read dashboard toggle keys (s, t, d) and q to quit from stdin
    #[arg(long, default_value = "false")]
    interactive: bool,

    /// Print the resolved configuration as YAML and exit
    #[arg(long, default_value = "false")]
    print_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let mut toggles = HudToggles::default();
    if let Some(hide) = &cli.hide {
        toggles.hide(hide)?;
    }

    let consumer = Consumer { toggles: Arc::new(Mutex::new(toggles)), hud: cli.hud, format: cli.format };
    let mut sim = Simulation::new(config).context("failed to build simulation")?;

    if cli.fast {
        run_fast(&mut sim, &consumer)
    } else {
        run_realtime(sim, &consumer, cli.interactive)
    }
}

fn resolve_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationConfig::preset(&cli.preset)
            .with_context(|| format!("unknown preset: {}", cli.preset))?,
    };

    if let Some(duration) = cli.duration {
        config.duration_secs = duration;
    }
    if let Some(rate) = cli.rate {
        config.refresh_rate_hz = rate;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.update_filters_on_collision {
        config.update_filters_on_collision = true;
    }

    config.validate()?;
    Ok(config)
}

/// Display and logging side; only ever reads snapshots.
struct Consumer {
    toggles: Arc<Mutex<HudToggles>>,
    hud: bool,
    format: TelemetryFormat,
}

impl Consumer {
    fn observe(&self, reader: &SnapshotReader, last_tick: &mut u64) -> Result<()> {
        let Some(snapshot) = reader.latest() else {
            return Ok(());
        };
        if snapshot.tick == *last_tick {
            return Ok(());
        }
        *last_tick = snapshot.tick;

        let line = telemetry::format_line(&snapshot, self.format)?;
        match self.format {
            TelemetryFormat::Json => println!("{}", line),
            TelemetryFormat::Text => info!("{}", line),
        }

        if self.hud {
            let toggles = *self.toggles.lock().unwrap_or_else(|e| e.into_inner());
            eprintln!("{}", hud::render(&snapshot, &toggles));
        }
        Ok(())
    }
}

fn run_fast(sim: &mut Simulation, consumer: &Consumer) -> Result<()> {
    let reader = sim.reader();
    let mut last_tick = 0;
    for _ in 0..sim.config().expected_ticks() {
        sim.step();
        consumer.observe(&reader, &mut last_tick)?;
    }
    sim.stop();
    print_summary(sim.summary());
    Ok(())
}

fn run_realtime(mut sim: Simulation, consumer: &Consumer, interactive: bool) -> Result<()> {
    let reader = sim.reader();
    let stop = StopHandle::new();
    let poll = sim.config().tick_period().min(Duration::from_millis(50)) / 2;

    let loop_stop = stop.clone();
    let worker = thread::Builder::new()
        .name("fca-tick-loop".to_string())
        .spawn(move || sim.run(&mut SystemClock::new(), &loop_stop))
        .context("failed to spawn tick loop")?;

    if interactive {
        spawn_key_reader(Arc::clone(&consumer.toggles), stop.clone())?;
    }

    let mut last_tick = 0;
    loop {
        consumer.observe(&reader, &mut last_tick)?;
        if reader.latest().map(|s| s.state == SimState::Stopped).unwrap_or(false) {
            break;
        }
        stop.wait_timeout(poll);
    }
    // Catch a final tick published just before the stop
    consumer.observe(&reader, &mut last_tick)?;

    let summary = worker.join().map_err(|_| anyhow::anyhow!("tick loop panicked"))?;
    print_summary(&summary);
    Ok(())
}

fn spawn_key_reader(toggles: Arc<Mutex<HudToggles>>, stop: StopHandle) -> Result<()> {
    thread::Builder::new()
        .name("fca-keys".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for key in line.chars() {
                    if key == 'q' {
                        stop.stop();
                        return;
                    }
                    let mut t = toggles.lock().unwrap_or_else(|e| e.into_inner());
                    if !t.apply_key(key) && !key.is_whitespace() {
                        warn!("unbound key: {:?}", key);
                    }
                }
            }
        })
        .context("failed to spawn key reader")?;
    Ok(())
}

fn print_summary(summary: &fca_core::RunSummary) {
    let min_ttc = summary.min_ttc.map(|t| format!("{:.2}s", t)).unwrap_or_else(|| "n/a".to_string());
    info!(
        "{} ticks: {} safe, {} brake, {} collision, {} degraded, {} respawns, min TTC {}",
        summary.ticks,
        summary.safe_ticks,
        summary.brake_ticks,
        summary.collision_ticks,
        summary.degraded_ticks,
        summary.respawns,
        min_ttc
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fca_sim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_overrides_apply_to_preset() {
        let cli = parse(&["--preset", "high_noise", "--duration", "5", "--rate", "2", "--seed", "9"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.duration_secs, 5.0);
        assert_eq!(config.refresh_rate_hz, 2.0);
        assert_eq!(config.seed, 9);
        assert_eq!(config.sensors.lidar_noise_std, 5.0);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let cli = parse(&["--preset", "arcade"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = parse(&["--rate", "0"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn test_collision_policy_flag() {
        let cli = parse(&["--update-filters-on-collision"]);
        assert!(resolve_config(&cli).unwrap().update_filters_on_collision);
    }

    #[test]
    fn test_fast_run_covers_every_tick() {
        let cli = parse(&["--preset", "deterministic", "--duration", "6", "--fast"]);
        let mut sim = Simulation::new(resolve_config(&cli).unwrap()).unwrap();
        let consumer = Consumer {
            toggles: Arc::new(Mutex::new(HudToggles::default())),
            hud: true,
            format: TelemetryFormat::Text,
        };
        run_fast(&mut sim, &consumer).unwrap();
        assert_eq!(sim.summary().ticks, 6);
        assert_eq!(sim.state(), SimState::Stopped);
    }
}
