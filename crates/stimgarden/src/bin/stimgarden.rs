//! Stimgarden demo binary
//!
//! Runs one therapy session to completion and prints the summary as
//! JSON. This is the reference embedding of the engine; the dashboard
//! frontend drives the same `SessionRuntime` surface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bioconf::PatchConfig;
use bioproto::SessionConfig;
use stimgarden::{ChannelRecorder, SessionController, SessionRuntime};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Modality {
    Tens,
    Microcurrent,
}

#[derive(Parser, Debug)]
#[command(name = "stimgarden", about = "BioPatch therapy session engine")]
struct Args {
    /// Stimulation modality
    #[arg(long, value_enum, default_value_t = Modality::Tens)]
    session_type: Modality,

    /// Target duration in seconds (defaults to the modality preset)
    #[arg(long)]
    duration: Option<u32>,

    /// Stimulation frequency in Hz
    #[arg(long)]
    frequency: Option<f64>,

    /// Intensity (% for TENS, µA for microcurrent)
    #[arg(long)]
    intensity: Option<f64>,

    /// Seed for the signal and nuisance-alert RNGs (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Config file overriding ./biopatch.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut config = match self.session_type {
            Modality::Tens => SessionConfig::tens(),
            Modality::Microcurrent => SessionConfig::microcurrent(),
        };
        if let Some(secs) = self.duration {
            config.target_duration_secs = secs;
        }
        if let Some(hz) = self.frequency {
            config.frequency_hz = hz;
        }
        if let Some(intensity) = self.intensity {
            config.intensity = intensity;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let patch = PatchConfig::load_from(args.config.as_deref())
        .context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(patch.telemetry.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("stimgarden {} starting", env!("CARGO_PKG_VERSION"));

    let session_config = args.session_config();
    let controller = match args.seed {
        Some(seed) => SessionController::from_seed(session_config, &patch, seed)?,
        None => SessionController::new(session_config, &patch)?,
    };

    let (recorder, mut summaries) = ChannelRecorder::new();
    let runtime = SessionRuntime::new(controller, &patch, Arc::new(recorder));

    runtime.start()?;
    info!("session running, ticking every {}ms", patch.engine.tick_period_ms);

    let summary = summaries
        .recv()
        .await
        .context("Session ended without a summary")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("stimgarden shutdown complete");
    Ok(())
}
