mod config;
mod error;
mod export;
mod pose_reader;
mod replay;

use anyhow::{Context, Result};
use clap::Parser;
use fitts_core::SessionConfig;
use log::{error, info, warn};
use std::{io::Write, path::PathBuf};

#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Replays a recorded controller pose stream through the trial state machine and exports per-trial Fitts' law logs."
)]
struct Cli {
    /// recorded pose stream (timestamp,x,y,z,qx,qy,qz,qw,trigger)
    poses: PathBuf,

    /// session configuration (TOML); defaults are used when omitted
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// output directory; overrides TRIAL_LOGGER_OUTPUT_DIR
    #[clap(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// seed for the testing order shuffle; overrides the config value
    #[clap(short = 's', long)]
    seed: Option<u64>,
}

fn main() {
    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("Error: {e}");
        for cause in e.chain().skip(1) {
            error!("  caused by: {cause}");
        }
        let _ = std::io::stderr().flush();
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut session = match &cli.config {
        Some(path) => SessionConfig::load_from_file(path)
            .with_context(|| format!("loading session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if cli.seed.is_some() {
        session.seed = cli.seed;
    }
    let output = config::OutputConfig::resolve(cli.output_dir.as_deref())?;
    info!("Output directory: {}", output.output_dir.display());

    let poses = pose_reader::read_pose_csv(&cli.poses)
        .with_context(|| format!("reading pose stream {}", cli.poses.display()))?;
    info!("Loaded {} pose samples", poses.len());

    let outcome = replay::replay(session, &poses).context("replaying session")?;
    let records = &outcome.sink.records;
    if !matches!(outcome.final_state, fitts_core::ControllerState::Ended) {
        warn!(
            "Pose stream ended before the session did ({} of {} frames used)",
            outcome.frames,
            poses.len()
        );
    }
    if records.is_empty() {
        info!("No trials recorded.");
        return Ok(());
    }

    let path = export::export_trials(records, &output.output_dir)
        .context("exporting trial records")?;
    info!("Trials saved to: {}", path.display());

    let hits = records.iter().filter(|r| r.hit).count();
    let skipped = records.iter().filter(|r| r.skip_reason.is_some()).count();
    info!("Trials: {} ({} hits, {} skipped)", records.len(), hits, skipped);
    info!(
        "Mean throughput: {:.2} bits/s",
        replay::mean_throughput(records).value()
    );
    info!("Blocks closed: {}", outcome.sink.blocks_closed);
    Ok(())
}
