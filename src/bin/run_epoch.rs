//! Run one insurance epoch over a persisted engine state
//!
//! Evaluates every active policy against the weather feed, settles matured
//! derivatives and prints the epoch report as JSON.

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::Parser;
use krishi_underwriting::crops::DEFAULT_CROPS_PATH;
use krishi_underwriting::memory::{InMemoryWeatherFeed, RecordingEventSink};
use krishi_underwriting::{run_epoch, Context, CropCatalog, EngineConfig, EngineState};

#[derive(Parser, Debug)]
#[command(about = "Evaluate parametric triggers and settle derivatives")]
struct Args {
    /// Engine state JSON with policies, derivatives and balances
    #[arg(long)]
    state: PathBuf,

    /// Weather snapshots CSV
    #[arg(long)]
    weather: PathBuf,

    /// Engine configuration JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_CROPS_PATH)]
    crops: PathBuf,

    /// Processing date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Write the updated state back to --state
    #[arg(long)]
    save: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let crops = CropCatalog::from_csv_path(&args.crops)
        .with_context(|| format!("loading crops {}", args.crops.display()))?;
    let weather = InMemoryWeatherFeed::from_csv_path(&args.weather)
        .with_context(|| format!("loading weather {}", args.weather.display()))?;
    let mut state = EngineState::from_json_path(&args.state)
        .with_context(|| format!("loading state {}", args.state.display()))?;

    let today = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut events = RecordingEventSink::new();

    let report = {
        let mut ctx = Context::from_state(&mut state, &config, &crops, &weather, &mut events, today);
        run_epoch(&mut ctx)
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    log::info!("{} events emitted", events.events.len());

    if args.save {
        state
            .save_json_path(&args.state)
            .with_context(|| format!("saving state {}", args.state.display()))?;
        log::info!("State written to {}", args.state.display());
    }

    Ok(())
}
