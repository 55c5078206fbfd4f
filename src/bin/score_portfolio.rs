//! Score every farmer in a persisted engine state and write a CSV report
//!
//! Crop history from a separate CSV, when given, replaces the stored
//! history for the farmers it mentions.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use krishi_underwriting::model::load_crop_history;
use krishi_underwriting::ports::ProfileStore;
use krishi_underwriting::{CreditScorer, EngineConfig, EngineState};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Score a farmer portfolio in parallel")]
struct Args {
    /// Engine state JSON holding farmer profiles
    #[arg(long)]
    state: PathBuf,

    /// Crop history CSV (FarmerID,Season,CropType,Outcome,Revenue,Cost,YieldPerAcre)
    #[arg(long)]
    crop_history: Option<PathBuf>,

    /// Engine configuration JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "credit_scores.csv")]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct ScoreRow {
    farmer_id: String,
    land: u32,
    crop_history: u32,
    financial: u32,
    weather: u32,
    market: u32,
    social: u32,
    credit_score: u32,
    risk_category: String,
    max_loan_eligibility: u64,
    recommended_rate: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let start = Instant::now();
    let mut state = EngineState::from_json_path(&args.state)
        .with_context(|| format!("loading state {}", args.state.display()))?;

    if let Some(path) = &args.crop_history {
        let history = load_crop_history(path)
            .with_context(|| format!("loading crop history {}", path.display()))?;
        for (farmer_id, records) in history {
            if state.profiles.basic_info(&farmer_id).is_none() {
                log::warn!("Crop history for unknown farmer {} ignored", farmer_id);
                continue;
            }
            let mut profile = state.profiles.profile(&farmer_id);
            profile.crop_history = records;
            state.profiles.set_profile(&farmer_id, profile);
        }
    }

    let farmer_ids = state.profiles.farmer_ids();
    println!("Loaded {} farmers in {:?}", farmer_ids.len(), start.elapsed());

    let score_start = Instant::now();
    let scorer = CreditScorer::new(&config);
    let results = scorer.score_portfolio(&state.profiles, &farmer_ids);
    println!("Scored in {:?}", score_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut failed = 0usize;
    for (farmer_id, result) in results {
        match result {
            Ok(credit) => writer.serialize(ScoreRow {
                farmer_id,
                land: credit.sub_scores.land,
                crop_history: credit.sub_scores.crop_history,
                financial: credit.sub_scores.financial,
                weather: credit.sub_scores.weather,
                market: credit.sub_scores.market,
                social: credit.sub_scores.social,
                credit_score: credit.credit_score,
                risk_category: format!("{:?}", credit.risk_category),
                max_loan_eligibility: credit.max_loan_eligibility,
                recommended_rate: credit.recommended_rate,
            })?,
            Err(e) => {
                log::warn!("Could not score {}: {}", farmer_id, e);
                failed += 1;
            }
        }
    }
    writer.flush()?;

    println!("Wrote {} ({} failed)", args.output.display(), failed);
    Ok(())
}
