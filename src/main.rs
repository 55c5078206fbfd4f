//! Krishi Underwriting CLI
//!
//! Walks one farmer through scoring, a crop loan with mandatory insurance,
//! a repayment and a weather epoch, all against in-memory collaborators.

use anyhow::Context as _;
use chrono::NaiveDate;
use krishi_underwriting::crops::DEFAULT_CROPS_PATH;
use krishi_underwriting::lending::{ApplicationOutcome, LoanRequest};
use krishi_underwriting::memory::{InMemoryWeatherFeed, RecordingEventSink};
use krishi_underwriting::model::{
    ClimateZone, CropRecord, EducationLevel, FarmerBasicInfo, FarmerProfile, FinancialHistory,
    FloodRisk, HarvestOutcome, LandOwnershipInfo, LoanStatus, MarketAccessProfile, OwnershipType,
    SocialProfile, SoilQuality, WeatherRiskProfile, WeatherSnapshot,
};
use krishi_underwriting::ports::{Account, FundLedger, RecordStore};
use krishi_underwriting::{
    process_agricultural_loan, process_repayment, run_epoch, submit_application, Context,
    CreditScorer, CropCatalog, EngineConfig, EngineState,
};

const FARMER_ID: &str = "MH-0042";
const STATION: &str = "NASHIK-03";

fn demo_farmer() -> (FarmerBasicInfo, FarmerProfile) {
    let basic = FarmerBasicInfo {
        farmer_id: FARMER_ID.to_string(),
        name: "Savitri Pawar".to_string(),
        total_land_area: 6.0,
        is_women_farmer: true,
        weather_station: STATION.to_string(),
    };

    let crop_history = [
        ("KHARIF-2021", "COTTON", HarvestOutcome::Successful, 310_000, 190_000, Some(7.5)),
        ("RABI-2022", "WHEAT", HarvestOutcome::Successful, 160_000, 95_000, Some(17.0)),
        ("KHARIF-2022", "COTTON", HarvestOutcome::Failed, 60_000, 150_000, Some(2.5)),
        ("RABI-2023", "WHEAT", HarvestOutcome::Successful, 170_000, 100_000, Some(18.5)),
        ("KHARIF-2023", "COTTON", HarvestOutcome::Successful, 330_000, 200_000, Some(8.5)),
    ]
    .into_iter()
    .map(|(season, crop, outcome, revenue, cost, yield_per_area)| CropRecord {
        season: season.to_string(),
        crop_type: crop.to_string(),
        outcome,
        revenue,
        cost,
        yield_per_area,
    })
    .collect();

    let profile = FarmerProfile {
        land: Some(LandOwnershipInfo {
            total_area: 6.0,
            ownership_type: OwnershipType::Owned,
            irrigation_available: true,
            soil_quality: SoilQuality::Good,
        }),
        crop_history,
        financial: Some(FinancialHistory {
            total_loans: 3,
            successful_repayments: 3,
            credit_limit: 150_000,
            outstanding_debt: 30_000,
            bank_account_age_years: 7,
            monthly_incomes: vec![28_000, 31_000, 26_000, 35_000, 30_000, 27_000],
        }),
        weather_risk: Some(WeatherRiskProfile {
            climate_zone: ClimateZone::SemiArid,
            drought_frequency: 3,
            flood_risk: FloodRisk::Low,
            rainfall_variability: 0.25,
            has_crop_insurance: true,
        }),
        market_access: Some(MarketAccessProfile {
            distance_to_market_km: 12.0,
            has_own_transport: false,
            has_transport_access: true,
            has_storage_facility: true,
            average_sale_price: 6_200,
            average_market_price: 6_500,
            number_of_buyers: 4,
            uses_digital_platforms: true,
        }),
        social: Some(SocialProfile {
            education: EducationLevel::HigherSecondary,
            age: 38,
            family_members_in_agriculture: 3,
            smartphone_access: true,
            internet_access: true,
            fpo_member: true,
            shg_member: true,
            received_training: true,
            has_certifications: false,
        }),
    };

    (basic, profile)
}

fn snapshot(observed_on: NaiveDate, rainfall: f64, max_temperature: f64, dry_days: u32) -> WeatherSnapshot {
    WeatherSnapshot {
        station: STATION.to_string(),
        observed_on,
        cumulative_rainfall: rainfall,
        max_temperature,
        consecutive_dry_days: dry_days,
        humidity: None,
        yield_per_area: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {}-{}-{}", y, m, d))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Krishi Underwriting v0.1.0");
    println!("==========================\n");

    let config = EngineConfig::default();
    let crops = CropCatalog::from_csv_path(DEFAULT_CROPS_PATH).unwrap_or_else(|e| {
        log::warn!("Using built-in crop catalog: {}", e);
        CropCatalog::default_catalog()
    });

    let mut state = EngineState::default();
    let lending_pool = Account::Pool(config.lending_pool.clone());
    let insurance_pool = Account::Pool(config.insurance_pool.clone());
    state.ledger.deposit(&lending_pool, 5_000_000);
    state.ledger.deposit(&insurance_pool, 2_000_000);

    let (basic, profile) = demo_farmer();
    let farmer = Account::Farmer(basic.farmer_id.clone());
    state.identity.register(&basic.farmer_id, "did:krishi:mh-0042");
    state.ledger.deposit(&farmer, 50_000);

    let credit = CreditScorer::new(&config).score_profile(&basic, &profile);
    state.profiles.insert(basic, profile);

    println!("Credit profile for {}:", FARMER_ID);
    println!("  Sub-scores: {:?}", credit.sub_scores);
    println!("  Credit score: {} ({:?})", credit.credit_score, credit.risk_category);
    println!("  Max eligibility: {}", credit.max_loan_eligibility);
    println!("  Recommended rate: {:.2}%\n", credit.recommended_rate * 100.0);

    let mut weather = InMemoryWeatherFeed::new();
    let mut events = RecordingEventSink::new();
    let sowing = date(2024, 6, 15)?;

    // Origination with auto-disbursement
    let outcome = {
        let mut ctx = Context::from_state(&mut state, &config, &crops, &weather, &mut events, sowing);
        let application = submit_application(
            &mut ctx,
            &LoanRequest {
                farmer_id: FARMER_ID.to_string(),
                requested_amount: 120_000,
                crop_type: "COTTON".to_string(),
                land_size: 6.0,
                season: None,
                purpose: "Kharif cotton inputs".to_string(),
            },
        )?;
        process_agricultural_loan(&mut ctx, &application.id)?
    };

    let loan = match outcome {
        ApplicationOutcome::Approved(loan) => loan,
        ApplicationOutcome::Rejected(rejection) => {
            println!("Application rejected: {}", rejection.reason);
            for recommendation in &rejection.recommendations {
                println!("  - {}", recommendation);
            }
            return Ok(());
        }
    };

    println!("Loan {} ({:?}):", loan.id, loan.status);
    println!("  Principal: {} at {:.2}% over {} months", loan.principal, loan.interest_rate * 100.0, loan.tenure_months);
    println!("  Total obligation: {}", loan.total_obligation());
    if let Some(disbursement) = &loan.disbursement {
        println!("  Disbursed: {} (fee {})", disbursement.disbursed_amount, disbursement.processing_fee);
    }
    for condition in &loan.approval_conditions {
        println!("  Condition: {}", condition);
    }
    println!();

    println!("{:>4} {:>12} {:>12} {:>12} {:>12}", "No", "Due", "Principal", "Interest", "Total");
    for installment in &loan.schedule {
        println!(
            "{:>4} {:>12} {:>12} {:>12} {:>12}",
            installment.number,
            installment.due_date,
            installment.principal_amount,
            installment.interest_amount,
            installment.total_amount
        );
    }
    println!();

    // First installment, once the loan is live
    let first_due = loan
        .next_due()
        .filter(|_| loan.status == LoanStatus::Active)
        .map(|i| (i.total_amount, i.due_date));
    if let Some((amount, due_date)) = first_due {
        let mut ctx = Context::from_state(&mut state, &config, &crops, &weather, &mut events, due_date);
        let repayment = process_repayment(&mut ctx, &loan.id, amount)?;
        println!(
            "Repaid {} on {}: principal {}, interest {}, outstanding {}\n",
            repayment.amount, repayment.paid_on, repayment.principal, repayment.interest, repayment.outstanding_after
        );
    }

    // A long dry spell in late July, then the monsoon recovers
    weather.insert(snapshot(date(2024, 7, 10)?, 140.0, 34.0, 12));
    weather.insert(snapshot(date(2024, 7, 28)?, 150.0, 36.5, 26));
    weather.insert(snapshot(date(2024, 8, 20)?, 410.0, 31.0, 2));

    for epoch_date in [date(2024, 7, 28)?, date(2024, 8, 20)?] {
        let mut ctx = Context::from_state(&mut state, &config, &crops, &weather, &mut events, epoch_date);
        let report = run_epoch(&mut ctx);
        println!("Epoch {}:", epoch_date);
        println!("{}\n", serde_json::to_string_pretty(&report)?);
    }

    if let Some(policy_id) = &loan.insurance_policy_id {
        if let Some(policy) = state.records.policy(policy_id) {
            println!(
                "Policy {} ({:?}): sum insured {}, claimed {}, remaining cover {}",
                policy.id,
                policy.status,
                policy.sum_insured,
                policy.total_claimed(),
                policy.remaining_cover()
            );
        }
    }

    println!("\nBalances:");
    for account in [&lending_pool, &insurance_pool, &farmer] {
        println!("  {:<20} {:>12}", account.to_string(), state.ledger.balance(account));
    }

    println!("\nEvents:");
    for event in &events.events {
        println!("  {}", event.name());
    }

    Ok(())
}
