//! Shared fixtures for unit tests

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::crops::CropCatalog;
use crate::memory::{EngineState, InMemoryWeatherFeed, RecordingEventSink};
use crate::model::{
    Amount, ClimateZone, CropRecord, EducationLevel, FarmerBasicInfo, FarmerProfile,
    FinancialHistory, FloodRisk, HarvestOutcome, LandOwnershipInfo, MarketAccessProfile,
    OwnershipType, RiskCategory, SocialProfile, SoilQuality, WeatherRiskProfile, WeatherSnapshot,
};
use crate::ports::{Account, FundLedger};
use crate::scoring::{recommended_rate, FarmerCreditProfile, SubScores};

pub const STATION: &str = "PUNE-01";
pub const POOL_FUNDING: Amount = 10_000_000;
pub const FARMER_FUNDING: Amount = 100_000;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn basic_info(farmer_id: &str, total_land_area: f64) -> FarmerBasicInfo {
    FarmerBasicInfo {
        farmer_id: farmer_id.to_string(),
        name: format!("Farmer {}", farmer_id),
        total_land_area,
        is_women_farmer: false,
        weather_station: STATION.to_string(),
    }
}

pub fn strong_land(total_area: f64) -> LandOwnershipInfo {
    LandOwnershipInfo {
        total_area,
        ownership_type: OwnershipType::Owned,
        irrigation_available: true,
        soil_quality: SoilQuality::Excellent,
    }
}

/// `seasons` profitable harvests rotating rice, wheat and cotton
pub fn successful_history(seasons: usize) -> Vec<CropRecord> {
    let rotation = [("RICE", 20.0), ("WHEAT", 18.0), ("COTTON", 8.0)];
    (0..seasons)
        .map(|i| {
            let (crop, yield_per_area) = rotation[i % rotation.len()];
            CropRecord {
                season: format!("SEASON-{}", i + 1),
                crop_type: crop.to_string(),
                outcome: HarvestOutcome::Successful,
                revenue: 120_000,
                cost: 80_000,
                yield_per_area: Some(yield_per_area),
            }
        })
        .collect()
}

pub fn strong_financial() -> FinancialHistory {
    FinancialHistory {
        total_loans: 5,
        successful_repayments: 5,
        credit_limit: 100_000,
        outstanding_debt: 20_000,
        bank_account_age_years: 6,
        monthly_incomes: vec![25_000; 12],
    }
}

pub fn strong_weather() -> WeatherRiskProfile {
    WeatherRiskProfile {
        climate_zone: ClimateZone::Tropical,
        drought_frequency: 1,
        flood_risk: FloodRisk::Low,
        rainfall_variability: 0.15,
        has_crop_insurance: true,
    }
}

pub fn strong_market() -> MarketAccessProfile {
    MarketAccessProfile {
        distance_to_market_km: 5.0,
        has_own_transport: true,
        has_transport_access: true,
        has_storage_facility: true,
        average_sale_price: 950,
        average_market_price: 1_000,
        number_of_buyers: 6,
        uses_digital_platforms: true,
    }
}

pub fn strong_social() -> SocialProfile {
    SocialProfile {
        education: EducationLevel::Graduate,
        age: 40,
        family_members_in_agriculture: 3,
        smartphone_access: true,
        internet_access: true,
        fpo_member: true,
        shg_member: true,
        received_training: true,
        has_certifications: true,
    }
}

/// Profile scoring 832 (low risk)
pub fn strong_profile(total_area: f64) -> FarmerProfile {
    FarmerProfile {
        land: Some(strong_land(total_area)),
        crop_history: successful_history(10),
        financial: Some(strong_financial()),
        weather_risk: Some(strong_weather()),
        market_access: Some(strong_market()),
        social: Some(strong_social()),
    }
}

/// Strong land and social standing only; scores 560 (high risk) on 10 acres
pub fn high_risk_profile() -> FarmerProfile {
    FarmerProfile {
        land: Some(strong_land(10.0)),
        social: Some(strong_social()),
        ..Default::default()
    }
}

pub fn credit_profile(farmer_id: &str, credit_score: u32, max_loan_eligibility: Amount) -> FarmerCreditProfile {
    let risk_category = RiskCategory::from_score(credit_score);
    FarmerCreditProfile {
        farmer_id: farmer_id.to_string(),
        sub_scores: SubScores {
            land: credit_score,
            crop_history: credit_score,
            financial: credit_score,
            weather: credit_score,
            market: credit_score,
            social: credit_score,
        },
        credit_score,
        risk_category,
        max_loan_eligibility,
        recommended_rate: recommended_rate(&EngineConfig::default(), risk_category),
    }
}

pub fn snapshot(observed_on: NaiveDate, rainfall: f64, max_temperature: f64, dry_days: u32) -> WeatherSnapshot {
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

pub fn farmer(farmer_id: &str) -> Account {
    Account::Farmer(farmer_id.to_string())
}

/// In-memory engine with funded pools
pub struct Harness {
    pub config: EngineConfig,
    pub crops: CropCatalog,
    pub state: EngineState,
    pub weather: InMemoryWeatherFeed,
    pub events: RecordingEventSink,
    pub today: NaiveDate,
}

impl Harness {
    pub fn new(today: NaiveDate) -> Self {
        let config = EngineConfig::default();
        let mut state = EngineState::default();
        state
            .ledger
            .deposit(&Account::Pool(config.lending_pool.clone()), POOL_FUNDING);
        state
            .ledger
            .deposit(&Account::Pool(config.insurance_pool.clone()), POOL_FUNDING);

        Self {
            config,
            crops: CropCatalog::default_catalog(),
            state,
            weather: InMemoryWeatherFeed::new(),
            events: RecordingEventSink::new(),
            today,
        }
    }

    pub fn ctx(&mut self) -> Context<'_> {
        Context::from_state(
            &mut self.state,
            &self.config,
            &self.crops,
            &self.weather,
            &mut self.events,
            self.today,
        )
    }

    /// Register a farmer with an identity and a funded account
    pub fn add_farmer(&mut self, farmer_id: &str, total_land_area: f64, profile: FarmerProfile) {
        self.state
            .profiles
            .insert(basic_info(farmer_id, total_land_area), profile);
        self.state
            .identity
            .register(farmer_id, &format!("did:krishi:{}", farmer_id));
        self.state.ledger.deposit(&farmer(farmer_id), FARMER_FUNDING);
    }

    pub fn balance(&self, account: &Account) -> Amount {
        self.state.ledger.balance(account)
    }

    pub fn lending_pool(&self) -> Account {
        Account::Pool(self.config.lending_pool.clone())
    }

    pub fn insurance_pool(&self) -> Account {
        Account::Pool(self.config.insurance_pool.clone())
    }
}
