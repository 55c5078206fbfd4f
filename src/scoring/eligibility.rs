//! Loan sizing, pricing and the eligibility decision

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::FarmerCreditProfile;
use crate::config::EngineConfig;
use crate::model::{truncate_amount, Amount, FarmerBasicInfo, FarmerProfile, RiskCategory};

/// Markets further than this (km) earn a market-access recommendation
const REMOTE_MARKET_KM: f64 = 25.0;
/// Scores below this earn the credit-building recommendations
const CREDIT_BUILDING_SCORE: u32 = 650;
/// Seasons of history below which a track-record recommendation is made
const MIN_TRACK_RECORD: usize = 3;

impl RiskCategory {
    /// Multiplier on the land-based loan amount
    pub fn loan_multiplier(&self) -> f64 {
        match self {
            RiskCategory::LowRisk => 1.5,
            RiskCategory::MediumRisk => 1.2,
            RiskCategory::HighRisk => 0.8,
            RiskCategory::VeryHighRisk => 0.5,
        }
    }

    /// Adjustment added to the base annual rate
    pub fn rate_adjustment(&self) -> f64 {
        match self {
            RiskCategory::LowRisk => -0.01,
            RiskCategory::MediumRisk => -0.0025,
            RiskCategory::HighRisk => 0.005,
            RiskCategory::VeryHighRisk => 0.015,
        }
    }
}

/// Largest loan a farmer may take: land × per-acre amount × risk multiplier,
/// clamped to the configured loan bounds
pub fn max_loan_eligibility(config: &EngineConfig, land_area: f64, risk: RiskCategory) -> Amount {
    let amount = truncate_amount(land_area * config.loan_per_area as f64 * risk.loan_multiplier());
    config.clamp_loan_amount(amount)
}

/// Base rate plus risk adjustment, clamped to the configured rate bounds
pub fn recommended_rate(config: &EngineConfig, risk: RiskCategory) -> f64 {
    config.clamp_rate(config.base_interest_rate + risk.rate_adjustment())
}

/// Apply festival, women-farmer and small-farmer discounts to a rate
///
/// The result never drops below the configured minimum rate.
pub fn discounted_rate(config: &EngineConfig, rate: f64, farmer: &FarmerBasicInfo, on: NaiveDate) -> f64 {
    let discounts = &config.discounts;
    let mut discounted = rate;

    for offer in discounts.festival_offers.iter().filter(|o| o.is_active(on)) {
        discounted -= offer.rate_reduction;
    }
    if farmer.is_women_farmer {
        discounted -= discounts.women_farmer;
    }
    if config.is_small_farmer(farmer.total_land_area) {
        discounted -= discounts.small_farmer;
    }

    discounted.max(config.min_interest_rate)
}

/// Outcome of checking a requested amount against a credit profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityAssessment {
    pub farmer_id: String,
    pub requested_amount: Amount,
    pub crop_type: String,
    pub credit_score: u32,
    pub risk_category: RiskCategory,
    pub max_eligible_amount: Amount,
    pub recommended_rate: f64,
    pub is_eligible: bool,
    pub reason: String,
    pub recommendations: Vec<String>,
    pub assessed_on: NaiveDate,
}

pub fn assess_eligibility(
    config: &EngineConfig,
    credit: &FarmerCreditProfile,
    profile: &FarmerProfile,
    requested_amount: Amount,
    crop_type: &str,
    on: NaiveDate,
) -> EligibilityAssessment {
    let score_ok = credit.credit_score >= config.min_eligibility_score;
    let amount_ok = requested_amount <= credit.max_loan_eligibility;

    let reason = if score_ok && amount_ok {
        "Meets all eligibility criteria".to_string()
    } else if !score_ok {
        format!(
            "Credit score below minimum threshold ({})",
            config.min_eligibility_score
        )
    } else {
        format!(
            "Requested amount exceeds maximum eligibility of {}",
            credit.max_loan_eligibility
        )
    };

    EligibilityAssessment {
        farmer_id: credit.farmer_id.clone(),
        requested_amount,
        crop_type: crop_type.to_string(),
        credit_score: credit.credit_score,
        risk_category: credit.risk_category,
        max_eligible_amount: credit.max_loan_eligibility,
        recommended_rate: credit.recommended_rate,
        is_eligible: score_ok && amount_ok,
        reason,
        recommendations: recommendations(credit, profile, requested_amount),
        assessed_on: on,
    }
}

/// Concrete steps that would improve the farmer's standing
pub fn recommendations(
    credit: &FarmerCreditProfile,
    profile: &FarmerProfile,
    requested_amount: Amount,
) -> Vec<String> {
    let mut recs = Vec::new();

    if credit.credit_score < CREDIT_BUILDING_SCORE {
        recs.push("Consider building credit history with smaller loans".to_string());
        recs.push("Maintain consistent farming records and income documentation".to_string());
    }

    let irrigated = profile
        .land
        .as_ref()
        .map(|l| l.irrigation_available)
        .unwrap_or(false);
    if !irrigated {
        recs.push(
            "Consider irrigation investment to improve land value and reduce weather risk"
                .to_string(),
        );
    }

    if profile.crop_history.len() < MIN_TRACK_RECORD {
        recs.push("Build farming track record with consistent crop production".to_string());
    }

    let insured = profile
        .weather_risk
        .as_ref()
        .map(|w| w.has_crop_insurance)
        .unwrap_or(false);
    if !insured {
        recs.push("Obtain crop insurance to reduce weather-related risks".to_string());
    }

    if let Some(market) = &profile.market_access {
        if market.distance_to_market_km > REMOTE_MARKET_KM {
            recs.push(
                "Explore transportation and storage solutions to improve market access"
                    .to_string(),
            );
        }
    }

    if requested_amount > credit.max_loan_eligibility {
        recs.push(format!(
            "Consider applying for {} initially and building eligibility for larger amounts",
            credit.max_loan_eligibility
        ));
    }

    recs
}
