//! Composite credit scoring

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::{
    crop_history_score, financial_score, land_score, market_score, social_score, weather_score,
};
use super::eligibility::{max_loan_eligibility, recommended_rate};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::model::{Amount, FarmerBasicInfo, FarmerProfile, RiskCategory};
use crate::ports::ProfileStore;

/// Sub-score weights in percent: land, crop, financial, weather, market, social
const WEIGHTS: [u32; 6] = [25, 20, 25, 10, 10, 10];

/// Maximum composite score
pub const MAX_CREDIT_SCORE: u32 = 850;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub land: u32,
    pub crop_history: u32,
    pub financial: u32,
    pub weather: u32,
    pub market: u32,
    pub social: u32,
}

impl SubScores {
    pub fn from_profile(profile: &FarmerProfile) -> Self {
        Self {
            land: land_score(profile.land.as_ref()),
            crop_history: crop_history_score(&profile.crop_history),
            financial: financial_score(profile.financial.as_ref()),
            weather: weather_score(profile.weather_risk.as_ref()),
            market: market_score(profile.market_access.as_ref()),
            social: social_score(profile.social.as_ref()),
        }
    }

    /// Weighted sum, truncated
    pub fn composite(&self) -> u32 {
        let scores = [
            self.land,
            self.crop_history,
            self.financial,
            self.weather,
            self.market,
            self.social,
        ];
        let weighted: u32 = scores.iter().zip(WEIGHTS.iter()).map(|(s, w)| s * w).sum();
        (weighted / 100).min(MAX_CREDIT_SCORE)
    }
}

/// Creditworthiness derived from a farmer's profile; recomputed on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmerCreditProfile {
    pub farmer_id: String,
    pub sub_scores: SubScores,
    pub credit_score: u32,
    pub risk_category: RiskCategory,
    pub max_loan_eligibility: Amount,
    /// Annual rate before discounts
    pub recommended_rate: f64,
}

/// Scores farmers against one configuration
pub struct CreditScorer<'a> {
    config: &'a EngineConfig,
}

impl<'a> CreditScorer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Score a farmer from already-fetched inputs
    pub fn score_profile(&self, basic: &FarmerBasicInfo, profile: &FarmerProfile) -> FarmerCreditProfile {
        let sub_scores = SubScores::from_profile(profile);
        let credit_score = sub_scores.composite();
        let risk_category = RiskCategory::from_score(credit_score);

        debug!(
            "Scored {}: land={} crop={} financial={} weather={} market={} social={} -> {} ({})",
            basic.farmer_id,
            sub_scores.land,
            sub_scores.crop_history,
            sub_scores.financial,
            sub_scores.weather,
            sub_scores.market,
            sub_scores.social,
            credit_score,
            risk_category.as_str()
        );

        // land records take precedence over the self-declared area
        let land_area = profile
            .land
            .as_ref()
            .map(|l| l.total_area)
            .unwrap_or(basic.total_land_area);

        FarmerCreditProfile {
            farmer_id: basic.farmer_id.clone(),
            sub_scores,
            credit_score,
            risk_category,
            max_loan_eligibility: max_loan_eligibility(self.config, land_area, risk_category),
            recommended_rate: recommended_rate(self.config, risk_category),
        }
    }

    /// Score a farmer by id; unknown farmers are an error, missing
    /// sub-profiles are not
    pub fn score_farmer(&self, profiles: &dyn ProfileStore, farmer_id: &str) -> EngineResult<FarmerCreditProfile> {
        let basic = profiles
            .basic_info(farmer_id)
            .ok_or_else(|| EngineError::not_found("farmer", farmer_id))?;
        let profile = profiles.profile(farmer_id);
        Ok(self.score_profile(&basic, &profile))
    }

    /// Score many farmers in parallel, preserving input order
    pub fn score_portfolio(
        &self,
        profiles: &dyn ProfileStore,
        farmer_ids: &[String],
    ) -> Vec<(String, EngineResult<FarmerCreditProfile>)> {
        farmer_ids
            .par_iter()
            .map(|id| (id.clone(), self.score_farmer(profiles, id)))
            .collect()
    }
}
