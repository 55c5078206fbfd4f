//! Engine configuration
//!
//! Every formula in the engine reads its parameters from an [`EngineConfig`]
//! passed in with the operation. Defaults match the production parameter set;
//! deployments override them from a JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::{truncate_amount, Amount};

/// A dated interest-rate promotion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FestivalOffer {
    pub name: String,
    /// Absolute reduction of the annual rate (0.005 = 0.5%)
    pub rate_reduction: f64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl FestivalOffer {
    pub fn is_active(&self, on: NaiveDate) -> bool {
        on >= self.starts_on && on <= self.ends_on
    }
}

/// Rate discounts applied after risk-based pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateDiscounts {
    pub women_farmer: f64,
    pub small_farmer: f64,
    pub festival_offers: Vec<FestivalOffer>,
}

impl Default for RateDiscounts {
    fn default() -> Self {
        Self {
            women_farmer: 0.005,
            small_farmer: 0.0025,
            festival_offers: Vec::new(),
        }
    }
}

/// Named parameters consumed by scoring, lending and insurance formulas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Loan sizing
    pub min_loan_amount: Amount,
    pub max_loan_amount: Amount,
    /// Loan amount per acre of land before the risk multiplier
    pub loan_per_area: Amount,
    /// Minimum composite score for approval
    pub min_eligibility_score: u32,

    // Pricing (annual rates as decimals)
    pub base_interest_rate: f64,
    pub min_interest_rate: f64,
    pub max_interest_rate: f64,
    pub discounts: RateDiscounts,

    // Disbursement conditions
    pub collateral_threshold: Amount,
    pub insurance_threshold: Amount,
    pub weather_sensitive_crops: Vec<String>,

    // Processing fee (rate of principal, capped)
    pub processing_fee_rate: f64,
    pub processing_fee_cap: Amount,

    // Tenor
    /// Loans above this amount get `extended_tenure_months` extra
    pub extended_tenure_threshold: Amount,
    pub extended_tenure_months: u32,

    // Insurance
    pub base_premium_rate: f64,
    pub small_farmer_subsidy_rate: f64,
    /// Farmers with less land than this (acres) are small farmers
    pub small_farmer_area_threshold: f64,
    pub default_insurance_per_area: Amount,
    pub coverage_ratio: f64,
    pub derivative_premium_rate: f64,

    // Accounts
    pub lending_pool: String,
    pub insurance_pool: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_loan_amount: 10_000,
            max_loan_amount: 1_000_000,
            loan_per_area: 50_000,
            min_eligibility_score: 550,
            base_interest_rate: 0.07,
            min_interest_rate: 0.04,
            max_interest_rate: 0.12,
            discounts: RateDiscounts::default(),
            collateral_threshold: 300_000,
            insurance_threshold: 200_000,
            weather_sensitive_crops: ["COTTON", "SUGARCANE", "VEGETABLES", "WHEAT"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            processing_fee_rate: 0.01,
            processing_fee_cap: 2_500,
            extended_tenure_threshold: 100_000,
            extended_tenure_months: 2,
            base_premium_rate: 0.05,
            small_farmer_subsidy_rate: 0.5,
            small_farmer_area_threshold: 5.0,
            default_insurance_per_area: 30_000,
            coverage_ratio: 0.85,
            derivative_premium_rate: 0.10,
            lending_pool: "krishi_lending_pool".to_string(),
            insurance_pool: "krishi_insurance_pool".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check bounds and rates are internally consistent
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_loan_amount > self.max_loan_amount {
            return Err(EngineError::Config(format!(
                "min_loan_amount {} exceeds max_loan_amount {}",
                self.min_loan_amount, self.max_loan_amount
            )));
        }
        if self.min_interest_rate > self.max_interest_rate {
            return Err(EngineError::Config(format!(
                "min_interest_rate {} exceeds max_interest_rate {}",
                self.min_interest_rate, self.max_interest_rate
            )));
        }

        let fractions = [
            ("base_interest_rate", self.base_interest_rate),
            ("min_interest_rate", self.min_interest_rate),
            ("max_interest_rate", self.max_interest_rate),
            ("processing_fee_rate", self.processing_fee_rate),
            ("base_premium_rate", self.base_premium_rate),
            ("small_farmer_subsidy_rate", self.small_farmer_subsidy_rate),
            ("coverage_ratio", self.coverage_ratio),
            ("derivative_premium_rate", self.derivative_premium_rate),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.lending_pool.is_empty() || self.insurance_pool.is_empty() {
            return Err(EngineError::Config("pool account names must not be empty".to_string()));
        }

        Ok(())
    }

    /// Processing fee for a principal: rate of principal, capped
    pub fn processing_fee(&self, principal: Amount) -> Amount {
        let fee = truncate_amount(principal as f64 * self.processing_fee_rate);
        fee.min(self.processing_fee_cap).min(principal)
    }

    /// Clamp an amount into the configured loan bounds
    pub fn clamp_loan_amount(&self, amount: Amount) -> Amount {
        amount.clamp(self.min_loan_amount, self.max_loan_amount)
    }

    /// Clamp an annual rate into the configured rate bounds
    pub fn clamp_rate(&self, rate: f64) -> f64 {
        rate.clamp(self.min_interest_rate, self.max_interest_rate)
    }

    pub fn is_weather_sensitive(&self, crop_type: &str) -> bool {
        self.weather_sensitive_crops
            .iter()
            .any(|c| c.eq_ignore_ascii_case(crop_type))
    }

    pub fn is_small_farmer(&self, land_area: f64) -> bool {
        land_area < self.small_farmer_area_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = EngineConfig {
            min_loan_amount: 500_000,
            max_loan_amount: 100_000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let config = EngineConfig {
            min_interest_rate: 0.2,
            max_interest_rate: 0.1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let config = EngineConfig {
            coverage_ratio: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("coverage_ratio"));
    }

    #[test]
    fn test_processing_fee_capped() {
        let config = EngineConfig::default();
        assert_eq!(config.processing_fee(100_000), 1_000);
        assert_eq!(config.processing_fee(1_000_000), 2_500);
        assert_eq!(config.processing_fee(50), 0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "base_interest_rate": 0.08, "weather_sensitive_crops": ["RICE"] }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.base_interest_rate, 0.08);
        assert_eq!(config.max_loan_amount, 1_000_000);
        assert!(config.is_weather_sensitive("rice"));
        assert!(!config.is_weather_sensitive("COTTON"));
    }

    #[test]
    fn test_festival_offer_window() {
        let offer = FestivalOffer {
            name: "Baisakhi".to_string(),
            rate_reduction: 0.005,
            starts_on: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
        };
        assert!(offer.is_active(NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()));
        assert!(offer.is_active(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()));
        assert!(!offer.is_active(NaiveDate::from_ymd_opt(2024, 4, 21).unwrap()));
    }
}
