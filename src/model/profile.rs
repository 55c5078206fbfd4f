//! Farmer sub-profiles consumed by credit scoring
//!
//! Each sub-profile is owned by an external source (land records, bank
//! statements, weather service, ...) and is read-only to the engine.

use serde::{Deserialize, Serialize};

use super::Amount;

/// Identity-level facts about a farmer; required before any scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmerBasicInfo {
    pub farmer_id: String,
    pub name: String,
    /// Total cultivable land in acres
    pub total_land_area: f64,
    #[serde(default)]
    pub is_women_farmer: bool,
    /// Reference weather station for the farm's location
    pub weather_station: String,
}

/// Land ownership type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipType {
    Owned,
    LeasedLongTerm,
    Other,
}

/// Soil quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoilQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandOwnershipInfo {
    /// Acres
    pub total_area: f64,
    pub ownership_type: OwnershipType,
    pub irrigation_available: bool,
    pub soil_quality: SoilQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarvestOutcome {
    Successful,
    Failed,
}

/// One season of farming history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRecord {
    pub season: String,
    pub crop_type: String,
    pub outcome: HarvestOutcome,
    pub revenue: Amount,
    pub cost: Amount,
    /// Harvested yield per acre, when recorded
    #[serde(default)]
    pub yield_per_area: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialHistory {
    pub total_loans: u32,
    pub successful_repayments: u32,
    pub credit_limit: Amount,
    pub outstanding_debt: Amount,
    /// Years since the oldest bank account was opened
    pub bank_account_age_years: u32,
    pub monthly_incomes: Vec<Amount>,
}

impl FinancialHistory {
    /// Successful repayments over total loans, if any loans were taken
    pub fn repayment_rate(&self) -> Option<f64> {
        if self.total_loans == 0 {
            None
        } else {
            Some(self.successful_repayments as f64 / self.total_loans as f64)
        }
    }

    /// Outstanding debt over credit limit, if both are non-zero
    pub fn credit_utilization(&self) -> Option<f64> {
        if self.credit_limit == 0 || self.outstanding_debt == 0 {
            None
        } else {
            Some(self.outstanding_debt as f64 / self.credit_limit as f64)
        }
    }

    /// Coefficient of variation (std dev / mean) of monthly income
    ///
    /// Returns 1.0 (fully variable) for an empty or zero-mean series.
    pub fn income_variability(&self) -> f64 {
        if self.monthly_incomes.is_empty() {
            return 1.0;
        }
        let n = self.monthly_incomes.len() as f64;
        let mean = self.monthly_incomes.iter().map(|&v| v as f64).sum::<f64>() / n;
        if mean <= 0.0 {
            return 1.0;
        }
        let variance = self
            .monthly_incomes
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        variance.sqrt() / mean
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClimateZone {
    Arid,
    SemiArid,
    Tropical,
    Subtropical,
    Temperate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodRisk {
    High,
    Medium,
    Low,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherRiskProfile {
    pub climate_zone: ClimateZone,
    /// Drought years out of the last 10
    pub drought_frequency: u32,
    pub flood_risk: FloodRisk,
    /// Rainfall coefficient of variation
    pub rainfall_variability: f64,
    pub has_crop_insurance: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAccessProfile {
    pub distance_to_market_km: f64,
    pub has_own_transport: bool,
    pub has_transport_access: bool,
    pub has_storage_facility: bool,
    /// Average price the farmer realizes per unit
    pub average_sale_price: Amount,
    /// Average market price per unit
    pub average_market_price: Amount,
    pub number_of_buyers: u32,
    pub uses_digital_platforms: bool,
}

impl MarketAccessProfile {
    /// Realized price over market price, if both are known
    pub fn price_realization(&self) -> Option<f64> {
        if self.average_sale_price == 0 || self.average_market_price == 0 {
            None
        } else {
            Some(self.average_sale_price as f64 / self.average_market_price as f64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EducationLevel {
    None,
    Primary,
    Secondary,
    HigherSecondary,
    Graduate,
    PostGraduate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialProfile {
    pub education: EducationLevel,
    pub age: u32,
    pub family_members_in_agriculture: u32,
    pub smartphone_access: bool,
    pub internet_access: bool,
    pub fpo_member: bool,
    pub shg_member: bool,
    pub received_training: bool,
    pub has_certifications: bool,
}

/// The six scoring inputs for one farmer
///
/// Every sub-profile may be absent; scoring substitutes a fallback
/// sub-score rather than failing. An empty crop history counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmerProfile {
    #[serde(default)]
    pub land: Option<LandOwnershipInfo>,
    #[serde(default)]
    pub crop_history: Vec<CropRecord>,
    #[serde(default)]
    pub financial: Option<FinancialHistory>,
    #[serde(default)]
    pub weather_risk: Option<WeatherRiskProfile>,
    #[serde(default)]
    pub market_access: Option<MarketAccessProfile>,
    #[serde(default)]
    pub social: Option<SocialProfile>,
}

impl FarmerProfile {
    /// Land area in acres, zero when land records are absent
    pub fn land_area(&self) -> f64 {
        self.land.as_ref().map(|l| l.total_area).unwrap_or(0.0)
    }

    /// Average recorded yield per acre for one crop, if any seasons recorded it
    pub fn average_yield(&self, crop_type: &str) -> Option<f64> {
        let yields: Vec<f64> = self
            .crop_history
            .iter()
            .filter(|r| r.crop_type.eq_ignore_ascii_case(crop_type))
            .filter_map(|r| r.yield_per_area)
            .collect();
        if yields.is_empty() {
            None
        } else {
            Some(yields.iter().sum::<f64>() / yields.len() as f64)
        }
    }
}

/// Creditworthiness band derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    /// score >= 750
    LowRisk,
    /// score >= 650
    MediumRisk,
    /// score >= 550
    HighRisk,
    /// score < 550
    VeryHighRisk,
}

impl RiskCategory {
    /// Determine category from composite score
    pub fn from_score(score: u32) -> Self {
        if score >= 750 {
            RiskCategory::LowRisk
        } else if score >= 650 {
            RiskCategory::MediumRisk
        } else if score >= 550 {
            RiskCategory::HighRisk
        } else {
            RiskCategory::VeryHighRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::LowRisk => "LOW_RISK",
            RiskCategory::MediumRisk => "MEDIUM_RISK",
            RiskCategory::HighRisk => "HIGH_RISK",
            RiskCategory::VeryHighRisk => "VERY_HIGH_RISK",
        }
    }

    pub fn is_high_or_worse(&self) -> bool {
        matches!(self, RiskCategory::HighRisk | RiskCategory::VeryHighRisk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_risk_category_boundaries() {
        assert_eq!(RiskCategory::from_score(850), RiskCategory::LowRisk);
        assert_eq!(RiskCategory::from_score(750), RiskCategory::LowRisk);
        assert_eq!(RiskCategory::from_score(749), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::from_score(650), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::from_score(649), RiskCategory::HighRisk);
        assert_eq!(RiskCategory::from_score(550), RiskCategory::HighRisk);
        assert_eq!(RiskCategory::from_score(549), RiskCategory::VeryHighRisk);
        assert_eq!(RiskCategory::from_score(0), RiskCategory::VeryHighRisk);
    }

    #[test]
    fn test_income_variability() {
        let steady = FinancialHistory {
            monthly_incomes: vec![10_000; 12],
            ..Default::default()
        };
        assert_abs_diff_eq!(steady.income_variability(), 0.0);

        // mean 10k, population std dev 5k
        let swinging = FinancialHistory {
            monthly_incomes: vec![5_000, 15_000, 5_000, 15_000],
            ..Default::default()
        };
        assert_abs_diff_eq!(swinging.income_variability(), 0.5, epsilon = 1e-12);

        assert_abs_diff_eq!(FinancialHistory::default().income_variability(), 1.0);
    }

    #[test]
    fn test_ratios_absent_when_undefined() {
        let history = FinancialHistory::default();
        assert!(history.repayment_rate().is_none());
        assert!(history.credit_utilization().is_none());
    }

    #[test]
    fn test_average_yield_filters_by_crop() {
        let record = |crop: &str, y: Option<f64>| CropRecord {
            season: "KHARIF-2022".to_string(),
            crop_type: crop.to_string(),
            outcome: HarvestOutcome::Successful,
            revenue: 0,
            cost: 0,
            yield_per_area: y,
        };
        let profile = FarmerProfile {
            crop_history: vec![
                record("RICE", Some(20.0)),
                record("RICE", Some(24.0)),
                record("RICE", None),
                record("WHEAT", Some(15.0)),
            ],
            ..Default::default()
        };
        assert_abs_diff_eq!(profile.average_yield("rice").unwrap(), 22.0);
        assert!(profile.average_yield("COTTON").is_none());
    }
}
