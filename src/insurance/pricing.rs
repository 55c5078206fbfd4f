//! Sum insured, risk loading and premium

use chrono::{Months, NaiveDate};

use crate::config::EngineConfig;
use crate::crops::CropCatalog;
use crate::model::{truncate_amount, Amount, FloodRisk, InsuranceClaim, WeatherRiskProfile};

/// Upper bound on the accumulated risk multiplier
pub const MAX_RISK_MULTIPLIER: f64 = 2.5;

/// Claims within this many months count toward the claims loading
const CLAIMS_LOOKBACK_MONTHS: u32 = 36;
const FREQUENT_CLAIMANT_CLAIMS: usize = 2;

/// Value at risk on the insured acres
///
/// Expected yield × area × market price × coverage ratio when the crop is
/// catalogued with both a yield and a price, otherwise the per-acre default.
pub fn sum_insured(config: &EngineConfig, crops: &CropCatalog, crop_type: &str, area: f64) -> Amount {
    match crops.get(crop_type).and_then(|c| c.expected_value_per_area()) {
        Some(value_per_area) => truncate_amount(area * value_per_area * config.coverage_ratio),
        None => truncate_amount(area * config.default_insurance_per_area as f64),
    }
}

/// Claims paid to a farmer within the lookback window ending `today`
pub fn recent_claim_count(claims: &[InsuranceClaim], today: NaiveDate) -> usize {
    let since = today
        .checked_sub_months(Months::new(CLAIMS_LOOKBACK_MONTHS))
        .unwrap_or(NaiveDate::MIN);
    claims
        .iter()
        .filter(|c| c.claimed_on > since && c.claimed_on <= today)
        .count()
}

/// Premium loading from drought and flood exposure, crop risk and claims
pub fn risk_multiplier(
    crops: &CropCatalog,
    weather: Option<&WeatherRiskProfile>,
    crop_type: &str,
    recent_claims: usize,
) -> f64 {
    let mut multiplier = 1.0;

    if let Some(weather) = weather {
        if weather.drought_frequency >= 5 {
            multiplier += 0.5;
        } else if weather.drought_frequency >= 3 {
            multiplier += 0.25;
        }

        match weather.flood_risk {
            FloodRisk::High => multiplier += 0.3,
            FloodRisk::Medium => multiplier += 0.15,
            FloodRisk::Low | FloodRisk::Unknown => {}
        }
    }

    multiplier += crops.risk_factor(crop_type);

    if recent_claims >= FREQUENT_CLAIMANT_CLAIMS {
        multiplier += 0.2;
    }

    multiplier.min(MAX_RISK_MULTIPLIER)
}

/// Premium after the small-farmer subsidy
pub fn premium(config: &EngineConfig, sum_insured: Amount, multiplier: f64, farmer_land_area: f64) -> Amount {
    let gross = truncate_amount(sum_insured as f64 * config.base_premium_rate * multiplier);
    if config.is_small_farmer(farmer_land_area) {
        gross - truncate_amount(gross as f64 * config.small_farmer_subsidy_rate)
    } else {
        gross
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClimateZone, ClaimStatus, TriggerRef, WeatherSnapshot, WeatherTriggerKind};
    use approx::assert_abs_diff_eq;

    fn weather(drought_frequency: u32, flood_risk: FloodRisk) -> WeatherRiskProfile {
        WeatherRiskProfile {
            climate_zone: ClimateZone::SemiArid,
            drought_frequency,
            flood_risk,
            rainfall_variability: 0.3,
            has_crop_insurance: false,
        }
    }

    fn claim_on(date: NaiveDate) -> InsuranceClaim {
        InsuranceClaim {
            id: format!("CLM-{}", date),
            policy_id: "POL-1".to_string(),
            farmer_id: "F1".to_string(),
            trigger: TriggerRef::Weather(WeatherTriggerKind::RainfallDeficit),
            amount: 1_000,
            snapshot: WeatherSnapshot {
                station: "PUNE-01".to_string(),
                observed_on: date,
                cumulative_rainfall: 100.0,
                max_temperature: 30.0,
                consecutive_dry_days: 0,
                humidity: None,
                yield_per_area: None,
            },
            status: ClaimStatus::Paid,
            claimed_on: date,
            paid_on: Some(date),
        }
    }

    #[test]
    fn test_sum_insured_from_catalog() {
        let config = EngineConfig::default();
        let crops = CropCatalog::default_catalog();
        // 2 acres × 20 × 2,100 × 0.85
        assert_eq!(sum_insured(&config, &crops, "RICE", 2.0), 71_400);
        assert_eq!(sum_insured(&config, &crops, "rice", 2.0), 71_400);
    }

    #[test]
    fn test_sum_insured_fallback() {
        let config = EngineConfig::default();
        let crops = CropCatalog::default_catalog();
        assert_eq!(sum_insured(&config, &crops, "MILLET", 2.5), 75_000);
    }

    #[test]
    fn test_risk_multiplier_accumulates_and_caps() {
        let crops = CropCatalog::default_catalog();
        assert_abs_diff_eq!(risk_multiplier(&crops, None, "RICE", 0), 1.01, epsilon = 1e-12);
        assert_abs_diff_eq!(
            risk_multiplier(&crops, Some(&weather(3, FloodRisk::Medium)), "COTTON", 0),
            1.43,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            risk_multiplier(&crops, Some(&weather(5, FloodRisk::High)), "VEGETABLES", 2),
            2.05,
            epsilon = 1e-12
        );

        let capped = CropCatalog::from_crops(vec![{
            let mut info = crops.get("RICE").unwrap().clone();
            info.risk_factor = 1.0;
            info
        }]);
        assert_abs_diff_eq!(
            risk_multiplier(&capped, Some(&weather(6, FloodRisk::High)), "RICE", 3),
            MAX_RISK_MULTIPLIER,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_small_farmer_subsidy() {
        let config = EngineConfig::default();
        // 100,000 × 0.05 × 1.2 = 6,000
        assert_eq!(premium(&config, 100_000, 1.2, 8.0), 6_000);
        assert_eq!(premium(&config, 100_000, 1.2, 3.0), 3_000);
        assert_eq!(premium(&config, 71_400, 1.01, 3.0), 1_803);
    }

    #[test]
    fn test_recent_claims_window() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let claims = vec![
            claim_on(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
            claim_on(NaiveDate::from_ymd_opt(2021, 6, 2).unwrap()),
            claim_on(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()),
            claim_on(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()),
        ];
        assert_eq!(recent_claim_count(&claims, today), 2);
    }
}
