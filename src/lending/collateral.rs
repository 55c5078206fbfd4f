//! Disbursement conditions: collateral and mandatory insurance

use crate::config::EngineConfig;
use crate::model::{Amount, CollateralKind, CollateralRequirement, RiskCategory};

/// Collateral coverage for high-risk borrowers, in percent of principal
const HIGH_RISK_COVERAGE_PCT: u128 = 120;
/// Collateral coverage for large loans, in percent of principal
const LARGE_LOAN_COVERAGE_PCT: u128 = 110;

fn percent_of(principal: Amount, pct: u128) -> Amount {
    (principal as u128 * pct / 100) as Amount
}

/// Collateral a loan must carry before disbursement, if any
///
/// High and very-high risk borrowers pledge land documents worth 120% of
/// principal. Other loans above the collateral threshold pledge 110% and
/// may use gold instead of land.
pub fn collateral_requirement(
    config: &EngineConfig,
    risk: RiskCategory,
    principal: Amount,
) -> Option<CollateralRequirement> {
    if risk.is_high_or_worse() {
        Some(CollateralRequirement {
            kind: CollateralKind::LandDocuments,
            value: percent_of(principal, HIGH_RISK_COVERAGE_PCT),
            verified: false,
            credential_id: None,
        })
    } else if principal > config.collateral_threshold {
        Some(CollateralRequirement {
            kind: CollateralKind::LandDocumentsOrGold,
            value: percent_of(principal, LARGE_LOAN_COVERAGE_PCT),
            verified: false,
            credential_id: None,
        })
    } else {
        None
    }
}

pub fn insurance_required(config: &EngineConfig, principal: Amount, crop_type: &str) -> bool {
    principal > config.insurance_threshold || config.is_weather_sensitive(crop_type)
}

/// Human-readable conditions attached to an approval
pub fn approval_conditions(
    collateral: Option<&CollateralRequirement>,
    insurance_required: bool,
) -> Vec<String> {
    let mut conditions = Vec::new();

    if let Some(collateral) = collateral {
        let kind = match collateral.kind {
            CollateralKind::LandDocuments => "land documents",
            CollateralKind::LandDocumentsOrGold => "land documents or gold",
        };
        conditions.push(format!(
            "Collateral of {} worth at least {} must be verified before disbursement",
            kind, collateral.value
        ));
    }
    if insurance_required {
        conditions.push("Crop insurance policy must be linked before disbursement".to_string());
    }
    conditions.push("Repay according to the agreed schedule".to_string());

    conditions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_risk_needs_land_collateral() {
        let config = EngineConfig::default();
        let collateral = collateral_requirement(&config, RiskCategory::HighRisk, 100_000).unwrap();
        assert_eq!(collateral.kind, CollateralKind::LandDocuments);
        assert_eq!(collateral.value, 120_000);
        assert!(!collateral.verified);

        let collateral = collateral_requirement(&config, RiskCategory::VeryHighRisk, 500_000).unwrap();
        assert_eq!(collateral.value, 600_000);
    }

    #[test]
    fn test_large_loan_needs_broader_collateral() {
        let config = EngineConfig::default();
        assert!(collateral_requirement(&config, RiskCategory::LowRisk, 300_000).is_none());

        let collateral = collateral_requirement(&config, RiskCategory::LowRisk, 400_000).unwrap();
        assert_eq!(collateral.kind, CollateralKind::LandDocumentsOrGold);
        assert_eq!(collateral.value, 440_000);

        let collateral = collateral_requirement(&config, RiskCategory::MediumRisk, 300_001).unwrap();
        assert_eq!(collateral.value, 330_001);
    }

    #[test]
    fn test_insurance_selection() {
        let config = EngineConfig::default();
        assert!(!insurance_required(&config, 200_000, "RICE"));
        assert!(insurance_required(&config, 200_001, "RICE"));
        assert!(insurance_required(&config, 50_000, "cotton"));
        assert!(!insurance_required(&config, 50_000, "EQUIPMENT"));
    }

    #[test]
    fn test_approval_conditions() {
        let config = EngineConfig::default();
        let collateral = collateral_requirement(&config, RiskCategory::HighRisk, 100_000);
        let conditions = approval_conditions(collateral.as_ref(), true);
        assert_eq!(conditions.len(), 3);
        assert!(conditions[0].contains("land documents worth at least 120000"));

        assert_eq!(approval_conditions(None, false).len(), 1);
    }
}
