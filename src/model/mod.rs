//! Farmer profiles, loan records, insurance contracts and their CSV loaders

mod profile;
mod loan;
mod insurance;
mod weather;
pub mod loader;

pub use profile::{
    FarmerBasicInfo, FarmerProfile, LandOwnershipInfo, OwnershipType, SoilQuality, CropRecord,
    HarvestOutcome, FinancialHistory, WeatherRiskProfile, ClimateZone, FloodRisk,
    MarketAccessProfile, SocialProfile, EducationLevel, RiskCategory,
};
pub use loan::{
    SeasonType, ApplicationStatus, LoanApplication, LoanCategory, LoanStatus, InstallmentStatus,
    RepaymentInstallment, CollateralKind, CollateralRequirement, DisbursementRecord,
    RepaymentRecord, AgriculturalLoan,
};
pub use insurance::{
    WeatherMetric, Comparison, TriggerPayout, MeasurementWindow, WeatherTriggerKind,
    WeatherTrigger, YieldTriggerKind, YieldPayout, YieldTrigger, CoverageType, PolicyStatus,
    PolicyPeriod, InsurancePolicy, TriggerRef, ClaimStatus, InsuranceClaim, PremiumPayment,
    DerivativeDirection, DerivativePayoutStructure, DerivativeStatus, WeatherDerivative,
    DerivativePayout,
};
pub use weather::{WeatherSnapshot, WeatherIndex};
pub use loader::{load_crop_history, load_weather_snapshots};

/// Money in minor currency units
pub type Amount = u64;

/// Truncate a computed money value toward zero
///
/// A tolerance of 1e-6 absorbs binary rounding so a product that is
/// mathematically whole does not lose a unit. Negative and non-finite values
/// become zero.
pub fn truncate_amount(value: f64) -> Amount {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value + 1e-6) as Amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_amount() {
        assert_eq!(truncate_amount(832.9), 832);
        assert_eq!(truncate_amount(0.1 * 3.0 * 10.0), 3);
        assert_eq!(truncate_amount(599_999.999_999_9), 600_000);
        assert_eq!(truncate_amount(-5.0), 0);
        assert_eq!(truncate_amount(f64::NAN), 0);
        assert_eq!(truncate_amount(f64::INFINITY), 0);
    }
}
