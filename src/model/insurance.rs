//! Parametric insurance policies, claims and weather derivatives

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Amount, SeasonType, WeatherIndex, WeatherSnapshot};

/// Observable a weather trigger watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherMetric {
    CumulativeRainfall,
    MaxTemperature,
    ConsecutiveDryDays,
}

impl WeatherMetric {
    /// Accumulates over the window, so only meaningful once the window closes
    pub fn is_cumulative(&self) -> bool {
        matches!(self, WeatherMetric::CumulativeRainfall)
    }

    pub fn value_from(&self, snapshot: &WeatherSnapshot) -> f64 {
        match self {
            WeatherMetric::CumulativeRainfall => snapshot.cumulative_rainfall,
            WeatherMetric::MaxTemperature => snapshot.max_temperature,
            WeatherMetric::ConsecutiveDryDays => snapshot.consecutive_dry_days as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    LessThan,
    GreaterThan,
    Equal,
}

impl Comparison {
    /// Whether `actual` satisfies the comparison against `threshold`
    pub fn holds(&self, actual: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => actual < threshold,
            Comparison::GreaterThan => actual > threshold,
            Comparison::Equal => actual == threshold,
        }
    }
}

/// How much a fired weather trigger pays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerPayout {
    Fixed { amount: Amount },
    /// base × (1 + |threshold − actual| × scaling_factor)
    Scaled { base_amount: Amount, scaling_factor: f64 },
}

/// Offset and length of a trigger's window, counted from sowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementWindow {
    pub start_offset_days: u32,
    pub duration_days: u32,
}

impl MeasurementWindow {
    pub fn start(&self, sowing_date: NaiveDate) -> NaiveDate {
        sowing_date + Duration::days(self.start_offset_days as i64)
    }

    pub fn end(&self, sowing_date: NaiveDate) -> NaiveDate {
        self.start(sowing_date) + Duration::days(self.duration_days as i64)
    }

    pub fn contains(&self, sowing_date: NaiveDate, on: NaiveDate) -> bool {
        on >= self.start(sowing_date) && on <= self.end(sowing_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherTriggerKind {
    RainfallDeficit,
    ExtremeTemperature,
    ProlongedDrought,
}

impl WeatherTriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherTriggerKind::RainfallDeficit => "RAINFALL_DEFICIT",
            WeatherTriggerKind::ExtremeTemperature => "EXTREME_TEMPERATURE",
            WeatherTriggerKind::ProlongedDrought => "PROLONGED_DROUGHT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTrigger {
    pub kind: WeatherTriggerKind,
    pub metric: WeatherMetric,
    pub comparison: Comparison,
    pub threshold: f64,
    pub payout: TriggerPayout,
    pub window: MeasurementWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YieldTriggerKind {
    YieldLoss,
    TotalCropFailure,
}

impl YieldTriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldTriggerKind::YieldLoss => "YIELD_LOSS",
            YieldTriggerKind::TotalCropFailure => "TOTAL_CROP_FAILURE",
        }
    }
}

/// Payout of a fired yield trigger, as a fraction of sum insured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YieldPayout {
    /// Scales with the shortfall below threshold, reaching `max_payout_rate`
    /// at `floor_yield`
    Proportional { max_payout_rate: f64, floor_yield: f64 },
    FixedFraction { rate: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldTrigger {
    pub kind: YieldTriggerKind,
    /// Yield per acre
    pub threshold_yield: f64,
    pub comparison: Comparison,
    pub payout: YieldPayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageType {
    Comprehensive,
    WeatherOnly,
    YieldOnly,
}

impl CoverageType {
    pub fn covers_weather(&self) -> bool {
        !matches!(self, CoverageType::YieldOnly)
    }

    pub fn covers_yield(&self) -> bool {
        !matches!(self, CoverageType::WeatherOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Active,
    /// Claims have used up the sum insured
    Exhausted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PolicyPeriod {
    pub fn contains(&self, on: NaiveDate) -> bool {
        on >= self.start && on <= self.end
    }
}

/// Trigger that produced a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerRef {
    Weather(WeatherTriggerKind),
    Yield(YieldTriggerKind),
}

impl TriggerRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerRef::Weather(kind) => kind.as_str(),
            TriggerRef::Yield(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    AutoApproved,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceClaim {
    /// Unique per policy, trigger and measurement window
    pub id: String,
    pub policy_id: String,
    pub farmer_id: String,
    pub trigger: TriggerRef,
    pub amount: Amount,
    pub snapshot: WeatherSnapshot,
    pub status: ClaimStatus,
    pub claimed_on: NaiveDate,
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumPayment {
    pub amount: Amount,
    pub paid_on: NaiveDate,
}

/// A crop policy with automatic, trigger-based claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub id: String,
    pub farmer_id: String,
    #[serde(default)]
    pub loan_id: Option<String>,
    pub crop_type: String,
    pub season: SeasonType,
    /// Acres insured
    pub sowing_area: f64,
    pub sowing_date: NaiveDate,
    pub weather_station: String,
    pub sum_insured: Amount,
    pub premium: Amount,
    pub coverage: CoverageType,
    pub weather_triggers: Vec<WeatherTrigger>,
    pub yield_triggers: Vec<YieldTrigger>,
    pub period: PolicyPeriod,
    pub status: PolicyStatus,
    pub claims: Vec<InsuranceClaim>,
    pub premiums_paid: Vec<PremiumPayment>,
    pub created_on: NaiveDate,
}

impl InsurancePolicy {
    pub fn total_claimed(&self) -> Amount {
        self.claims.iter().map(|c| c.amount).sum()
    }

    /// Sum insured not yet paid out
    pub fn remaining_cover(&self) -> Amount {
        self.sum_insured.saturating_sub(self.total_claimed())
    }

    pub fn premium_paid(&self) -> Amount {
        self.premiums_paid.iter().map(|p| p.amount).sum()
    }

    pub fn premium_outstanding(&self) -> Amount {
        self.premium.saturating_sub(self.premium_paid())
    }

    pub fn has_claim(&self, claim_id: &str) -> bool {
        self.claims.iter().any(|c| c.id == claim_id)
    }
}

/// Side of the strike a derivative pays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DerivativeDirection {
    /// Pays when the realized index finishes below strike
    Put,
    /// Pays when the realized index finishes above strike
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativePayoutStructure {
    pub direction: DerivativeDirection,
    /// Amount paid per index unit beyond strike
    pub tick_value: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DerivativeStatus {
    Active,
    Settled,
    /// Matured out of the money
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativePayout {
    pub id: String,
    pub amount: Amount,
    pub realized_index: f64,
    pub paid_on: NaiveDate,
}

/// Index-linked contract settled once at maturity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherDerivative {
    pub id: String,
    pub holder_id: String,
    pub index: WeatherIndex,
    pub station: String,
    pub strike: f64,
    pub payout_structure: DerivativePayoutStructure,
    pub premium: Amount,
    pub max_payout: Amount,
    pub period: PolicyPeriod,
    pub status: DerivativeStatus,
    pub settlements: Vec<DerivativePayout>,
    pub created_on: NaiveDate,
}
