//! Loan application and agricultural loan records

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Amount, RiskCategory};

/// Cropping season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonType {
    /// Monsoon season, June to November
    Kharif,
    /// Winter season, December to March
    Rabi,
    /// Summer season, April and May
    Zaid,
    /// Year-round crops such as sugarcane
    Annual,
}

impl SeasonType {
    /// Season in progress on a calendar date
    pub fn for_date(date: NaiveDate) -> Self {
        match date.month() {
            6..=11 => SeasonType::Kharif,
            12 | 1..=3 => SeasonType::Rabi,
            _ => SeasonType::Zaid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::Kharif => "KHARIF",
            SeasonType::Rabi => "RABI",
            SeasonType::Zaid => "ZAID",
            SeasonType::Annual => "ANNUAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

/// A farmer's request for credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: String,
    pub farmer_id: String,
    pub requested_amount: Amount,
    /// Crop the loan finances, or EQUIPMENT / INFRASTRUCTURE
    pub crop_type: String,
    /// Acres under the financed crop
    pub land_size: f64,
    pub season: SeasonType,
    #[serde(default)]
    pub purpose: String,
    pub status: ApplicationStatus,
    pub submitted_on: NaiveDate,
    #[serde(default)]
    pub credit_score: Option<u32>,
    #[serde(default)]
    pub risk_category: Option<RiskCategory>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub loan_id: Option<String>,
}

/// Repayment shape of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanCategory {
    /// Interest through the season, principal at harvest
    Crop,
    /// Equipment and infrastructure loans, amortizing
    Term,
}

impl LoanCategory {
    pub fn from_crop_type(crop_type: &str) -> Self {
        let crop = crop_type.trim();
        if crop.is_empty()
            || crop.eq_ignore_ascii_case("EQUIPMENT")
            || crop.eq_ignore_ascii_case("INFRASTRUCTURE")
        {
            LoanCategory::Term
        } else {
            LoanCategory::Crop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Approved,
    Active,
    Closed,
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentInstallment {
    /// 1-based sequence number
    pub number: u32,
    pub due_date: NaiveDate,
    pub total_amount: Amount,
    pub principal_amount: Amount,
    pub interest_amount: Amount,
    pub status: InstallmentStatus,
}

/// Collateral accepted against a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollateralKind {
    LandDocuments,
    LandDocumentsOrGold,
}

impl CollateralKind {
    /// Whether a credential of this kind can back the requirement
    pub fn accepts(&self, credential_kind: &str) -> bool {
        match self {
            CollateralKind::LandDocuments => credential_kind == "LAND_DOCUMENTS",
            CollateralKind::LandDocumentsOrGold => {
                matches!(credential_kind, "LAND_DOCUMENTS" | "GOLD")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralRequirement {
    pub kind: CollateralKind,
    /// Required collateral value
    pub value: Amount,
    pub verified: bool,
    #[serde(default)]
    pub credential_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisbursementRecord {
    /// Amount transferred to the farmer (principal net of fee)
    pub disbursed_amount: Amount,
    pub processing_fee: Amount,
    pub disbursed_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentRecord {
    pub sequence: u32,
    pub paid_on: NaiveDate,
    pub amount: Amount,
    pub principal: Amount,
    pub interest: Amount,
    pub outstanding_after: Amount,
}

/// An approved loan and everything that has happened to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgriculturalLoan {
    pub id: String,
    pub application_id: String,
    pub farmer_id: String,
    pub category: LoanCategory,
    pub crop_type: String,
    pub season: SeasonType,
    pub principal: Amount,
    /// Annual rate after discounts
    pub interest_rate: f64,
    pub tenure_months: u32,
    pub credit_score: u32,
    pub risk_category: RiskCategory,
    pub schedule: Vec<RepaymentInstallment>,
    pub collateral: Option<CollateralRequirement>,
    pub insurance_required: bool,
    pub insurance_policy_id: Option<String>,
    pub approval_conditions: Vec<String>,
    pub disbursement: Option<DisbursementRecord>,
    pub repayments: Vec<RepaymentRecord>,
    pub status: LoanStatus,
    pub approved_on: NaiveDate,
    pub maturity_date: NaiveDate,
    #[serde(default)]
    pub closed_on: Option<NaiveDate>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

impl AgriculturalLoan {
    /// Principal plus all scheduled interest
    pub fn total_obligation(&self) -> Amount {
        self.schedule.iter().map(|i| i.total_amount).sum()
    }

    pub fn total_repaid(&self) -> Amount {
        self.repayments.iter().map(|r| r.amount).sum()
    }

    pub fn principal_repaid(&self) -> Amount {
        self.repayments.iter().map(|r| r.principal).sum()
    }

    pub fn outstanding(&self) -> Amount {
        self.total_obligation().saturating_sub(self.total_repaid())
    }

    /// Collateral is either not needed or already verified
    pub fn collateral_satisfied(&self) -> bool {
        self.collateral.as_ref().map(|c| c.verified).unwrap_or(true)
    }

    /// Insurance is either not needed or a policy is linked
    pub fn insurance_satisfied(&self) -> bool {
        !self.insurance_required || self.insurance_policy_id.is_some()
    }

    /// Next installment still pending, if any
    pub fn next_due(&self) -> Option<&RepaymentInstallment> {
        self.schedule
            .iter()
            .find(|i| i.status == InstallmentStatus::Pending)
    }
}
