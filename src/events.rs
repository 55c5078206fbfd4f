//! Events emitted after committed transitions

use serde::{Deserialize, Serialize};

use crate::model::{Amount, RiskCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    ApplicationSubmitted {
        application_id: String,
        farmer_id: String,
        requested_amount: Amount,
    },
    ApplicationScored {
        application_id: String,
        farmer_id: String,
        credit_score: u32,
        risk_category: RiskCategory,
    },
    LoanApproved {
        loan_id: String,
        application_id: String,
        farmer_id: String,
        principal: Amount,
        interest_rate: f64,
        tenure_months: u32,
    },
    LoanRejected {
        application_id: String,
        farmer_id: String,
        reason: String,
    },
    CollateralVerified {
        loan_id: String,
        credential_id: String,
    },
    LoanDisbursed {
        loan_id: String,
        farmer_id: String,
        disbursed_amount: Amount,
        processing_fee: Amount,
    },
    RepaymentProcessed {
        loan_id: String,
        amount: Amount,
        principal: Amount,
        interest: Amount,
        outstanding: Amount,
    },
    LoanClosed {
        loan_id: String,
        farmer_id: String,
    },
    LoanDefaulted {
        loan_id: String,
        farmer_id: String,
        outstanding: Amount,
    },
    PolicyCreated {
        policy_id: String,
        farmer_id: String,
        crop_type: String,
        sum_insured: Amount,
        premium: Amount,
    },
    PremiumPaid {
        policy_id: String,
        amount: Amount,
    },
    ClaimSettled {
        claim_id: String,
        policy_id: String,
        farmer_id: String,
        trigger: String,
        amount: Amount,
    },
    DerivativeCreated {
        derivative_id: String,
        holder_id: String,
        premium: Amount,
        max_payout: Amount,
    },
    DerivativeSettled {
        derivative_id: String,
        holder_id: String,
        amount: Amount,
        realized_index: f64,
    },
    DerivativeExpired {
        derivative_id: String,
        realized_index: f64,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::ApplicationSubmitted { .. } => "application_submitted",
            EngineEvent::ApplicationScored { .. } => "application_scored",
            EngineEvent::LoanApproved { .. } => "loan_approved",
            EngineEvent::LoanRejected { .. } => "loan_rejected",
            EngineEvent::CollateralVerified { .. } => "collateral_verified",
            EngineEvent::LoanDisbursed { .. } => "loan_disbursed",
            EngineEvent::RepaymentProcessed { .. } => "repayment_processed",
            EngineEvent::LoanClosed { .. } => "loan_closed",
            EngineEvent::LoanDefaulted { .. } => "loan_defaulted",
            EngineEvent::PolicyCreated { .. } => "policy_created",
            EngineEvent::PremiumPaid { .. } => "premium_paid",
            EngineEvent::ClaimSettled { .. } => "claim_settled",
            EngineEvent::DerivativeCreated { .. } => "derivative_created",
            EngineEvent::DerivativeSettled { .. } => "derivative_settled",
            EngineEvent::DerivativeExpired { .. } => "derivative_expired",
        }
    }
}
