//! Loan origination: submission, scoring and approval

use std::collections::BTreeMap;

use chrono::Months;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::collateral::{approval_conditions, collateral_requirement, insurance_required};
use super::schedule::{build_schedule, select_tenure};
use super::servicing::{disbursed_event, transfer_disbursement};
use crate::context::Context;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::insurance::{assign_policy_id, policy_created, quote_policy, PolicyRequest};
use crate::model::{
    AgriculturalLoan, Amount, ApplicationStatus, CoverageType, FarmerBasicInfo, LoanApplication,
    LoanCategory, LoanStatus, SeasonType,
};
use crate::scoring::{assess_eligibility, discounted_rate, CreditScorer, EligibilityAssessment, FarmerCreditProfile};

/// Credential kind issued for every approved loan
pub const LOAN_CREDENTIAL_KIND: &str = "AGRICULTURAL_LOAN";

/// A farmer's request for credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub farmer_id: String,
    pub requested_amount: Amount,
    /// Crop financed; EQUIPMENT or INFRASTRUCTURE for term loans
    pub crop_type: String,
    /// Acres to be cultivated
    pub land_size: f64,
    /// Defaults to the season of the submission date
    #[serde(default)]
    pub season: Option<SeasonType>,
    #[serde(default)]
    pub purpose: String,
}

/// Why an application was turned down and what would help
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub application_id: String,
    pub reason: String,
    pub recommendations: Vec<String>,
    pub assessment: EligibilityAssessment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplicationOutcome {
    Approved(AgriculturalLoan),
    Rejected(Rejection),
}

impl ApplicationOutcome {
    pub fn loan(&self) -> Option<&AgriculturalLoan> {
        match self {
            ApplicationOutcome::Approved(loan) => Some(loan),
            ApplicationOutcome::Rejected(_) => None,
        }
    }
}

/// Validate and store a new application in `Submitted` status
pub fn submit_application(ctx: &mut Context, request: &LoanRequest) -> EngineResult<LoanApplication> {
    let crop_type = request.crop_type.trim().to_ascii_uppercase();
    if crop_type.is_empty() {
        return Err(EngineError::Validation("crop type is required".to_string()));
    }
    if request.requested_amount == 0 {
        return Err(EngineError::Validation("requested amount must be positive".to_string()));
    }
    if request.requested_amount < ctx.config.min_loan_amount {
        return Err(EngineError::Validation(format!(
            "requested amount {} is below the minimum loan amount {}",
            request.requested_amount, ctx.config.min_loan_amount
        )));
    }
    if !request.land_size.is_finite() || request.land_size <= 0.0 {
        return Err(EngineError::Validation(format!(
            "land size must be positive, got {}",
            request.land_size
        )));
    }
    if ctx.profiles.basic_info(&request.farmer_id).is_none() {
        return Err(EngineError::not_found("farmer", &request.farmer_id));
    }

    let sequence = ctx.records.next_sequence("application");
    let application = LoanApplication {
        id: format!("APP-{}-{}", request.farmer_id, sequence),
        farmer_id: request.farmer_id.clone(),
        requested_amount: request.requested_amount,
        crop_type,
        land_size: request.land_size,
        season: request.season.unwrap_or_else(|| SeasonType::for_date(ctx.today)),
        purpose: request.purpose.clone(),
        status: ApplicationStatus::Submitted,
        submitted_on: ctx.today,
        credit_score: None,
        risk_category: None,
        rejection_reason: None,
        loan_id: None,
    };

    ctx.records.put_application(application.clone());
    info!(
        "Application {} submitted by {} for {}",
        application.id, application.farmer_id, application.requested_amount
    );
    ctx.emit(EngineEvent::ApplicationSubmitted {
        application_id: application.id.clone(),
        farmer_id: application.farmer_id.clone(),
        requested_amount: application.requested_amount,
    });

    Ok(application)
}

/// Score a submitted application and approve or reject it
pub fn process_application(ctx: &mut Context, application_id: &str) -> EngineResult<ApplicationOutcome> {
    decide(ctx, application_id, false)
}

/// Score, approve and, when no disbursement condition is outstanding,
/// disburse in one step
///
/// If the disbursement transfer fails nothing is stored: the application
/// stays `Submitted` and no loan or policy exists.
pub fn process_agricultural_loan(ctx: &mut Context, application_id: &str) -> EngineResult<ApplicationOutcome> {
    decide(ctx, application_id, true)
}

fn decide(ctx: &mut Context, application_id: &str, auto_disburse: bool) -> EngineResult<ApplicationOutcome> {
    let mut application = ctx
        .records
        .application(application_id)
        .ok_or_else(|| EngineError::not_found("application", application_id))?;
    if application.status != ApplicationStatus::Submitted {
        return Err(EngineError::invalid_state(
            "application",
            application_id,
            application.status,
            ApplicationStatus::Submitted,
        ));
    }

    let basic = ctx
        .profiles
        .basic_info(&application.farmer_id)
        .ok_or_else(|| EngineError::not_found("farmer", &application.farmer_id))?;
    let profile = ctx.profiles.profile(&application.farmer_id);
    let credit = CreditScorer::new(ctx.config).score_profile(&basic, &profile);
    let assessment = assess_eligibility(
        ctx.config,
        &credit,
        &profile,
        application.requested_amount,
        &application.crop_type,
        ctx.today,
    );

    application.status = ApplicationStatus::UnderReview;
    application.credit_score = Some(credit.credit_score);
    application.risk_category = Some(credit.risk_category);
    let scored = EngineEvent::ApplicationScored {
        application_id: application.id.clone(),
        farmer_id: application.farmer_id.clone(),
        credit_score: credit.credit_score,
        risk_category: credit.risk_category,
    };

    if !assessment.is_eligible {
        application.status = ApplicationStatus::Rejected;
        application.rejection_reason = Some(assessment.reason.clone());
        ctx.records.put_application(application.clone());
        info!(
            "Application {} rejected (score {}): {}",
            application.id, credit.credit_score, assessment.reason
        );
        ctx.emit_all([
            scored,
            EngineEvent::LoanRejected {
                application_id: application.id.clone(),
                farmer_id: application.farmer_id.clone(),
                reason: assessment.reason.clone(),
            },
        ]);
        return Ok(ApplicationOutcome::Rejected(Rejection {
            application_id: application.id,
            reason: assessment.reason.clone(),
            recommendations: assessment.recommendations.clone(),
            assessment,
        }));
    }

    let mut loan = build_loan(ctx, &application, &basic, &credit)?;

    let mut policy = None;
    if loan.insurance_required {
        let request = PolicyRequest {
            farmer_id: loan.farmer_id.clone(),
            loan_id: Some(loan.id.clone()),
            crop_type: loan.crop_type.clone(),
            season: Some(loan.season),
            sowing_area: application.land_size,
            sowing_date: ctx.today,
            harvest_date: None,
            coverage: CoverageType::Comprehensive,
        };
        match quote_policy(ctx, &request) {
            Ok(p) => policy = Some(p),
            Err(e) => warn!(
                "Mandatory insurance for loan {} could not be created: {}; continuing without a policy",
                loan.id, e
            ),
        }
    }

    let insurance_ready = !loan.insurance_required || policy.is_some();
    let mut disbursement = None;
    if auto_disburse && loan.collateral_satisfied() && insurance_ready {
        let record = transfer_disbursement(ctx, &loan)?;
        loan.disbursement = Some(record.clone());
        loan.status = LoanStatus::Active;
        disbursement = Some(record);
    }

    if let Some(policy) = policy.as_mut() {
        assign_policy_id(ctx, policy);
        loan.insurance_policy_id = Some(policy.id.clone());
    }

    let mut claims = BTreeMap::new();
    claims.insert("loan_id".to_string(), loan.id.clone());
    claims.insert("principal".to_string(), loan.principal.to_string());
    claims.insert("interest_rate".to_string(), loan.interest_rate.to_string());
    claims.insert("tenure_months".to_string(), loan.tenure_months.to_string());
    match ctx
        .identity
        .issue_credential(&loan.farmer_id, LOAN_CREDENTIAL_KIND, claims, ctx.today)
    {
        Ok(credential) => loan.credential_id = Some(credential.id),
        Err(e) => warn!("Loan credential for {} not issued: {}", loan.id, e),
    }

    application.status = ApplicationStatus::Approved;
    application.loan_id = Some(loan.id.clone());
    ctx.records.put_application(application);
    ctx.records.put_loan(loan.clone());
    if let Some(policy) = &policy {
        ctx.records.put_policy(policy.clone());
    }

    info!(
        "Loan {} approved for {}: principal {}, rate {:.4}, tenure {} months",
        loan.id, loan.farmer_id, loan.principal, loan.interest_rate, loan.tenure_months
    );
    let mut events = vec![
        scored,
        EngineEvent::LoanApproved {
            loan_id: loan.id.clone(),
            application_id: loan.application_id.clone(),
            farmer_id: loan.farmer_id.clone(),
            principal: loan.principal,
            interest_rate: loan.interest_rate,
            tenure_months: loan.tenure_months,
        },
    ];
    if let Some(policy) = &policy {
        info!("Policy {} written for loan {}", policy.id, loan.id);
        events.push(policy_created(policy));
    }
    if let Some(record) = &disbursement {
        info!(
            "Loan {} disbursed: {} to farmer, fee {}",
            loan.id, record.disbursed_amount, record.processing_fee
        );
        events.push(disbursed_event(&loan, record));
    }
    ctx.emit_all(events);

    Ok(ApplicationOutcome::Approved(loan))
}

/// Terms of an approved loan for an eligible application
fn build_loan(
    ctx: &Context,
    application: &LoanApplication,
    basic: &FarmerBasicInfo,
    credit: &FarmerCreditProfile,
) -> EngineResult<AgriculturalLoan> {
    let principal = application.requested_amount;
    let interest_rate = discounted_rate(ctx.config, credit.recommended_rate, basic, ctx.today);
    let tenure_months = select_tenure(ctx.config, ctx.crops, &application.crop_type, principal);
    let category = LoanCategory::from_crop_type(&application.crop_type);
    let schedule = build_schedule(principal, interest_rate, tenure_months, category, ctx.today)?;

    let collateral = collateral_requirement(ctx.config, credit.risk_category, principal);
    let needs_insurance = insurance_required(ctx.config, principal, &application.crop_type);
    let maturity_date = ctx
        .today
        .checked_add_months(Months::new(tenure_months))
        .ok_or_else(|| EngineError::Validation("maturity date out of range".to_string()))?;

    Ok(AgriculturalLoan {
        id: format!("LOAN-{}", application.id),
        application_id: application.id.clone(),
        farmer_id: application.farmer_id.clone(),
        category,
        crop_type: application.crop_type.clone(),
        season: application.season,
        principal,
        interest_rate,
        tenure_months,
        credit_score: credit.credit_score,
        risk_category: credit.risk_category,
        schedule,
        approval_conditions: approval_conditions(collateral.as_ref(), needs_insurance),
        collateral,
        insurance_required: needs_insurance,
        insurance_policy_id: None,
        disbursement: None,
        repayments: Vec::new(),
        status: LoanStatus::Approved,
        approved_on: ctx.today,
        maturity_date,
        closed_on: None,
        credential_id: None,
    })
}
