//! Post-approval servicing: collateral, disbursement, repayment, default

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::schedule::allocate_repayment;
use crate::context::Context;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::model::{AgriculturalLoan, Amount, DisbursementRecord, LoanStatus, PolicyStatus, RepaymentRecord};
use crate::ports::Account;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DisbursementOutcome {
    Disbursed(DisbursementRecord),
    /// A disbursement condition is still outstanding; nothing moved
    Blocked { reason: String },
}

fn load_loan(ctx: &Context, loan_id: &str) -> EngineResult<AgriculturalLoan> {
    ctx.records
        .loan(loan_id)
        .ok_or_else(|| EngineError::not_found("loan", loan_id))
}

fn require_status(loan: &AgriculturalLoan, expected: LoanStatus) -> EngineResult<()> {
    if loan.status == expected {
        Ok(())
    } else {
        Err(EngineError::invalid_state("loan", &loan.id, loan.status, expected))
    }
}

/// Mark a loan's collateral verified against a credential held by the borrower
pub fn verify_collateral(ctx: &mut Context, loan_id: &str, credential_id: &str) -> EngineResult<AgriculturalLoan> {
    let mut loan = load_loan(ctx, loan_id)?;
    require_status(&loan, LoanStatus::Approved)?;

    let Some(collateral) = loan.collateral.as_mut() else {
        return Err(EngineError::Validation(format!(
            "loan {} does not require collateral",
            loan_id
        )));
    };
    if collateral.verified {
        return Ok(loan);
    }

    let credential = ctx.identity.verify_credential(credential_id)?;
    let subject = ctx.identity.resolve_identity(&loan.farmer_id)?;
    if credential.subject != subject {
        return Err(EngineError::Validation(format!(
            "credential {} is not held by farmer {}",
            credential_id, loan.farmer_id
        )));
    }
    if !collateral.kind.accepts(&credential.kind) {
        return Err(EngineError::Validation(format!(
            "credential {} of kind {} cannot secure {:?} collateral",
            credential_id, credential.kind, collateral.kind
        )));
    }

    collateral.verified = true;
    collateral.credential_id = Some(credential.id.clone());
    ctx.records.put_loan(loan.clone());
    info!("Collateral for loan {} verified by {}", loan.id, credential.id);
    ctx.emit(EngineEvent::CollateralVerified {
        loan_id: loan.id.clone(),
        credential_id: credential.id,
    });

    Ok(loan)
}

/// Attach an existing policy to a loan that requires insurance
pub fn link_insurance_policy(ctx: &mut Context, loan_id: &str, policy_id: &str) -> EngineResult<AgriculturalLoan> {
    let mut loan = load_loan(ctx, loan_id)?;
    require_status(&loan, LoanStatus::Approved)?;

    let mut policy = ctx
        .records
        .policy(policy_id)
        .ok_or_else(|| EngineError::not_found("policy", policy_id))?;
    if policy.farmer_id != loan.farmer_id {
        return Err(EngineError::Validation(format!(
            "policy {} does not insure farmer {}",
            policy_id, loan.farmer_id
        )));
    }
    if policy.status != PolicyStatus::Active {
        return Err(EngineError::invalid_state("policy", policy_id, policy.status, PolicyStatus::Active));
    }
    // a policy backs at most one loan
    if let Some(other) = policy.loan_id.as_deref().filter(|other| *other != loan.id) {
        return Err(EngineError::Validation(format!(
            "policy {} already secures loan {}",
            policy_id, other
        )));
    }
    if policy.crop_type != loan.crop_type {
        return Err(EngineError::Validation(format!(
            "policy {} insures {} but loan {} finances {}",
            policy_id, policy.crop_type, loan.id, loan.crop_type
        )));
    }

    policy.loan_id = Some(loan.id.clone());
    loan.insurance_policy_id = Some(policy.id.clone());
    ctx.records.put_policy(policy);
    ctx.records.put_loan(loan.clone());
    info!("Loan {} linked to policy {}", loan.id, policy_id);

    Ok(loan)
}

/// Move principal less fee from the lending pool to the borrower
pub(super) fn transfer_disbursement(ctx: &mut Context, loan: &AgriculturalLoan) -> EngineResult<DisbursementRecord> {
    let processing_fee = ctx.config.processing_fee(loan.principal);
    let disbursed_amount = loan.principal - processing_fee;

    let pool = ctx.lending_pool();
    let borrower = Account::Farmer(loan.farmer_id.clone());
    ctx.ledger.transfer(&pool, &borrower, disbursed_amount)?;

    Ok(DisbursementRecord {
        disbursed_amount,
        processing_fee,
        disbursed_on: ctx.today,
    })
}

pub(super) fn disbursed_event(loan: &AgriculturalLoan, record: &DisbursementRecord) -> EngineEvent {
    EngineEvent::LoanDisbursed {
        loan_id: loan.id.clone(),
        farmer_id: loan.farmer_id.clone(),
        disbursed_amount: record.disbursed_amount,
        processing_fee: record.processing_fee,
    }
}

/// Pay out an approved loan once its collateral and insurance conditions hold
pub fn disburse_loan(ctx: &mut Context, loan_id: &str) -> EngineResult<DisbursementOutcome> {
    let mut loan = load_loan(ctx, loan_id)?;
    require_status(&loan, LoanStatus::Approved)?;

    if !loan.collateral_satisfied() {
        let reason = format!("collateral for loan {} has not been verified", loan.id);
        info!("Disbursement blocked: {}", reason);
        return Ok(DisbursementOutcome::Blocked { reason });
    }
    if !loan.insurance_satisfied() {
        let reason = format!("loan {} requires an insurance policy", loan.id);
        info!("Disbursement blocked: {}", reason);
        return Ok(DisbursementOutcome::Blocked { reason });
    }

    let record = transfer_disbursement(ctx, &loan)?;
    loan.disbursement = Some(record.clone());
    loan.status = LoanStatus::Active;
    ctx.records.put_loan(loan.clone());
    info!(
        "Loan {} disbursed: {} to farmer, fee {}",
        loan.id, record.disbursed_amount, record.processing_fee
    );
    ctx.emit(disbursed_event(&loan, &record));

    Ok(DisbursementOutcome::Disbursed(record))
}

/// Apply a repayment to an active loan, closing it when nothing is left owing
pub fn process_repayment(ctx: &mut Context, loan_id: &str, amount: Amount) -> EngineResult<RepaymentRecord> {
    if amount == 0 {
        return Err(EngineError::Validation("repayment amount must be positive".to_string()));
    }
    let mut loan = load_loan(ctx, loan_id)?;
    require_status(&loan, LoanStatus::Active)?;

    let outstanding = loan.outstanding();
    if amount > outstanding {
        return Err(EngineError::Validation(format!(
            "repayment {} exceeds outstanding balance {}",
            amount, outstanding
        )));
    }

    let borrower = Account::Farmer(loan.farmer_id.clone());
    let pool = ctx.lending_pool();
    ctx.ledger.transfer(&borrower, &pool, amount)?;

    let repaid_before = loan.total_repaid();
    let (mut principal, mut interest) = allocate_repayment(&mut loan.schedule, repaid_before, amount);
    let outstanding_after = outstanding - amount;
    if outstanding_after == 0 {
        // final payment settles whatever principal the proportional split left
        principal = (loan.principal - loan.principal_repaid()).min(amount);
        interest = amount - principal;
        loan.status = LoanStatus::Closed;
        loan.closed_on = Some(ctx.today);
    }

    let record = RepaymentRecord {
        sequence: loan.repayments.len() as u32 + 1,
        paid_on: ctx.today,
        amount,
        principal,
        interest,
        outstanding_after,
    };
    loan.repayments.push(record.clone());
    ctx.records.put_loan(loan.clone());

    info!(
        "Repayment {} on loan {}: principal {}, interest {}, outstanding {}",
        amount, loan.id, principal, interest, outstanding_after
    );
    ctx.emit(EngineEvent::RepaymentProcessed {
        loan_id: loan.id.clone(),
        amount,
        principal,
        interest,
        outstanding: outstanding_after,
    });
    if loan.status == LoanStatus::Closed {
        info!("Loan {} closed", loan.id);
        ctx.emit(EngineEvent::LoanClosed {
            loan_id: loan.id.clone(),
            farmer_id: loan.farmer_id.clone(),
        });
    }

    Ok(record)
}

/// Record an external default decision on an active loan
pub fn mark_defaulted(ctx: &mut Context, loan_id: &str) -> EngineResult<AgriculturalLoan> {
    let mut loan = load_loan(ctx, loan_id)?;
    require_status(&loan, LoanStatus::Active)?;

    loan.status = LoanStatus::Defaulted;
    ctx.records.put_loan(loan.clone());
    let outstanding = loan.outstanding();
    warn!("Loan {} defaulted with {} outstanding", loan.id, outstanding);
    ctx.emit(EngineEvent::LoanDefaulted {
        loan_id: loan.id.clone(),
        farmer_id: loan.farmer_id.clone(),
        outstanding,
    });

    Ok(loan)
}
