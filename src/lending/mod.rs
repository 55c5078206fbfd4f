//! Agricultural loan origination and servicing

mod collateral;
mod lifecycle;
mod schedule;
mod servicing;

pub use collateral::{approval_conditions, collateral_requirement, insurance_required};
pub use lifecycle::{
    process_agricultural_loan, process_application, submit_application, ApplicationOutcome,
    LoanRequest, Rejection, LOAN_CREDENTIAL_KIND,
};
pub use schedule::{allocate_repayment, build_schedule, select_tenure};
pub use servicing::{
    disburse_loan, link_insurance_policy, mark_defaulted, process_repayment, verify_collateral,
    DisbursementOutcome,
};
