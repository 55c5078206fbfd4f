//! Credit scoring, loan eligibility and pricing

pub mod components;
mod eligibility;
mod engine;

pub use eligibility::{
    assess_eligibility, discounted_rate, max_loan_eligibility, recommendations, recommended_rate,
    EligibilityAssessment,
};
pub use engine::{CreditScorer, FarmerCreditProfile, SubScores, MAX_CREDIT_SCORE};
