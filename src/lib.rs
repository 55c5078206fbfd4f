//! Krishi Underwriting - credit and parametric insurance engine for smallholder farmers
//!
//! This library provides:
//! - Six-factor credit scoring with eligibility and rate pricing
//! - Loan origination, collateral and insurance conditions, disbursement and repayment
//! - Parametric crop insurance with weather and yield triggers
//! - Weather index derivatives
//! - Pluggable collaborators (ledger, records, identity, weather) with in-memory implementations

pub mod config;
pub mod context;
pub mod crops;
pub mod error;
pub mod events;
pub mod insurance;
pub mod lending;
pub mod memory;
pub mod model;
pub mod ports;
pub mod scoring;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::EngineConfig;
pub use context::Context;
pub use crops::CropCatalog;
pub use error::{EngineError, EngineResult};
pub use events::EngineEvent;
pub use insurance::{create_derivative, create_policy, pay_premium, run_epoch, EpochReport};
pub use lending::{
    disburse_loan, process_agricultural_loan, process_application, process_repayment,
    submit_application, verify_collateral,
};
pub use memory::EngineState;
pub use scoring::{CreditScorer, FarmerCreditProfile};
