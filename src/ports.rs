//! Collaborator contracts the engine consumes
//!
//! Storage, fund movement, weather data, identity and event delivery live
//! outside the engine. Operations receive them through [`crate::Context`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::EngineEvent;
use crate::model::{
    AgriculturalLoan, Amount, FarmerBasicInfo, FarmerProfile, InsuranceClaim, InsurancePolicy,
    LoanApplication, PolicyStatus, WeatherDerivative, WeatherSnapshot, DerivativeStatus,
};

/// Account on the fund ledger
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Account {
    Pool(String),
    Farmer(String),
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Pool(name) => write!(f, "pool:{}", name),
            Account::Farmer(id) => write!(f, "farmer:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient funds in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: String,
        available: Amount,
        requested: Amount,
    },

    #[error("account frozen: {0}")]
    AccountFrozen(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Atomic fund movement
pub trait FundLedger {
    /// Move `amount` from one account to another, or fail with no effect
    fn transfer(&mut self, from: &Account, to: &Account, amount: Amount) -> Result<(), LedgerError>;

    fn balance(&self, account: &Account) -> Amount;
}

/// Farmer identity and the six scoring sub-profiles
///
/// Populated by land-records, banking and weather sources; the engine only
/// reads it.
pub trait ProfileStore: Send + Sync {
    fn basic_info(&self, farmer_id: &str) -> Option<FarmerBasicInfo>;

    /// Sub-profiles for a farmer; parts with no data are absent
    fn profile(&self, farmer_id: &str) -> FarmerProfile;

    fn farmer_ids(&self) -> Vec<String>;

    fn set_basic_info(&mut self, info: FarmerBasicInfo);

    fn set_profile(&mut self, farmer_id: &str, profile: FarmerProfile);
}

/// Key-value persistence for engine records
///
/// Writes replace any existing record with the same id.
pub trait RecordStore {
    fn application(&self, id: &str) -> Option<LoanApplication>;
    fn put_application(&mut self, application: LoanApplication);

    fn loan(&self, id: &str) -> Option<AgriculturalLoan>;
    fn put_loan(&mut self, loan: AgriculturalLoan);
    fn loans(&self) -> Vec<AgriculturalLoan>;

    fn policy(&self, id: &str) -> Option<InsurancePolicy>;
    fn put_policy(&mut self, policy: InsurancePolicy);
    /// Every policy, in id order
    fn policies(&self) -> Vec<InsurancePolicy>;

    fn derivative(&self, id: &str) -> Option<WeatherDerivative>;
    fn put_derivative(&mut self, derivative: WeatherDerivative);
    /// Every derivative, in id order
    fn derivatives(&self) -> Vec<WeatherDerivative>;

    /// Next value of a named counter, starting at 1
    fn next_sequence(&mut self, name: &str) -> u64;

    fn active_policies(&self) -> Vec<InsurancePolicy> {
        self.policies()
            .into_iter()
            .filter(|p| p.status == PolicyStatus::Active)
            .collect()
    }

    fn active_derivatives(&self) -> Vec<WeatherDerivative> {
        self.derivatives()
            .into_iter()
            .filter(|d| d.status == DerivativeStatus::Active)
            .collect()
    }

    /// All claims paid to a farmer across every policy
    fn claims_for_farmer(&self, farmer_id: &str) -> Vec<InsuranceClaim> {
        self.policies()
            .into_iter()
            .filter(|p| p.farmer_id == farmer_id)
            .flat_map(|p| p.claims)
            .collect()
    }
}

/// Weather and yield observations by station
pub trait WeatherFeed {
    /// Most recent snapshot observed on or before `as_of`
    fn latest(&self, station: &str, as_of: NaiveDate) -> Option<WeatherSnapshot>;

    /// Snapshots observed within `[from, to]`, oldest first
    fn history(&self, station: &str, from: NaiveDate, to: NaiveDate) -> Vec<WeatherSnapshot>;
}

/// Observability sink; never consulted for control flow
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no identity registered for {0}")]
    UnknownSubject(String),

    #[error("credential not found: {0}")]
    UnknownCredential(String),

    #[error("credential {0} has been revoked")]
    Revoked(String),

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Verifiable credential issued to a farmer's identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    /// Resolved identity the credential is bound to
    pub subject: String,
    pub kind: String,
    pub claims: BTreeMap<String, String>,
    pub issued_on: NaiveDate,
}

/// Identity subsystem: resolve farmers, issue and verify credentials
pub trait IdentityProvider {
    fn resolve_identity(&self, farmer_id: &str) -> Result<String, IdentityError>;

    fn issue_credential(
        &mut self,
        farmer_id: &str,
        kind: &str,
        claims: BTreeMap<String, String>,
        issued_on: NaiveDate,
    ) -> Result<Credential, IdentityError>;

    /// Return the credential if it exists and has not been revoked
    fn verify_credential(&self, credential_id: &str) -> Result<Credential, IdentityError>;
}
