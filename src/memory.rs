//! In-memory collaborator implementations
//!
//! Used by the binaries and tests. Everything here serializes with serde so
//! a whole engine state can be saved and reloaded as JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::events::EngineEvent;
use crate::model::{
    load_weather_snapshots, AgriculturalLoan, Amount, FarmerBasicInfo, FarmerProfile,
    InsurancePolicy, LoanApplication, WeatherDerivative, WeatherSnapshot,
};
use crate::ports::{
    Account, Credential, EventSink, FundLedger, IdentityError, IdentityProvider, LedgerError,
    ProfileStore, RecordStore, WeatherFeed,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryProfiles {
    basics: BTreeMap<String, FarmerBasicInfo>,
    profiles: BTreeMap<String, FarmerProfile>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a farmer with their sub-profiles
    pub fn insert(&mut self, info: FarmerBasicInfo, profile: FarmerProfile) {
        let farmer_id = info.farmer_id.clone();
        self.basics.insert(farmer_id.clone(), info);
        self.profiles.insert(farmer_id, profile);
    }
}

impl ProfileStore for InMemoryProfiles {
    fn basic_info(&self, farmer_id: &str) -> Option<FarmerBasicInfo> {
        self.basics.get(farmer_id).cloned()
    }

    fn profile(&self, farmer_id: &str) -> FarmerProfile {
        self.profiles.get(farmer_id).cloned().unwrap_or_default()
    }

    fn farmer_ids(&self) -> Vec<String> {
        self.basics.keys().cloned().collect()
    }

    fn set_basic_info(&mut self, info: FarmerBasicInfo) {
        self.basics.insert(info.farmer_id.clone(), info);
    }

    fn set_profile(&mut self, farmer_id: &str, profile: FarmerProfile) {
        self.profiles.insert(farmer_id.to_string(), profile);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryRecords {
    applications: BTreeMap<String, LoanApplication>,
    loans: BTreeMap<String, AgriculturalLoan>,
    policies: BTreeMap<String, InsurancePolicy>,
    derivatives: BTreeMap<String, WeatherDerivative>,
    sequences: BTreeMap<String, u64>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecords {
    fn application(&self, id: &str) -> Option<LoanApplication> {
        self.applications.get(id).cloned()
    }

    fn put_application(&mut self, application: LoanApplication) {
        self.applications.insert(application.id.clone(), application);
    }

    fn loan(&self, id: &str) -> Option<AgriculturalLoan> {
        self.loans.get(id).cloned()
    }

    fn put_loan(&mut self, loan: AgriculturalLoan) {
        self.loans.insert(loan.id.clone(), loan);
    }

    fn loans(&self) -> Vec<AgriculturalLoan> {
        self.loans.values().cloned().collect()
    }

    fn policy(&self, id: &str) -> Option<InsurancePolicy> {
        self.policies.get(id).cloned()
    }

    fn put_policy(&mut self, policy: InsurancePolicy) {
        self.policies.insert(policy.id.clone(), policy);
    }

    fn policies(&self) -> Vec<InsurancePolicy> {
        self.policies.values().cloned().collect()
    }

    fn derivative(&self, id: &str) -> Option<WeatherDerivative> {
        self.derivatives.get(id).cloned()
    }

    fn put_derivative(&mut self, derivative: WeatherDerivative) {
        self.derivatives.insert(derivative.id.clone(), derivative);
    }

    fn derivatives(&self) -> Vec<WeatherDerivative> {
        self.derivatives.values().cloned().collect()
    }

    fn next_sequence(&mut self, name: &str) -> u64 {
        let counter = self.sequences.entry(name.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Balances keyed by account display name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<String, Amount>,
    #[serde(default)]
    frozen: BTreeSet<String>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint funds into an account
    pub fn deposit(&mut self, account: &Account, amount: Amount) {
        *self.balances.entry(account.to_string()).or_insert(0) += amount;
    }

    /// Refuse all transfers touching this account
    pub fn freeze(&mut self, account: &Account) {
        self.frozen.insert(account.to_string());
    }

    pub fn unfreeze(&mut self, account: &Account) {
        self.frozen.remove(&account.to_string());
    }
}

impl FundLedger for InMemoryLedger {
    fn transfer(&mut self, from: &Account, to: &Account, amount: Amount) -> Result<(), LedgerError> {
        let from_key = from.to_string();
        let to_key = to.to_string();

        for key in [&from_key, &to_key] {
            if self.frozen.contains(key) {
                return Err(LedgerError::AccountFrozen(key.clone()));
            }
        }

        let available = self.balances.get(&from_key).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from_key,
                available,
                requested: amount,
            });
        }

        self.balances.insert(from_key, available - amount);
        *self.balances.entry(to_key).or_insert(0) += amount;
        Ok(())
    }

    fn balance(&self, account: &Account) -> Amount {
        self.balances.get(&account.to_string()).copied().unwrap_or(0)
    }
}

/// Snapshots per station, kept in observation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryWeatherFeed {
    stations: BTreeMap<String, Vec<WeatherSnapshot>>,
}

impl InMemoryWeatherFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: impl IntoIterator<Item = WeatherSnapshot>) -> Self {
        let mut feed = Self::new();
        for snapshot in snapshots {
            feed.insert(snapshot);
        }
        feed
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Ok(Self::from_snapshots(load_weather_snapshots(path)?))
    }

    /// Add a snapshot, replacing any earlier one for the same station and date
    pub fn insert(&mut self, snapshot: WeatherSnapshot) {
        let series = self.stations.entry(snapshot.station.clone()).or_default();
        match series.binary_search_by_key(&snapshot.observed_on, |s| s.observed_on) {
            Ok(pos) => series[pos] = snapshot,
            Err(pos) => series.insert(pos, snapshot),
        }
    }
}

impl WeatherFeed for InMemoryWeatherFeed {
    fn latest(&self, station: &str, as_of: NaiveDate) -> Option<WeatherSnapshot> {
        self.stations
            .get(station)?
            .iter()
            .rev()
            .find(|s| s.observed_on <= as_of)
            .cloned()
    }

    fn history(&self, station: &str, from: NaiveDate, to: NaiveDate) -> Vec<WeatherSnapshot> {
        self.stations
            .get(station)
            .map(|series| {
                series
                    .iter()
                    .filter(|s| s.observed_on >= from && s.observed_on <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Keeps every emitted event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingEventSink {
    pub events: Vec<EngineEvent>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.name()).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryIdentity {
    identities: BTreeMap<String, String>,
    credentials: BTreeMap<String, Credential>,
    revoked: BTreeSet<String>,
    issued: u64,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, farmer_id: &str, identity: &str) {
        self.identities.insert(farmer_id.to_string(), identity.to_string());
    }

    pub fn revoke(&mut self, credential_id: &str) {
        self.revoked.insert(credential_id.to_string());
    }
}

impl IdentityProvider for InMemoryIdentity {
    fn resolve_identity(&self, farmer_id: &str) -> Result<String, IdentityError> {
        self.identities
            .get(farmer_id)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownSubject(farmer_id.to_string()))
    }

    fn issue_credential(
        &mut self,
        farmer_id: &str,
        kind: &str,
        claims: BTreeMap<String, String>,
        issued_on: NaiveDate,
    ) -> Result<Credential, IdentityError> {
        let subject = self.resolve_identity(farmer_id)?;
        self.issued += 1;
        let credential = Credential {
            id: format!("VC-{}-{}", kind, self.issued),
            subject,
            kind: kind.to_string(),
            claims,
            issued_on,
        };
        self.credentials.insert(credential.id.clone(), credential.clone());
        Ok(credential)
    }

    fn verify_credential(&self, credential_id: &str) -> Result<Credential, IdentityError> {
        if self.revoked.contains(credential_id) {
            return Err(IdentityError::Revoked(credential_id.to_string()));
        }
        self.credentials
            .get(credential_id)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownCredential(credential_id.to_string()))
    }
}

/// Persisted collaborator state for the operational binaries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default)]
    pub profiles: InMemoryProfiles,
    #[serde(default)]
    pub records: InMemoryRecords,
    #[serde(default)]
    pub ledger: InMemoryLedger,
    #[serde(default)]
    pub identity: InMemoryIdentity,
}

impl EngineState {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save_json_path<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(station: &str, y: i32, m: u32, d: u32, rain: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            station: station.to_string(),
            observed_on: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            cumulative_rainfall: rain,
            max_temperature: 35.0,
            consecutive_dry_days: 0,
            humidity: None,
            yield_per_area: None,
        }
    }

    #[test]
    fn test_transfer_moves_funds() {
        let pool = Account::Pool("lending".to_string());
        let farmer = Account::Farmer("F1".to_string());
        let mut ledger = InMemoryLedger::new();
        ledger.deposit(&pool, 1_000);

        ledger.transfer(&pool, &farmer, 400).unwrap();

        assert_eq!(ledger.balance(&pool), 600);
        assert_eq!(ledger.balance(&farmer), 400);
    }

    #[test]
    fn test_failed_transfer_has_no_effect() {
        let pool = Account::Pool("lending".to_string());
        let farmer = Account::Farmer("F1".to_string());
        let mut ledger = InMemoryLedger::new();
        ledger.deposit(&pool, 100);

        let err = ledger.transfer(&pool, &farmer, 400).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { available: 100, requested: 400, .. }));

        ledger.freeze(&farmer);
        assert!(matches!(
            ledger.transfer(&pool, &farmer, 50),
            Err(LedgerError::AccountFrozen(_))
        ));
        assert_eq!(ledger.balance(&pool), 100);
        assert_eq!(ledger.balance(&farmer), 0);
    }

    #[test]
    fn test_weather_feed_latest_as_of() {
        let feed = InMemoryWeatherFeed::from_snapshots(vec![
            snapshot("S1", 2024, 8, 1, 300.0),
            snapshot("S1", 2024, 7, 1, 100.0),
            snapshot("S1", 2024, 9, 1, 450.0),
        ]);
        let as_of = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();

        assert_eq!(feed.latest("S1", as_of).unwrap().cumulative_rainfall, 300.0);
        assert!(feed.latest("S1", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).is_none());
        assert!(feed.latest("S2", as_of).is_none());

        let from = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let history = feed.history("S1", from, as_of);
        assert_eq!(history.len(), 2);
        assert!(history[0].observed_on < history[1].observed_on);
    }

    #[test]
    fn test_sequences_are_per_name() {
        let mut records = InMemoryRecords::new();
        assert_eq!(records.next_sequence("APP"), 1);
        assert_eq!(records.next_sequence("APP"), 2);
        assert_eq!(records.next_sequence("POL"), 1);
    }

    #[test]
    fn test_identity_credentials() {
        let mut identity = InMemoryIdentity::new();
        identity.register("F1", "did:krishi:F1");
        let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let credential = identity.issue_credential("F1", "LAND_TITLE", BTreeMap::new(), on).unwrap();
        assert_eq!(credential.subject, "did:krishi:F1");
        assert_eq!(identity.verify_credential(&credential.id).unwrap(), credential);

        identity.revoke(&credential.id);
        assert!(matches!(
            identity.verify_credential(&credential.id),
            Err(IdentityError::Revoked(_))
        ));
        assert!(identity.issue_credential("F9", "LAND_TITLE", BTreeMap::new(), on).is_err());
    }

    #[test]
    fn test_engine_state_json_round_trip() {
        let mut state = EngineState::default();
        state.ledger.deposit(&Account::Pool("insurance".to_string()), 5_000);
        let json = serde_json::to_string(&state).unwrap();
        let restored: EngineState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.ledger.balance(&Account::Pool("insurance".to_string())), 5_000);
    }
}
