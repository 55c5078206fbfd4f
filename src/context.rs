//! Per-call operation context

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::crops::CropCatalog;
use crate::events::EngineEvent;
use crate::memory::EngineState;
use crate::ports::{Account, EventSink, FundLedger, IdentityProvider, ProfileStore, RecordStore, WeatherFeed};

/// Configuration, collaborators and clock for one engine operation
///
/// Operations read every parameter and collaborator from here; the engine
/// holds no state of its own between calls.
pub struct Context<'a> {
    pub config: &'a EngineConfig,
    pub crops: &'a CropCatalog,
    pub profiles: &'a dyn ProfileStore,
    pub records: &'a mut dyn RecordStore,
    pub ledger: &'a mut dyn FundLedger,
    pub weather: &'a dyn WeatherFeed,
    pub identity: &'a mut dyn IdentityProvider,
    pub events: &'a mut dyn EventSink,
    /// Processing date of the operation
    pub today: NaiveDate,
}

impl<'a> Context<'a> {
    /// Borrow every stateful collaborator from a persisted engine state
    pub fn from_state(
        state: &'a mut EngineState,
        config: &'a EngineConfig,
        crops: &'a CropCatalog,
        weather: &'a dyn WeatherFeed,
        events: &'a mut dyn EventSink,
        today: NaiveDate,
    ) -> Self {
        Self {
            config,
            crops,
            profiles: &state.profiles,
            records: &mut state.records,
            ledger: &mut state.ledger,
            weather,
            identity: &mut state.identity,
            events,
            today,
        }
    }

    pub fn lending_pool(&self) -> Account {
        Account::Pool(self.config.lending_pool.clone())
    }

    pub fn insurance_pool(&self) -> Account {
        Account::Pool(self.config.insurance_pool.clone())
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.emit(event);
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = EngineEvent>) {
        for event in events {
            self.events.emit(event);
        }
    }
}
