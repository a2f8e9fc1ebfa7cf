//! Labubu Game Engine
//!
//! Platform-agnostic state progression for the Labubu virtual pet: need-stat
//! decay, billing, inflation, user actions, offline catch-up and the live
//! session driver. No UI or platform-specific dependencies.

pub mod actions;
pub mod config;
pub mod constants;
pub mod numbers;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod tasks;
pub mod visual;

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

// Re-export commonly used types
pub use actions::{Action, ActionOutcome, ActionTimers, Rejection, complete_sleep};
pub use config::{
    ActionTuning, BillRule, ConfigError, DecayRule, DecayTable, InflationRule, ProgressionConfig,
};
pub use constants::SAVE_KEY;
pub use schedule::{BillKind, CatchUpReport, Metric, ProgressionEvent, settle};
pub use session::{Clock, ManualClock, Notice, PetSession, SessionError, SystemClock};
pub use state::{CollapseCause, NeedStat, PetState, Phase};
pub use tasks::{
    FireOutcome, ManualScheduler, ScheduledTask, TaskHandle, TaskKind, TaskScheduler, fire,
    live_schedule,
};
pub use visual::{StatLevel, VisualState, stat_level, visual_state};

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait PetStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `raw` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn write(&self, key: &str, raw: &str) -> Result<(), Self::Error>;

    /// Delete the snapshot under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the delete.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.saves.borrow().get(key).cloned()
    }
}

impl PetStorage for MemoryStorage {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), Self::Error> {
        self.saves
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.saves.borrow_mut().remove(key);
        Ok(())
    }
}

/// Fresh pet at `now_ms` with the given tuning.
#[must_use]
pub fn new_state(now_ms: i64, cfg: &ProgressionConfig) -> PetState {
    PetState::new(now_ms, cfg)
}

/// Complete state from an optional raw snapshot. Never fails.
#[must_use]
pub fn load_state(raw: Option<&str>, now_ms: i64, cfg: &ProgressionConfig) -> PetState {
    snapshot::load_state(raw, now_ms, cfg)
}

/// One-shot offline catch-up to `now_ms`.
pub fn catch_up(state: &mut PetState, now_ms: i64, cfg: &ProgressionConfig) -> CatchUpReport {
    schedule::catch_up(state, now_ms, cfg)
}

/// One live timer fire for `metric`.
pub fn tick(
    state: &mut PetState,
    metric: Metric,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    schedule::tick(state, metric, now_ms, cfg)
}

/// Apply a user action if its preconditions hold.
pub fn apply_action(
    state: &mut PetState,
    timers: &mut ActionTimers,
    action: Action,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> ActionOutcome {
    actions::apply_action(state, timers, action, now_ms, cfg)
}

#[must_use]
pub fn is_game_over(state: &PetState) -> bool {
    state::is_game_over(state)
}

#[must_use]
pub fn serialize(state: &PetState) -> String {
    snapshot::serialize(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn memory_storage_round_trips_snapshot() {
        let cfg = ProgressionConfig::default();
        let storage = MemoryStorage::default();
        let mut state = new_state(T0, &cfg);
        state.money = 12;
        storage.write(SAVE_KEY, &serialize(&state)).unwrap();

        let raw = storage.read(SAVE_KEY).unwrap();
        assert_eq!(load_state(raw.as_deref(), T0, &cfg), state);

        storage.remove(SAVE_KEY).unwrap();
        assert!(storage.read(SAVE_KEY).unwrap().is_none());
        storage.remove(SAVE_KEY).unwrap();
    }

    #[test]
    fn boundary_functions_share_one_state() {
        let cfg = ProgressionConfig::default();
        let mut state = load_state(None, T0, &cfg);
        let mut timers = ActionTimers::default();
        assert!(apply_action(&mut state, &mut timers, Action::Feed, T0, &cfg).is_applied());
        tick(&mut state, Metric::Need(NeedStat::Hunger), T0 + 10_000, &cfg);
        assert_eq!(state.hunger, 95);
        let report = catch_up(&mut state, T0 + 60_000, &cfg);
        assert_eq!(report.cycles(Metric::Bill(BillKind::Rent)), 1);
        assert_eq!(state.money, 25);
        assert!(!is_game_over(&state));
    }
}
