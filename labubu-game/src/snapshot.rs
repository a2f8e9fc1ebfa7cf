//! Persisted snapshot load/merge and serialization.
//!
//! Snapshots written by older builds may miss fields or carry the wrong types
//! (e.g. `money` stored as a string). Loading never fails: every field falls
//! back to a typed default and the result is re-clamped.

use serde_json::{Map, Value};

use crate::config::ProgressionConfig;
use crate::numbers::{f64_to_i64, saturate_i64_to_i32};
use crate::state::PetState;

fn read_int(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().and_then(f64_to_i64))
}

/// Merge a parsed JSON value over the defaults for `now_ms`.
#[must_use]
pub fn merge_value(value: &Value, now_ms: i64, cfg: &ProgressionConfig) -> PetState {
    let defaults = PetState::new(now_ms, cfg);
    let Some(fields) = value.as_object() else {
        log::warn!("snapshot is not an object; starting a new game");
        return defaults;
    };

    let stat = |key: &str, fallback: i32| {
        read_int(fields, key).map_or(fallback, saturate_i64_to_i32)
    };
    let int = |key: &str, fallback: i64| read_int(fields, key).unwrap_or(fallback);

    let mut state = PetState {
        hunger: stat("hunger", defaults.hunger),
        happiness: stat("happiness", defaults.happiness),
        hygiene: stat("hygiene", defaults.hygiene),
        energy: stat("energy", defaults.energy),
        money: int("money", defaults.money),
        last_updated: int("lastUpdated", defaults.last_updated),
        last_rent_paid: int("lastRentPaid", defaults.last_rent_paid),
        last_medical_bill_paid: int("lastMedicalBillPaid", defaults.last_medical_bill_paid),
        inflation_level: int("inflationLevel", defaults.inflation_level),
        feed_cost: defaults.feed_cost,
        play_cost: defaults.play_cost,
    };
    state.clamp();
    state.recompute_costs(cfg);

    let stored_feed = read_int(fields, "feedCost");
    let stored_play = read_int(fields, "playCost");
    if stored_feed.is_some_and(|cost| cost != state.feed_cost)
        || stored_play.is_some_and(|cost| cost != state.play_cost)
    {
        log::warn!(
            "snapshot costs disagree with inflation level {}; recomputed",
            state.inflation_level
        );
    }
    state
}

/// Build a complete state from raw persisted text. Absent, malformed or
/// partial snapshots are repaired rather than rejected.
#[must_use]
pub fn load_state(raw: Option<&str>, now_ms: i64, cfg: &ProgressionConfig) -> PetState {
    let Some(raw) = raw else {
        log::info!("no saved pet found; starting a new game");
        return PetState::new(now_ms, cfg);
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => merge_value(&value, now_ms, cfg),
        Err(err) => {
            log::warn!("discarding unreadable snapshot: {err}");
            PetState::new(now_ms, cfg)
        }
    }
}

/// Serialize to the flat persisted record.
#[must_use]
pub fn serialize(state: &PetState) -> String {
    // A struct of plain integers cannot fail to serialize.
    serde_json::to_string(state).unwrap_or_default()
}
