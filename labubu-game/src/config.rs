//! Tuning configuration for decay, billing, inflation and actions.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BASE_FEED_COST, BASE_PLAY_COST, CLEAN_HYGIENE_GAIN, EATING_DURATION_MS,
    ENERGY_DECAY_AMOUNT, ENERGY_DECAY_INTERVAL_MS, FEED_COST_INCREASE, FEED_HUNGER_GAIN,
    HAPPINESS_DECAY_AMOUNT, HAPPINESS_DECAY_INTERVAL_MS, HUNGER_DECAY_AMOUNT,
    HUNGER_DECAY_INTERVAL_MS, HYGIENE_DECAY_AMOUNT, HYGIENE_DECAY_INTERVAL_MS,
    INFLATION_INTERVAL_MS, MEDICAL_BILL_COST, MEDICAL_BILL_INTERVAL_MS,
    NOTICE_LIFETIME_MS, PERSIST_INTERVAL_MS, PLAY_COST_INCREASE, PLAY_ENERGY_COST,
    PLAY_HAPPINESS_GAIN, PLAYING_DURATION_MS, RENT_COST, RENT_INTERVAL_MS,
    SLEEPING_DURATION_MS, STARTING_MONEY, WORK_ENERGY_COST, WORK_EARNINGS,
    WORK_HAPPINESS_COST, WORK_MIN_ENERGY, WORKING_DURATION_MS,
};
use crate::state::NeedStat;

/// Errors raised when tuning invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("invalid config JSON: {0}")]
    Parse(String),
}

/// One row of the periodic decay table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayRule {
    pub interval_ms: i64,
    pub amount: i32,
}

impl DecayRule {
    #[must_use]
    pub const fn new(interval_ms: i64, amount: i32) -> Self {
        Self {
            interval_ms,
            amount,
        }
    }

    fn validate(self, field: &'static str) -> Result<(), ConfigError> {
        if self.interval_ms < 1 {
            return Err(ConfigError::MinViolation {
                field,
                min: 1,
                value: self.interval_ms,
            });
        }
        if !(0..=100).contains(&self.amount) {
            return Err(ConfigError::RangeViolation {
                field,
                min: 0,
                max: 100,
                value: i64::from(self.amount),
            });
        }
        Ok(())
    }
}

/// Per-stat decay table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayTable {
    #[serde(default = "DecayTable::default_hunger")]
    pub hunger: DecayRule,
    #[serde(default = "DecayTable::default_happiness")]
    pub happiness: DecayRule,
    #[serde(default = "DecayTable::default_hygiene")]
    pub hygiene: DecayRule,
    #[serde(default = "DecayTable::default_energy")]
    pub energy: DecayRule,
}

impl DecayTable {
    const fn default_hunger() -> DecayRule {
        DecayRule::new(HUNGER_DECAY_INTERVAL_MS, HUNGER_DECAY_AMOUNT)
    }

    const fn default_happiness() -> DecayRule {
        DecayRule::new(HAPPINESS_DECAY_INTERVAL_MS, HAPPINESS_DECAY_AMOUNT)
    }

    const fn default_hygiene() -> DecayRule {
        DecayRule::new(HYGIENE_DECAY_INTERVAL_MS, HYGIENE_DECAY_AMOUNT)
    }

    const fn default_energy() -> DecayRule {
        DecayRule::new(ENERGY_DECAY_INTERVAL_MS, ENERGY_DECAY_AMOUNT)
    }

    /// Rule for a given need-stat.
    #[must_use]
    pub const fn rule(&self, stat: NeedStat) -> DecayRule {
        match stat {
            NeedStat::Hunger => self.hunger,
            NeedStat::Happiness => self.happiness,
            NeedStat::Hygiene => self.hygiene,
            NeedStat::Energy => self.energy,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.hunger.validate("decay.hunger")?;
        self.happiness.validate("decay.happiness")?;
        self.hygiene.validate("decay.hygiene")?;
        self.energy.validate("decay.energy")?;
        Ok(())
    }
}

impl Default for DecayTable {
    fn default() -> Self {
        Self {
            hunger: Self::default_hunger(),
            happiness: Self::default_happiness(),
            hygiene: Self::default_hygiene(),
            energy: Self::default_energy(),
        }
    }
}

/// A recurring bill charged every whole interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRule {
    pub interval_ms: i64,
    pub cost: i64,
}

impl BillRule {
    #[must_use]
    pub const fn new(interval_ms: i64, cost: i64) -> Self {
        Self { interval_ms, cost }
    }

    fn validate(self, field: &'static str) -> Result<(), ConfigError> {
        if self.interval_ms < 1 {
            return Err(ConfigError::MinViolation {
                field,
                min: 1,
                value: self.interval_ms,
            });
        }
        if self.cost < 0 {
            return Err(ConfigError::MinViolation {
                field,
                min: 0,
                value: self.cost,
            });
        }
        Ok(())
    }
}

/// Price inflation applied at epoch-aligned boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationRule {
    #[serde(default = "InflationRule::default_interval_ms")]
    pub interval_ms: i64,
    #[serde(default = "InflationRule::default_feed_increase")]
    pub feed_increase: i64,
    #[serde(default = "InflationRule::default_play_increase")]
    pub play_increase: i64,
}

impl InflationRule {
    const fn default_interval_ms() -> i64 {
        INFLATION_INTERVAL_MS
    }

    const fn default_feed_increase() -> i64 {
        FEED_COST_INCREASE
    }

    const fn default_play_increase() -> i64 {
        PLAY_COST_INCREASE
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms < 1 {
            return Err(ConfigError::MinViolation {
                field: "inflation.interval_ms",
                min: 1,
                value: self.interval_ms,
            });
        }
        if self.feed_increase < 0 {
            return Err(ConfigError::MinViolation {
                field: "inflation.feed_increase",
                min: 0,
                value: self.feed_increase,
            });
        }
        if self.play_increase < 0 {
            return Err(ConfigError::MinViolation {
                field: "inflation.play_increase",
                min: 0,
                value: self.play_increase,
            });
        }
        Ok(())
    }
}

impl Default for InflationRule {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            feed_increase: Self::default_feed_increase(),
            play_increase: Self::default_play_increase(),
        }
    }
}

/// Action amounts and display durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTuning {
    #[serde(default = "ActionTuning::default_feed_hunger_gain")]
    pub feed_hunger_gain: i32,
    #[serde(default = "ActionTuning::default_play_happiness_gain")]
    pub play_happiness_gain: i32,
    #[serde(default = "ActionTuning::default_play_energy_cost")]
    pub play_energy_cost: i32,
    #[serde(default = "ActionTuning::default_clean_hygiene_gain")]
    pub clean_hygiene_gain: i32,
    #[serde(default = "ActionTuning::default_work_earnings")]
    pub work_earnings: i64,
    #[serde(default = "ActionTuning::default_work_energy_cost")]
    pub work_energy_cost: i32,
    #[serde(default = "ActionTuning::default_work_happiness_cost")]
    pub work_happiness_cost: i32,
    #[serde(default = "ActionTuning::default_work_min_energy")]
    pub work_min_energy: i32,
    #[serde(default = "ActionTuning::default_eating_ms")]
    pub eating_ms: i64,
    #[serde(default = "ActionTuning::default_playing_ms")]
    pub playing_ms: i64,
    #[serde(default = "ActionTuning::default_sleeping_ms")]
    pub sleeping_ms: i64,
    #[serde(default = "ActionTuning::default_working_ms")]
    pub working_ms: i64,
}

impl ActionTuning {
    const fn default_feed_hunger_gain() -> i32 {
        FEED_HUNGER_GAIN
    }
    const fn default_play_happiness_gain() -> i32 {
        PLAY_HAPPINESS_GAIN
    }
    const fn default_play_energy_cost() -> i32 {
        PLAY_ENERGY_COST
    }
    const fn default_clean_hygiene_gain() -> i32 {
        CLEAN_HYGIENE_GAIN
    }
    const fn default_work_earnings() -> i64 {
        WORK_EARNINGS
    }
    const fn default_work_energy_cost() -> i32 {
        WORK_ENERGY_COST
    }
    const fn default_work_happiness_cost() -> i32 {
        WORK_HAPPINESS_COST
    }
    const fn default_work_min_energy() -> i32 {
        WORK_MIN_ENERGY
    }
    const fn default_eating_ms() -> i64 {
        EATING_DURATION_MS
    }
    const fn default_playing_ms() -> i64 {
        PLAYING_DURATION_MS
    }
    const fn default_sleeping_ms() -> i64 {
        SLEEPING_DURATION_MS
    }
    const fn default_working_ms() -> i64 {
        WORKING_DURATION_MS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let gains = [
            ("actions.feed_hunger_gain", self.feed_hunger_gain),
            ("actions.play_happiness_gain", self.play_happiness_gain),
            ("actions.play_energy_cost", self.play_energy_cost),
            ("actions.clean_hygiene_gain", self.clean_hygiene_gain),
            ("actions.work_energy_cost", self.work_energy_cost),
            ("actions.work_happiness_cost", self.work_happiness_cost),
            ("actions.work_min_energy", self.work_min_energy),
        ];
        for (field, value) in gains {
            if !(0..=100).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field,
                    min: 0,
                    max: 100,
                    value: i64::from(value),
                });
            }
        }
        if self.work_earnings < 0 {
            return Err(ConfigError::MinViolation {
                field: "actions.work_earnings",
                min: 0,
                value: self.work_earnings,
            });
        }
        let durations = [
            ("actions.eating_ms", self.eating_ms),
            ("actions.playing_ms", self.playing_ms),
            ("actions.sleeping_ms", self.sleeping_ms),
            ("actions.working_ms", self.working_ms),
        ];
        for (field, value) in durations {
            if value < 1 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for ActionTuning {
    fn default() -> Self {
        Self {
            feed_hunger_gain: Self::default_feed_hunger_gain(),
            play_happiness_gain: Self::default_play_happiness_gain(),
            play_energy_cost: Self::default_play_energy_cost(),
            clean_hygiene_gain: Self::default_clean_hygiene_gain(),
            work_earnings: Self::default_work_earnings(),
            work_energy_cost: Self::default_work_energy_cost(),
            work_happiness_cost: Self::default_work_happiness_cost(),
            work_min_energy: Self::default_work_min_energy(),
            eating_ms: Self::default_eating_ms(),
            playing_ms: Self::default_playing_ms(),
            sleeping_ms: Self::default_sleeping_ms(),
            working_ms: Self::default_working_ms(),
        }
    }
}

/// Complete progression tuning. Every field has a default so partial JSON
/// documents only need to name what they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub decay: DecayTable,
    #[serde(default = "ProgressionConfig::default_rent")]
    pub rent: BillRule,
    #[serde(default = "ProgressionConfig::default_medical_bill")]
    pub medical_bill: BillRule,
    #[serde(default)]
    pub inflation: InflationRule,
    #[serde(default)]
    pub actions: ActionTuning,
    #[serde(default = "ProgressionConfig::default_starting_money")]
    pub starting_money: i64,
    #[serde(default = "ProgressionConfig::default_base_feed_cost")]
    pub base_feed_cost: i64,
    #[serde(default = "ProgressionConfig::default_base_play_cost")]
    pub base_play_cost: i64,
    #[serde(default = "ProgressionConfig::default_persist_interval_ms")]
    pub persist_interval_ms: i64,
    #[serde(default = "ProgressionConfig::default_notice_lifetime_ms")]
    pub notice_lifetime_ms: i64,
}

impl ProgressionConfig {
    #[must_use]
    pub const fn default_rent() -> BillRule {
        BillRule::new(RENT_INTERVAL_MS, RENT_COST)
    }

    #[must_use]
    pub const fn default_medical_bill() -> BillRule {
        BillRule::new(MEDICAL_BILL_INTERVAL_MS, MEDICAL_BILL_COST)
    }

    #[must_use]
    pub const fn default_starting_money() -> i64 {
        STARTING_MONEY
    }

    #[must_use]
    pub const fn default_base_feed_cost() -> i64 {
        BASE_FEED_COST
    }

    #[must_use]
    pub const fn default_base_play_cost() -> i64 {
        BASE_PLAY_COST
    }

    #[must_use]
    pub const fn default_persist_interval_ms() -> i64 {
        PERSIST_INTERVAL_MS
    }

    #[must_use]
    pub const fn default_notice_lifetime_ms() -> i64 {
        NOTICE_LIFETIME_MS
    }

    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and a range/min
    /// violation when a field breaks the documented bounds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decay.validate()?;
        self.rent.validate("rent")?;
        self.medical_bill.validate("medical_bill")?;
        self.inflation.validate()?;
        self.actions.validate()?;
        if self.base_feed_cost < 0 {
            return Err(ConfigError::MinViolation {
                field: "base_feed_cost",
                min: 0,
                value: self.base_feed_cost,
            });
        }
        if self.base_play_cost < 0 {
            return Err(ConfigError::MinViolation {
                field: "base_play_cost",
                min: 0,
                value: self.base_play_cost,
            });
        }
        if self.persist_interval_ms < 1 {
            return Err(ConfigError::MinViolation {
                field: "persist_interval_ms",
                min: 1,
                value: self.persist_interval_ms,
            });
        }
        if self.notice_lifetime_ms < 0 {
            return Err(ConfigError::MinViolation {
                field: "notice_lifetime_ms",
                min: 0,
                value: self.notice_lifetime_ms,
            });
        }
        Ok(())
    }

    /// Feed cost at a given inflation level.
    #[must_use]
    pub const fn feed_cost_at(&self, inflation_level: i64) -> i64 {
        self.base_feed_cost
            .saturating_add(inflation_level.saturating_mul(self.inflation.feed_increase))
    }

    /// Play cost at a given inflation level.
    #[must_use]
    pub const fn play_cost_at(&self, inflation_level: i64) -> i64 {
        self.base_play_cost
            .saturating_add(inflation_level.saturating_mul(self.inflation.play_increase))
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            decay: DecayTable::default(),
            rent: Self::default_rent(),
            medical_bill: Self::default_medical_bill(),
            inflation: InflationRule::default(),
            actions: ActionTuning::default(),
            starting_money: Self::default_starting_money(),
            base_feed_cost: Self::default_base_feed_cost(),
            base_play_cost: Self::default_base_play_cost(),
            persist_interval_ms: Self::default_persist_interval_ms(),
            notice_lifetime_ms: Self::default_notice_lifetime_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ProgressionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ProgressionConfig::from_json(r#"{"rent": {"interval_ms": 1000, "cost": 3}}"#)
            .expect("partial config parses");
        assert_eq!(cfg.rent, BillRule::new(1_000, 3));
        assert_eq!(cfg.decay, DecayTable::default());
        assert_eq!(cfg.base_feed_cost, BASE_FEED_COST);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = ProgressionConfig::from_json(
            r#"{"decay": {"hunger": {"interval_ms": 0, "amount": 5}}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MinViolation {
                field: "decay.hunger",
                min: 1,
                value: 0,
            }
        );
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = ProgressionConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn costs_are_linear_in_inflation_level() {
        let cfg = ProgressionConfig::default();
        assert_eq!(cfg.feed_cost_at(0), BASE_FEED_COST);
        assert_eq!(cfg.feed_cost_at(3), BASE_FEED_COST + 3 * FEED_COST_INCREASE);
        assert_eq!(cfg.play_cost_at(4), BASE_PLAY_COST + 4 * PLAY_COST_INCREASE);
    }
}
