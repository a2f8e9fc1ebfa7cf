use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ProgressionConfig;
use crate::constants::{STAT_MAX, STAT_MIN};
use crate::numbers::clamp_stat;

/// One of the four decaying needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedStat {
    Hunger,
    Happiness,
    Hygiene,
    Energy,
}

impl NeedStat {
    pub const ALL: [Self; 4] = [Self::Hunger, Self::Happiness, Self::Hygiene, Self::Energy];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hunger => "hunger",
            Self::Happiness => "happiness",
            Self::Hygiene => "hygiene",
            Self::Energy => "energy",
        }
    }
}

impl fmt::Display for NeedStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NeedStat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hunger" => Ok(Self::Hunger),
            "happiness" => Ok(Self::Happiness),
            "hygiene" => Ok(Self::Hygiene),
            "energy" => Ok(Self::Energy),
            _ => Err(()),
        }
    }
}

/// Alive or terminal. Derived from [`PetState`], never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Alive,
    GameOver,
}

/// Authoritative record of the pet's condition, economy and bookkeeping
/// timestamps. Serializes to the flat persisted snapshot shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetState {
    pub hunger: i32,
    pub happiness: i32,
    pub hygiene: i32,
    pub energy: i32,
    pub money: i64,
    pub last_updated: i64,
    pub last_rent_paid: i64,
    pub last_medical_bill_paid: i64,
    pub inflation_level: i64,
    pub feed_cost: i64,
    pub play_cost: i64,
}

impl PetState {
    /// Fresh pet: full stats, starting money, base costs, every clock at `now_ms`.
    #[must_use]
    pub fn new(now_ms: i64, cfg: &ProgressionConfig) -> Self {
        Self {
            hunger: STAT_MAX,
            happiness: STAT_MAX,
            hygiene: STAT_MAX,
            energy: STAT_MAX,
            money: cfg.starting_money,
            last_updated: now_ms,
            last_rent_paid: now_ms,
            last_medical_bill_paid: now_ms,
            inflation_level: 0,
            feed_cost: cfg.base_feed_cost,
            play_cost: cfg.base_play_cost,
        }
    }

    #[must_use]
    pub const fn stat(&self, stat: NeedStat) -> i32 {
        match stat {
            NeedStat::Hunger => self.hunger,
            NeedStat::Happiness => self.happiness,
            NeedStat::Hygiene => self.hygiene,
            NeedStat::Energy => self.energy,
        }
    }

    const fn stat_mut(&mut self, stat: NeedStat) -> &mut i32 {
        match stat {
            NeedStat::Hunger => &mut self.hunger,
            NeedStat::Happiness => &mut self.happiness,
            NeedStat::Hygiene => &mut self.hygiene,
            NeedStat::Energy => &mut self.energy,
        }
    }

    /// Shift a need-stat by `delta`, clamped to `[0, 100]`.
    pub fn adjust(&mut self, stat: NeedStat, delta: i64) {
        let slot = self.stat_mut(stat);
        *slot = clamp_stat(*slot, delta, STAT_MIN, STAT_MAX);
    }

    /// Overwrite a need-stat, clamped to `[0, 100]`.
    pub fn set_stat(&mut self, stat: NeedStat, value: i32) {
        *self.stat_mut(stat) = value.clamp(STAT_MIN, STAT_MAX);
    }

    pub fn clamp(&mut self) {
        for stat in NeedStat::ALL {
            let value = self.stat(stat);
            self.set_stat(stat, value);
        }
    }

    /// Re-derive feed/play costs from `inflation_level`.
    pub fn recompute_costs(&mut self, cfg: &ProgressionConfig) {
        self.inflation_level = self.inflation_level.max(0);
        self.feed_cost = cfg.feed_cost_at(self.inflation_level);
        self.play_cost = cfg.play_cost_at(self.inflation_level);
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        NeedStat::ALL.iter().any(|&stat| self.stat(stat) <= STAT_MIN) || self.money < 0
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_game_over() {
            Phase::GameOver
        } else {
            Phase::Alive
        }
    }

    /// The first reason the pet is in game-over, if any.
    #[must_use]
    pub fn collapse_cause(&self) -> Option<CollapseCause> {
        if let Some(stat) = NeedStat::ALL
            .into_iter()
            .find(|&stat| self.stat(stat) <= STAT_MIN)
        {
            return Some(CollapseCause::Depleted(stat));
        }
        (self.money < 0).then_some(CollapseCause::Bankrupt)
    }
}

/// Why the pet reached game-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollapseCause {
    Depleted(NeedStat),
    Bankrupt,
}

impl fmt::Display for CollapseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depleted(stat) => write!(f, "{stat} depleted"),
            Self::Bankrupt => f.write_str("bankrupt"),
        }
    }
}

/// Game-over predicate: any need-stat at or below zero, or negative money.
#[must_use]
pub fn is_game_over(state: &PetState) -> bool {
    state.is_game_over()
}
