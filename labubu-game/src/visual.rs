//! Presentation mapping: which pose to draw and how to color a stat bar.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actions::ActionTimers;
use crate::constants::{
    SAD_ENERGY_BELOW, SAD_HAPPINESS_BELOW, SAD_HUNGER_BELOW, SAD_HYGIENE_BELOW,
    STAT_CRITICAL_BELOW, STAT_LOW_BELOW,
};
use crate::state::PetState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    Idle,
    Happy,
    Sad,
    Eating,
    Sleeping,
    Working,
}

impl VisualState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Eating => "eating",
            Self::Sleeping => "sleeping",
            Self::Working => "working",
        }
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the pose. Game-over wins, then an active timer, then low stats.
#[must_use]
pub fn visual_state(is_game_over: bool, timers: &ActionTimers, state: &PetState) -> VisualState {
    if is_game_over {
        return VisualState::Sad;
    }
    if timers.eating > 0 {
        return VisualState::Eating;
    }
    if timers.playing > 0 {
        return VisualState::Happy;
    }
    if timers.sleeping > 0 {
        return VisualState::Sleeping;
    }
    if timers.working > 0 {
        return VisualState::Working;
    }
    let struggling = state.happiness < SAD_HAPPINESS_BELOW
        || state.hunger < SAD_HUNGER_BELOW
        || state.hygiene < SAD_HYGIENE_BELOW
        || state.energy < SAD_ENERGY_BELOW;
    if struggling {
        VisualState::Sad
    } else {
        VisualState::Idle
    }
}

/// Stat bar band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatLevel {
    Critical,
    Low,
    Good,
}

impl StatLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Low => "low",
            Self::Good => "good",
        }
    }
}

#[must_use]
pub const fn stat_level(value: i32) -> StatLevel {
    if value < STAT_CRITICAL_BELOW {
        StatLevel::Critical
    } else if value < STAT_LOW_BELOW {
        StatLevel::Low
    } else {
        StatLevel::Good
    }
}
