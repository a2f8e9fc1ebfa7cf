//! User actions: preconditions, effects and transient display timers.
//!
//! A failed precondition is a no-op, never an error. The UI is expected to
//! have disabled the control already, but every rule is re-checked here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ProgressionConfig;
use crate::constants::{LOG_WOKE_UP, SLEEP_RESTORED_ENERGY};
use crate::state::{NeedStat, PetState};
use crate::tasks::{ScheduledTask, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Feed,
    Play,
    Clean,
    Sleep,
    Work,
}

impl Action {
    pub const ALL: [Self; 5] = [Self::Feed, Self::Play, Self::Clean, Self::Sleep, Self::Work];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Clean => "clean",
            Self::Sleep => "sleep",
            Self::Work => "work",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed" => Ok(Self::Feed),
            "play" => Ok(Self::Play),
            "clean" => Ok(Self::Clean),
            "sleep" => Ok(Self::Sleep),
            "work" => Ok(Self::Work),
            _ => Err(()),
        }
    }
}

/// Transient countdowns in milliseconds. Display and re-entrancy only; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionTimers {
    pub eating: i64,
    pub playing: i64,
    pub sleeping: i64,
    pub working: i64,
}

impl ActionTimers {
    /// Count every timer down by `delta_ms`, clamping at zero.
    pub fn advance(&mut self, delta_ms: i64) {
        let delta = delta_ms.max(0);
        for slot in [
            &mut self.eating,
            &mut self.playing,
            &mut self.sleeping,
            &mut self.working,
        ] {
            *slot = slot.saturating_sub(delta).max(0);
        }
    }

    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        self.sleeping > 0
    }

    #[must_use]
    pub const fn any_active(&self) -> bool {
        self.eating > 0 || self.playing > 0 || self.sleeping > 0 || self.working > 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Why an action was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Rejection {
    GameOver,
    Sleeping,
    AlreadySleeping,
    CannotAfford { cost: i64, money: i64 },
    TooTired { energy: i32, required: i32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver => f.write_str("game over"),
            Self::Sleeping => f.write_str("pet is sleeping"),
            Self::AlreadySleeping => f.write_str("already sleeping"),
            Self::CannotAfford { cost, money } => write!(f, "costs {cost}, have {money}"),
            Self::TooTired { energy, required } => {
                write!(f, "energy {energy} below {required}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied {
        action: Action,
        /// Deferred effect the caller must schedule (sleep completion).
        follow_up: Option<ScheduledTask>,
    },
    Rejected {
        action: Action,
        reason: Rejection,
    },
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

fn check(
    state: &PetState,
    timers: &ActionTimers,
    action: Action,
    cfg: &ProgressionConfig,
) -> Result<(), Rejection> {
    if state.is_game_over() {
        return Err(Rejection::GameOver);
    }
    if timers.is_sleeping() {
        return Err(if action == Action::Sleep {
            Rejection::AlreadySleeping
        } else {
            Rejection::Sleeping
        });
    }
    let afford = |cost: i64| {
        if state.money >= cost {
            Ok(())
        } else {
            Err(Rejection::CannotAfford {
                cost,
                money: state.money,
            })
        }
    };
    match action {
        Action::Feed => afford(state.feed_cost),
        Action::Play => afford(state.play_cost),
        Action::Work if state.energy < cfg.actions.work_min_energy => Err(Rejection::TooTired {
            energy: state.energy,
            required: cfg.actions.work_min_energy,
        }),
        Action::Clean | Action::Sleep | Action::Work => Ok(()),
    }
}

/// Apply `action` at `now_ms` if its preconditions hold.
///
/// On rejection neither `state` nor `timers` is touched.
pub fn apply_action(
    state: &mut PetState,
    timers: &mut ActionTimers,
    action: Action,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> ActionOutcome {
    if let Err(reason) = check(state, timers, action, cfg) {
        log::debug!("{action} ignored: {reason}");
        return ActionOutcome::Rejected { action, reason };
    }

    let tuning = &cfg.actions;
    let mut follow_up = None;
    match action {
        Action::Feed => {
            state.money -= state.feed_cost;
            state.adjust(NeedStat::Hunger, i64::from(tuning.feed_hunger_gain));
            timers.eating = tuning.eating_ms;
        }
        Action::Play => {
            state.money -= state.play_cost;
            state.adjust(NeedStat::Happiness, i64::from(tuning.play_happiness_gain));
            state.adjust(NeedStat::Energy, -i64::from(tuning.play_energy_cost));
            timers.playing = tuning.playing_ms;
        }
        Action::Clean => {
            state.adjust(NeedStat::Hygiene, i64::from(tuning.clean_hygiene_gain));
        }
        Action::Sleep => {
            timers.sleeping = tuning.sleeping_ms;
            follow_up = Some(ScheduledTask::once(
                TaskKind::SleepComplete,
                now_ms.saturating_add(tuning.sleeping_ms),
            ));
        }
        Action::Work => {
            state.money = state.money.saturating_add(tuning.work_earnings);
            state.adjust(NeedStat::Energy, -i64::from(tuning.work_energy_cost));
            state.adjust(NeedStat::Happiness, -i64::from(tuning.work_happiness_cost));
            timers.working = tuning.working_ms;
        }
    }
    log::debug!(
        "{action} applied: money {}, hunger {}, happiness {}, hygiene {}, energy {}",
        state.money,
        state.hunger,
        state.happiness,
        state.hygiene,
        state.energy
    );
    ActionOutcome::Applied { action, follow_up }
}

/// Deferred effect of sleep. Returns `false` when the pet died meanwhile.
pub fn complete_sleep(state: &mut PetState) -> bool {
    if state.is_game_over() {
        return false;
    }
    state.set_stat(NeedStat::Energy, SLEEP_RESTORED_ENERGY);
    log::info!("{LOG_WOKE_UP}: energy restored");
    true
}
