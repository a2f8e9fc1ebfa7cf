//! Centralized balance and tuning constants for Labubu progression.
//!
//! These are the defaults behind [`crate::config::ProgressionConfig`]. A
//! deployment may override them through JSON config, but the shipped tuning
//! lives here so it is reviewed alongside the code that uses it.

// Persistence --------------------------------------------------------------
pub const SAVE_KEY: &str = "labubuSaveData";
pub const PERSIST_INTERVAL_MS: i64 = 5_000;

// Need-stats ---------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;

pub const HUNGER_DECAY_INTERVAL_MS: i64 = 10_000;
pub const HUNGER_DECAY_AMOUNT: i32 = 5;
pub const HAPPINESS_DECAY_INTERVAL_MS: i64 = 15_000;
pub const HAPPINESS_DECAY_AMOUNT: i32 = 4;
pub const HYGIENE_DECAY_INTERVAL_MS: i64 = 20_000;
pub const HYGIENE_DECAY_AMOUNT: i32 = 3;
pub const ENERGY_DECAY_INTERVAL_MS: i64 = 20_000;
pub const ENERGY_DECAY_AMOUNT: i32 = 2;

// Economy ------------------------------------------------------------------
pub const STARTING_MONEY: i64 = 50;
pub const BASE_FEED_COST: i64 = 10;
pub const BASE_PLAY_COST: i64 = 5;

pub const RENT_INTERVAL_MS: i64 = 60_000;
pub const RENT_COST: i64 = 15;
pub const MEDICAL_BILL_INTERVAL_MS: i64 = 90_000;
pub const MEDICAL_BILL_COST: i64 = 10;

pub const INFLATION_INTERVAL_MS: i64 = 120_000;
pub const FEED_COST_INCREASE: i64 = 2;
pub const PLAY_COST_INCREASE: i64 = 1;

// Actions ------------------------------------------------------------------
pub const FEED_HUNGER_GAIN: i32 = 25;
pub const PLAY_HAPPINESS_GAIN: i32 = 20;
pub const PLAY_ENERGY_COST: i32 = 10;
pub const CLEAN_HYGIENE_GAIN: i32 = 30;
pub const WORK_EARNINGS: i64 = 20;
pub const WORK_ENERGY_COST: i32 = 30;
pub const WORK_HAPPINESS_COST: i32 = 10;
pub const WORK_MIN_ENERGY: i32 = 20;
pub const SLEEP_RESTORED_ENERGY: i32 = STAT_MAX;

pub const EATING_DURATION_MS: i64 = 2_000;
pub const PLAYING_DURATION_MS: i64 = 2_000;
pub const SLEEPING_DURATION_MS: i64 = 10_000;
pub const WORKING_DURATION_MS: i64 = 3_000;

// Presentation thresholds --------------------------------------------------
pub const SAD_HAPPINESS_BELOW: i32 = 30;
pub const SAD_HUNGER_BELOW: i32 = 30;
pub const SAD_HYGIENE_BELOW: i32 = 20;
pub const SAD_ENERGY_BELOW: i32 = 20;
pub const STAT_CRITICAL_BELOW: i32 = 20;
pub const STAT_LOW_BELOW: i32 = 50;

pub const NOTICE_LIFETIME_MS: i64 = 4_000;

// Log keys -----------------------------------------------------------------
pub(crate) const LOG_RENT_CHARGED: &str = "log.bill.rent";
pub(crate) const LOG_MEDICAL_CHARGED: &str = "log.bill.medical";
pub(crate) const LOG_INFLATION_RAISED: &str = "log.inflation.raised";
pub(crate) const LOG_GAME_OVER: &str = "log.game-over";
pub(crate) const LOG_WOKE_UP: &str = "log.sleep.woke";
