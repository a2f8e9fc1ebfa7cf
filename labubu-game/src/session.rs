//! Live session: owns the one `PetState`, its timers, the task schedule and
//! the notices shown to the player.

use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

use crate::PetStorage;
use crate::actions::{Action, ActionOutcome, ActionTimers, apply_action};
use crate::config::ProgressionConfig;
use crate::constants::{LOG_GAME_OVER, SAVE_KEY};
use crate::schedule::{CatchUpReport, ProgressionEvent, catch_up, settle};
use crate::snapshot::{load_state, serialize};
use crate::state::PetState;
use crate::tasks::{ManualScheduler, TaskScheduler, fire, live_schedule};
use crate::visual::{VisualState, visual_state};

/// Source of wall-clock milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

#[derive(Debug, Error)]
pub enum SessionError<E>
where
    E: std::error::Error + 'static,
{
    #[error("pet storage failed: {0}")]
    Storage(#[source] E),
}

/// Short-lived message for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub expires_at: i64,
}

pub struct PetSession<S, C, T = ManualScheduler>
where
    S: PetStorage,
    C: Clock,
    T: TaskScheduler,
{
    storage: S,
    clock: C,
    scheduler: T,
    cfg: ProgressionConfig,
    state: PetState,
    timers: ActionTimers,
    notices: Vec<Notice>,
    last_advanced: i64,
    catch_up: CatchUpReport,
}

impl<S, C, T> PetSession<S, C, T>
where
    S: PetStorage,
    C: Clock,
    T: TaskScheduler + Default,
{
    /// Load (or create) the pet, catch it up to now, persist, and only then
    /// register the live schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read or written.
    pub fn start(
        storage: S,
        clock: C,
        cfg: ProgressionConfig,
    ) -> Result<Self, SessionError<S::Error>> {
        let now = clock.now_ms();
        let raw = storage.read(SAVE_KEY).map_err(SessionError::Storage)?;
        let mut state = load_state(raw.as_deref(), now, &cfg);
        let report = catch_up(&mut state, now, &cfg);

        let mut session = Self {
            storage,
            clock,
            scheduler: T::default(),
            cfg,
            state,
            timers: ActionTimers::default(),
            notices: Vec::new(),
            last_advanced: now,
            catch_up: report,
        };
        if session.catch_up.money_charged > 0 {
            let message = format!(
                "While you were away, bills cost ${}",
                session.catch_up.money_charged
            );
            session.notify(message, now);
        }
        session.persist(now)?;
        if session.state.is_game_over() {
            session.enter_game_over(now)?;
        } else {
            session.register_schedule(now);
        }
        Ok(session)
    }
}

impl<S, C, T> PetSession<S, C, T>
where
    S: PetStorage,
    C: Clock,
    T: TaskScheduler,
{
    #[must_use]
    pub const fn state(&self) -> &PetState {
        &self.state
    }

    #[must_use]
    pub const fn timers(&self) -> &ActionTimers {
        &self.timers
    }

    #[must_use]
    pub const fn config(&self) -> &ProgressionConfig {
        &self.cfg
    }

    /// What the load-time catch-up did.
    #[must_use]
    pub const fn catch_up_report(&self) -> &CatchUpReport {
        &self.catch_up
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    #[must_use]
    pub fn visual(&self) -> VisualState {
        visual_state(self.is_game_over(), &self.timers, &self.state)
    }

    /// Number of timers still registered.
    #[must_use]
    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Advance to the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns an error if a save fails.
    pub fn advance(&mut self) -> Result<Vec<ProgressionEvent>, SessionError<S::Error>> {
        let now = self.clock.now_ms();
        self.advance_to(now)
    }

    /// Count action timers down, drop expired notices, and fire every task
    /// due at or before `now_ms` in fire-time order.
    ///
    /// # Errors
    ///
    /// Returns an error if a save fails.
    pub fn advance_to(
        &mut self,
        now_ms: i64,
    ) -> Result<Vec<ProgressionEvent>, SessionError<S::Error>> {
        let delta = now_ms.saturating_sub(self.last_advanced);
        if delta > 0 {
            self.timers.advance(delta);
            self.last_advanced = now_ms;
        }
        self.notices.retain(|notice| notice.expires_at > now_ms);

        let mut events = Vec::new();
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            // Bring inflation and the stamp up to the fire time first, so a
            // collapse caused by this task freezes the pet at that instant.
            self.settle_to(task.fire_at);
            let outcome = fire(&mut self.state, task.kind, task.fire_at, &self.cfg);
            if let Some(event) = outcome.event {
                self.announce(event, task.fire_at);
                events.push(event);
            }
            if outcome.woke {
                self.timers.sleeping = 0;
            }
            if outcome.persist {
                self.persist(task.fire_at)?;
            }
            if self.state.is_game_over() {
                self.enter_game_over(task.fire_at)?;
                break;
            }
        }
        Ok(events)
    }

    /// Apply `action` at the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns an error if a save fails.
    pub fn apply(&mut self, action: Action) -> Result<ActionOutcome, SessionError<S::Error>> {
        let now = self.clock.now_ms();
        self.advance_to(now)?;
        self.settle_to(now);
        let outcome = apply_action(&mut self.state, &mut self.timers, action, now, &self.cfg);
        if let ActionOutcome::Applied { follow_up, .. } = outcome {
            if let Some(task) = follow_up {
                self.scheduler.schedule(task);
            }
            self.persist(now)?;
            if self.state.is_game_over() {
                self.enter_game_over(now)?;
            }
        }
        Ok(outcome)
    }

    /// Discard the saved pet and start over.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be removed.
    pub fn reset(&mut self) -> Result<(), SessionError<S::Error>> {
        self.storage.remove(SAVE_KEY).map_err(SessionError::Storage)?;
        let now = self.clock.now_ms();
        self.scheduler.cancel_all();
        self.state = PetState::new(now, &self.cfg);
        self.timers.clear();
        self.notices.clear();
        self.catch_up = CatchUpReport::default();
        self.last_advanced = now;
        self.register_schedule(now);
        log::info!("pet reset; new game started");
        Ok(())
    }

    fn register_schedule(&mut self, now_ms: i64) {
        for task in live_schedule(&self.state, now_ms, &self.cfg) {
            self.scheduler.schedule(task);
        }
    }

    fn settle_to(&mut self, at_ms: i64) {
        if let Some(event) = settle(&mut self.state, at_ms, &self.cfg) {
            self.announce(event, at_ms);
        }
    }

    /// Settle and write the snapshot. A collapsed pet is written as it stands.
    fn persist(&mut self, now_ms: i64) -> Result<(), SessionError<S::Error>> {
        self.settle_to(now_ms);
        self.storage
            .write(SAVE_KEY, &serialize(&self.state))
            .map_err(SessionError::Storage)
    }

    fn enter_game_over(&mut self, at_ms: i64) -> Result<(), SessionError<S::Error>> {
        self.scheduler.cancel_all();
        let cause = self
            .state
            .collapse_cause()
            .map_or_else(String::new, |cause| cause.to_string());
        log::info!("{LOG_GAME_OVER}: {cause}");
        self.notify(format!("Game over: {cause}"), at_ms);
        self.persist(at_ms)
    }

    fn announce(&mut self, event: ProgressionEvent, at_ms: i64) {
        let message = match event {
            ProgressionEvent::Charged { bill, amount, .. } => {
                format!("Paid {bill}: -${amount}")
            }
            ProgressionEvent::Inflated { .. } => format!(
                "Prices went up! Food ${}, play ${}",
                self.state.feed_cost, self.state.play_cost
            ),
            ProgressionEvent::Decayed { .. } => return,
        };
        self.notify(message, at_ms);
    }

    fn notify(&mut self, message: String, at_ms: i64) {
        self.notices.push(Notice {
            message,
            expires_at: at_ms.saturating_add(self.cfg.notice_lifetime_ms),
        });
    }
}
