//! Scheduled-task descriptors and the scheduler seam.
//!
//! Timers are plain data (`kind`, `fire_at`, `period`). A scheduler decides
//! when they are due; [`fire`] says what happens when one goes off.

use serde::{Deserialize, Serialize};

use crate::actions::complete_sleep;
use crate::config::ProgressionConfig;
use crate::schedule::{BillKind, Metric, ProgressionEvent, settle, tick};
use crate::state::{NeedStat, PetState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "camelCase")]
pub enum TaskKind {
    Decay { stat: NeedStat },
    Bill { bill: BillKind },
    Inflation,
    Persist,
    SleepComplete,
}

impl TaskKind {
    /// The schedule metric this timer drives, if any.
    #[must_use]
    pub const fn metric(self) -> Option<Metric> {
        match self {
            Self::Decay { stat } => Some(Metric::Need(stat)),
            Self::Bill { bill } => Some(Metric::Bill(bill)),
            Self::Inflation => Some(Metric::Inflation),
            Self::Persist | Self::SleepComplete => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub fire_at: i64,
    /// Re-arm period; `None` for one-shot tasks.
    pub period: Option<i64>,
}

impl ScheduledTask {
    #[must_use]
    pub const fn once(kind: TaskKind, fire_at: i64) -> Self {
        Self {
            kind,
            fire_at,
            period: None,
        }
    }

    #[must_use]
    pub const fn every(kind: TaskKind, first_fire_at: i64, period: i64) -> Self {
        Self {
            kind,
            fire_at: first_fire_at,
            period: Some(period),
        }
    }
}

/// Opaque id returned by [`TaskScheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u64);

/// Registrar for timed callbacks with cancellation.
pub trait TaskScheduler {
    fn schedule(&mut self, task: ScheduledTask) -> TaskHandle;

    /// Retract a task. Returns `false` when it was not pending.
    fn cancel(&mut self, handle: TaskHandle) -> bool;

    /// Retract every pending task.
    fn cancel_all(&mut self);

    /// Remove and return the earliest task due at or before `now_ms`,
    /// re-arming it first if it is periodic.
    fn pop_due(&mut self, now_ms: i64) -> Option<ScheduledTask>;

    fn pending(&self) -> usize;
}

/// Deterministic in-memory scheduler driven by explicit time.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next_handle: u64,
    entries: Vec<(TaskHandle, ScheduledTask)>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.entries.iter().map(|(_, task)| task)
    }

    /// Earliest pending fire time.
    #[must_use]
    pub fn next_fire_at(&self) -> Option<i64> {
        self.entries.iter().map(|(_, task)| task.fire_at).min()
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&mut self, task: ScheduledTask) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push((handle, task));
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        self.entries.len() != before
    }

    fn cancel_all(&mut self) {
        self.entries.clear();
    }

    fn pop_due(&mut self, now_ms: i64) -> Option<ScheduledTask> {
        // Earliest fire time wins; ties go to the task registered first.
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (_, task))| task.fire_at <= now_ms)
            .min_by_key(|(_, (handle, task))| (task.fire_at, *handle))
            .map(|(index, _)| index)?;

        let (handle, task) = self.entries[index];
        match task.period {
            Some(period) if period > 0 => {
                self.entries[index] = (
                    handle,
                    ScheduledTask {
                        fire_at: task.fire_at.saturating_add(period),
                        ..task
                    },
                );
            }
            _ => {
                self.entries.remove(index);
            }
        }
        Some(task)
    }

    fn pending(&self) -> usize {
        self.entries.len()
    }
}

/// The live timer plan for a freshly caught-up state.
///
/// Need-stats start a full interval from `now_ms`; bills fire when their next
/// cycle completes; inflation fires on the next epoch boundary.
#[must_use]
pub fn live_schedule(state: &PetState, now_ms: i64, cfg: &ProgressionConfig) -> Vec<ScheduledTask> {
    let mut tasks = Vec::with_capacity(8);
    for stat in NeedStat::ALL {
        let interval = cfg.decay.rule(stat).interval_ms;
        tasks.push(ScheduledTask::every(
            TaskKind::Decay { stat },
            now_ms.saturating_add(interval),
            interval,
        ));
    }
    for bill in BillKind::ALL {
        let interval = bill.rule(cfg).interval_ms;
        tasks.push(ScheduledTask::every(
            TaskKind::Bill { bill },
            bill.last_paid(state).saturating_add(interval).max(now_ms),
            interval,
        ));
    }
    let inflation = cfg.inflation.interval_ms;
    let next_boundary = (now_ms.div_euclid(inflation) + 1).saturating_mul(inflation);
    tasks.push(ScheduledTask::every(TaskKind::Inflation, next_boundary, inflation));
    tasks.push(ScheduledTask::every(
        TaskKind::Persist,
        now_ms.saturating_add(cfg.persist_interval_ms),
        cfg.persist_interval_ms,
    ));
    tasks
}

/// What a fired task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FireOutcome {
    pub event: Option<ProgressionEvent>,
    /// The state changed or a save was requested; the caller should persist.
    pub persist: bool,
    pub woke: bool,
}

/// Apply the effect of `kind` firing at `fire_at`.
pub fn fire(
    state: &mut PetState,
    kind: TaskKind,
    fire_at: i64,
    cfg: &ProgressionConfig,
) -> FireOutcome {
    match kind {
        TaskKind::Decay { stat } => FireOutcome {
            event: tick(state, Metric::Need(stat), fire_at, cfg),
            persist: false,
            woke: false,
        },
        TaskKind::Bill { bill } => {
            let event = tick(state, Metric::Bill(bill), fire_at, cfg);
            FireOutcome {
                event,
                persist: event.is_some(),
                woke: false,
            }
        }
        TaskKind::Inflation => FireOutcome {
            event: tick(state, Metric::Inflation, fire_at, cfg),
            persist: true,
            woke: false,
        },
        TaskKind::Persist => FireOutcome {
            event: settle(state, fire_at, cfg),
            persist: true,
            woke: false,
        },
        TaskKind::SleepComplete => {
            let woke = complete_sleep(state);
            FireOutcome {
                event: None,
                persist: woke,
                woke,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn periodic_task_rearms() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ScheduledTask::every(TaskKind::Persist, 100, 50));
        assert_eq!(scheduler.pop_due(99), None);
        assert_eq!(scheduler.pop_due(100).map(|t| t.fire_at), Some(100));
        assert_eq!(scheduler.pop_due(149), None);
        assert_eq!(scheduler.pop_due(200).map(|t| t.fire_at), Some(150));
        assert_eq!(scheduler.pop_due(200).map(|t| t.fire_at), Some(200));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn one_shot_task_is_removed() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ScheduledTask::once(TaskKind::SleepComplete, 10));
        assert!(scheduler.pop_due(10).is_some());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn due_tasks_come_out_in_time_then_registration_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(ScheduledTask::once(TaskKind::Persist, 30));
        scheduler.schedule(ScheduledTask::once(TaskKind::Inflation, 20));
        scheduler.schedule(ScheduledTask::once(TaskKind::SleepComplete, 20));
        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(100))
            .map(|task| task.kind)
            .collect();
        assert_eq!(
            order,
            vec![TaskKind::Inflation, TaskKind::SleepComplete, TaskKind::Persist]
        );
    }

    #[test]
    fn cancel_retracts_tasks() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.schedule(ScheduledTask::once(TaskKind::Persist, 5));
        scheduler.schedule(ScheduledTask::once(TaskKind::Inflation, 5));
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert_eq!(scheduler.pending(), 1);
        scheduler.cancel_all();
        assert_eq!(scheduler.pop_due(i64::MAX), None);
    }

    #[test]
    fn live_schedule_covers_every_metric() {
        let cfg = ProgressionConfig::default();
        let state = PetState::new(NOW, &cfg);
        let tasks = live_schedule(&state, NOW, &cfg);
        for metric in Metric::ALL {
            assert!(
                tasks.iter().any(|task| task.kind.metric() == Some(metric)),
                "no timer for {metric}"
            );
        }
        assert!(tasks.iter().any(|task| task.kind == TaskKind::Persist));
        assert!(tasks.iter().all(|task| task.fire_at > NOW));
        let inflation = tasks
            .iter()
            .find(|task| task.kind == TaskKind::Inflation)
            .map(|task| task.fire_at)
            .unwrap_or_default();
        assert_eq!(inflation % cfg.inflation.interval_ms, 0);
    }

    #[test]
    fn fire_sleep_complete_restores_energy() {
        let cfg = ProgressionConfig::default();
        let mut state = PetState::new(NOW, &cfg);
        state.energy = 5;
        let outcome = fire(&mut state, TaskKind::SleepComplete, NOW, &cfg);
        assert!(outcome.woke && outcome.persist);
        assert_eq!(state.energy, 100);
    }
}
