//! Decay, billing and inflation schedule.
//!
//! Live ticks and offline catch-up share one table and the same floor-division
//! cycle math, so a pet that was watched continuously and one that was reloaded
//! after the same span end up in the same place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{BillRule, ProgressionConfig};
use crate::constants::{LOG_INFLATION_RAISED, LOG_MEDICAL_CHARGED, LOG_RENT_CHARGED};
use crate::numbers::{boundaries_crossed, whole_cycles};
use crate::state::{NeedStat, PetState};

/// A recurring charge against `money`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BillKind {
    Rent,
    MedicalBill,
}

impl BillKind {
    pub const ALL: [Self; 2] = [Self::Rent, Self::MedicalBill];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::MedicalBill => "medicalBill",
        }
    }

    #[must_use]
    pub const fn rule(self, cfg: &ProgressionConfig) -> BillRule {
        match self {
            Self::Rent => cfg.rent,
            Self::MedicalBill => cfg.medical_bill,
        }
    }

    const fn log_key(self) -> &'static str {
        match self {
            Self::Rent => LOG_RENT_CHARGED,
            Self::MedicalBill => LOG_MEDICAL_CHARGED,
        }
    }

    pub(crate) const fn last_paid(self, state: &PetState) -> i64 {
        match self {
            Self::Rent => state.last_rent_paid,
            Self::MedicalBill => state.last_medical_bill_paid,
        }
    }

    const fn last_paid_mut(self, state: &mut PetState) -> &mut i64 {
        match self {
            Self::Rent => &mut state.last_rent_paid,
            Self::MedicalBill => &mut state.last_medical_bill_paid,
        }
    }
}

impl fmt::Display for BillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything with its own timer in the live schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Need(NeedStat),
    Bill(BillKind),
    Inflation,
}

impl Metric {
    pub const ALL: [Self; 7] = [
        Self::Need(NeedStat::Hunger),
        Self::Need(NeedStat::Happiness),
        Self::Need(NeedStat::Hygiene),
        Self::Need(NeedStat::Energy),
        Self::Bill(BillKind::Rent),
        Self::Bill(BillKind::MedicalBill),
        Self::Inflation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Need(stat) => stat.as_str(),
            Self::Bill(kind) => kind.as_str(),
            Self::Inflation => "inflation",
        }
    }

    /// Timer period for this metric.
    #[must_use]
    pub const fn interval_ms(self, cfg: &ProgressionConfig) -> i64 {
        match self {
            Self::Need(stat) => cfg.decay.rule(stat).interval_ms,
            Self::Bill(kind) => kind.rule(cfg).interval_ms,
            Self::Inflation => cfg.inflation.interval_ms,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rent" => Ok(Self::Bill(BillKind::Rent)),
            "medicalBill" => Ok(Self::Bill(BillKind::MedicalBill)),
            "inflation" => Ok(Self::Inflation),
            other => other.parse::<NeedStat>().map(Self::Need),
        }
    }
}

/// A state change produced by the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgressionEvent {
    Decayed {
        stat: NeedStat,
        cycles: i64,
        lost: i32,
    },
    Charged {
        bill: BillKind,
        cycles: i64,
        amount: i64,
    },
    Inflated {
        steps: i64,
        level: i64,
    },
}

/// Summary of a one-shot catch-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchUpReport {
    pub elapsed_ms: i64,
    pub events: Vec<ProgressionEvent>,
    pub money_charged: i64,
    /// The pet was already in game-over, so nothing advanced.
    pub frozen: bool,
    /// The pet entered game-over during the window.
    pub died: bool,
}

impl CatchUpReport {
    /// Cycles applied for a given metric in this window.
    #[must_use]
    pub fn cycles(&self, metric: Metric) -> i64 {
        self.events
            .iter()
            .filter_map(|event| match (*event, metric) {
                (ProgressionEvent::Decayed { stat, cycles, .. }, Metric::Need(want))
                    if stat == want =>
                {
                    Some(cycles)
                }
                (ProgressionEvent::Charged { bill, cycles, .. }, Metric::Bill(want))
                    if bill == want =>
                {
                    Some(cycles)
                }
                (ProgressionEvent::Inflated { steps, .. }, Metric::Inflation) => Some(steps),
                _ => None,
            })
            .sum()
    }
}

fn decay(
    state: &mut PetState,
    stat: NeedStat,
    cycles: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    if cycles <= 0 {
        return None;
    }
    let rule = cfg.decay.rule(stat);
    let before = state.stat(stat);
    state.adjust(stat, -(cycles.saturating_mul(i64::from(rule.amount))));
    Some(ProgressionEvent::Decayed {
        stat,
        cycles,
        lost: before - state.stat(stat),
    })
}

/// Charge every whole interval due since the last payment, advancing the
/// paid-through timestamp by exactly the cycles charged so partial intervals
/// carry over.
pub fn charge_bill(
    state: &mut PetState,
    bill: BillKind,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    let rule = bill.rule(cfg);
    let cycles = whole_cycles(now_ms.saturating_sub(bill.last_paid(state)), rule.interval_ms);
    if cycles == 0 {
        return None;
    }
    let amount = cycles.saturating_mul(rule.cost);
    state.money = state.money.saturating_sub(amount);
    let paid = bill.last_paid_mut(state);
    *paid = paid.saturating_add(cycles.saturating_mul(rule.interval_ms));
    log::info!(
        "{}: {bill} x{cycles} charged {amount}, money now {}",
        bill.log_key(),
        state.money
    );
    Some(ProgressionEvent::Charged {
        bill,
        cycles,
        amount,
    })
}

/// Apply epoch-aligned inflation boundaries crossed in `(last_updated, now]`.
/// Costs are recomputed from the level, never bumped incrementally.
pub fn apply_inflation(
    state: &mut PetState,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    let steps = boundaries_crossed(state.last_updated, now_ms, cfg.inflation.interval_ms);
    state.recompute_costs(cfg);
    if steps == 0 {
        return None;
    }
    state.inflation_level = state.inflation_level.saturating_add(steps);
    state.recompute_costs(cfg);
    log::info!(
        "{LOG_INFLATION_RAISED}: level {} (feed {}, play {})",
        state.inflation_level,
        state.feed_cost,
        state.play_cost
    );
    Some(ProgressionEvent::Inflated {
        steps,
        level: state.inflation_level,
    })
}

/// Save-time step: apply due inflation, then stamp `last_updated`.
///
/// Every save goes through here, so inflation boundaries between saves are
/// never skipped no matter how often the state is written. A pet in
/// game-over is frozen: its level and stamp stay where they were when it
/// collapsed.
pub fn settle(
    state: &mut PetState,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    if state.is_game_over() {
        return None;
    }
    let event = apply_inflation(state, now_ms, cfg);
    state.last_updated = state.last_updated.max(now_ms);
    event
}

/// One live timer fire for `metric`.
///
/// Need-stats lose exactly one interval's amount. Bills charge every whole
/// cycle due. Inflation settles the clock. The caller stops firing once the
/// pet is in game-over.
pub fn tick(
    state: &mut PetState,
    metric: Metric,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    let event = match metric {
        Metric::Need(stat) => decay(state, stat, 1, cfg),
        Metric::Bill(bill) => charge_bill(state, bill, now_ms, cfg),
        Metric::Inflation => settle(state, now_ms, cfg),
    };
    if let Some(event) = event {
        log::debug!("tick {metric}: {event:?}");
    }
    event
}

/// Total billed across every bill for cycles completed by `at_ms`.
fn billed_by(state: &PetState, at_ms: i64, cfg: &ProgressionConfig) -> i64 {
    BillKind::ALL
        .into_iter()
        .map(|bill| {
            let rule = bill.rule(cfg);
            whole_cycles(at_ms.saturating_sub(bill.last_paid(state)), rule.interval_ms)
                .saturating_mul(rule.cost)
        })
        .fold(0, i64::saturating_add)
}

/// First bill fire at or before `now_ms` that leaves money negative.
fn bankrupt_at(state: &PetState, now_ms: i64, cfg: &ProgressionConfig) -> Option<i64> {
    if state.money.saturating_sub(billed_by(state, now_ms, cfg)) >= 0 {
        return None;
    }
    // Nothing is billed at the oldest paid-through stamp; billing only grows
    // with time, so bisect for the first solvent-to-bankrupt step.
    let mut solvent = BillKind::ALL
        .into_iter()
        .map(|bill| bill.last_paid(state))
        .min()
        .unwrap_or(now_ms);
    let mut bankrupt = now_ms;
    while bankrupt.saturating_sub(solvent) > 1 {
        let mid = solvent + bankrupt.saturating_sub(solvent) / 2;
        if state.money.saturating_sub(billed_by(state, mid, cfg)) < 0 {
            bankrupt = mid;
        } else {
            solvent = mid;
        }
    }
    Some(bankrupt)
}

/// Earliest instant in the window ending at `now_ms` at which a decay fire or
/// a bill leaves the pet in game-over. Decay fires are phased from
/// `last_updated`.
fn collapse_at(state: &PetState, now_ms: i64, cfg: &ProgressionConfig) -> Option<i64> {
    let depleted = NeedStat::ALL.into_iter().filter_map(|stat| {
        let rule = cfg.decay.rule(stat);
        if rule.amount <= 0 || rule.interval_ms <= 0 {
            return None;
        }
        let amount = i64::from(rule.amount);
        let fires = (i64::from(state.stat(stat)) + amount - 1) / amount;
        Some(
            state
                .last_updated
                .saturating_add(fires.saturating_mul(rule.interval_ms)),
        )
    });
    depleted
        .chain(bankrupt_at(state, now_ms, cfg))
        .filter(|&at| at <= now_ms)
        .min()
        .map(|at| at.max(state.last_updated))
}

/// Decay, bills and inflation for a window the pet survives.
fn run_window(
    state: &mut PetState,
    anchor_ms: i64,
    end_ms: i64,
    cfg: &ProgressionConfig,
    events: &mut Vec<ProgressionEvent>,
) {
    for stat in NeedStat::ALL {
        let interval = cfg.decay.rule(stat).interval_ms;
        let cycles = whole_cycles(end_ms.saturating_sub(anchor_ms), interval);
        events.extend(decay(state, stat, cycles, cfg));
    }
    for bill in BillKind::ALL {
        events.extend(charge_bill(state, bill, end_ms, cfg));
    }
    events.extend(settle(state, end_ms, cfg));
}

/// Fires due exactly at `at_ms`, in live schedule order (need-stats, then
/// bills), stopping at the first one that ends the game.
fn run_collapse_instant(
    state: &mut PetState,
    anchor_ms: i64,
    at_ms: i64,
    cfg: &ProgressionConfig,
    events: &mut Vec<ProgressionEvent>,
) {
    let since = at_ms.saturating_sub(anchor_ms);
    for stat in NeedStat::ALL {
        let interval = cfg.decay.rule(stat).interval_ms;
        if since > 0 && since.checked_rem(interval) == Some(0) {
            events.extend(decay(state, stat, 1, cfg));
            if state.is_game_over() {
                return;
            }
        }
    }
    for bill in BillKind::ALL {
        events.extend(charge_bill(state, bill, at_ms, cfg));
        if state.is_game_over() {
            return;
        }
    }
}

/// One-shot offline catch-up over `now - last_updated`.
///
/// Produces the state a continuously watched pet would have reached: if the
/// pet collapses inside the window, everything stops at that instant and the
/// rest of the window is skipped.
pub fn catch_up(state: &mut PetState, now_ms: i64, cfg: &ProgressionConfig) -> CatchUpReport {
    if state.is_game_over() {
        return CatchUpReport {
            frozen: true,
            ..CatchUpReport::default()
        };
    }

    let anchor = state.last_updated;
    let elapsed_ms = now_ms.saturating_sub(anchor).max(0);
    let money_before = state.money;
    let mut events = Vec::new();

    match collapse_at(state, now_ms, cfg) {
        Some(at) => {
            run_window(state, anchor, at.saturating_sub(1), cfg, &mut events);
            events.extend(settle(state, at, cfg));
            run_collapse_instant(state, anchor, at, cfg, &mut events);
        }
        None => run_window(state, anchor, now_ms, cfg, &mut events),
    }

    let report = CatchUpReport {
        elapsed_ms,
        events,
        money_charged: money_before - state.money,
        frozen: false,
        died: state.is_game_over(),
    };
    if elapsed_ms > 0 {
        log::info!(
            "caught up {}s offline: charged {}, died {}",
            elapsed_ms / 1_000,
            report.money_charged,
            report.died
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        HUNGER_DECAY_AMOUNT, HUNGER_DECAY_INTERVAL_MS, RENT_COST, RENT_INTERVAL_MS,
    };

    const T0: i64 = 1_700_000_000_000;

    fn fresh(cfg: &ProgressionConfig) -> PetState {
        PetState::new(T0, cfg)
    }

    #[test]
    fn need_tick_removes_one_interval() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        let event = tick(&mut state, Metric::Need(NeedStat::Hunger), T0, &cfg);
        assert_eq!(state.hunger, 100 - HUNGER_DECAY_AMOUNT);
        assert_eq!(
            event,
            Some(ProgressionEvent::Decayed {
                stat: NeedStat::Hunger,
                cycles: 1,
                lost: HUNGER_DECAY_AMOUNT,
            })
        );
    }

    #[test]
    fn need_tick_floors_at_zero() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        state.energy = 1;
        tick(&mut state, Metric::Need(NeedStat::Energy), T0, &cfg);
        assert_eq!(state.energy, 0);
    }

    #[test]
    fn rent_keeps_phase_across_partial_interval() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        let now = T0 + RENT_INTERVAL_MS * 5 / 2;
        charge_bill(&mut state, BillKind::Rent, now, &cfg);
        assert_eq!(state.money, 50 - 2 * RENT_COST);
        assert_eq!(state.last_rent_paid, T0 + 2 * RENT_INTERVAL_MS);

        // The leftover half interval completes the third cycle.
        let next = charge_bill(&mut state, BillKind::Rent, T0 + 3 * RENT_INTERVAL_MS, &cfg);
        assert!(matches!(next, Some(ProgressionEvent::Charged { cycles: 1, .. })));
        assert_eq!(state.last_rent_paid, T0 + 3 * RENT_INTERVAL_MS);
    }

    #[test]
    fn rent_ignores_clock_moving_backwards() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        assert_eq!(charge_bill(&mut state, BillKind::Rent, T0 - 500_000, &cfg), None);
        assert_eq!(state.money, 50);
        assert_eq!(state.last_rent_paid, T0);
    }

    #[test]
    fn catch_up_matches_repeated_need_ticks() {
        let cfg = ProgressionConfig::default();
        let elapsed = 47_500;
        let mut offline = fresh(&cfg);
        catch_up(&mut offline, T0 + elapsed, &cfg);

        let mut live = fresh(&cfg);
        for stat in NeedStat::ALL {
            let fires = elapsed / cfg.decay.rule(stat).interval_ms;
            for _ in 0..fires {
                tick(&mut live, Metric::Need(stat), T0, &cfg);
            }
        }
        for stat in NeedStat::ALL {
            assert_eq!(offline.stat(stat), live.stat(stat), "{stat} diverged");
        }
    }

    #[test]
    fn catch_up_twice_is_noop() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        let now = T0 + 10 * 60_000 + 123;
        catch_up(&mut state, now, &cfg);
        let after_first = state.clone();
        let report = catch_up(&mut state, now, &cfg);
        assert_eq!(state, after_first);
        assert!(report.events.is_empty());
    }

    #[test]
    fn catch_up_freezes_dead_pet() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        state.hunger = 0;
        let before = state.clone();
        let report = catch_up(&mut state, T0 + 3_600_000, &cfg);
        assert!(report.frozen);
        assert_eq!(state, before);
    }

    #[test]
    fn catch_up_stops_at_starvation() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        state.money = 1_000;
        let report = catch_up(&mut state, T0 + 10 * 60_000, &cfg);

        // Hunger empties on its 20th fire; hygiene is due at the same instant
        // but fires after hunger, so it never gets there.
        let starved = T0 + 20 * HUNGER_DECAY_INTERVAL_MS;
        assert!(report.died);
        assert_eq!(report.elapsed_ms, 10 * 60_000);
        assert_eq!(report.cycles(Metric::Need(NeedStat::Hunger)), 20);
        assert_eq!(report.cycles(Metric::Need(NeedStat::Hygiene)), 9);
        assert_eq!(state.hunger, 0);
        assert_eq!(state.happiness, 100 - 13 * 4);
        assert_eq!(state.hygiene, 100 - 9 * 3);
        assert_eq!(state.energy, 100 - 9 * 2);
        assert_eq!(state.money, 1_000 - 3 * RENT_COST - 2 * 10);
        assert_eq!(state.last_rent_paid, T0 + 3 * RENT_INTERVAL_MS);
        assert_eq!(state.last_medical_bill_paid, T0 + 180_000);
        assert_eq!(state.inflation_level, 2);
        assert_eq!(state.feed_cost, cfg.feed_cost_at(2));
        assert_eq!(state.last_updated, starved);
    }

    #[test]
    fn catch_up_stops_at_bankruptcy() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        let report = catch_up(&mut state, T0 + 10 * 60_000, &cfg);

        // Third rent at 180s overdraws; the medical bill due then is never sent.
        assert!(report.died);
        assert_eq!(state.money, 50 - 3 * RENT_COST - 10);
        assert_eq!(state.money, -5);
        assert_eq!(state.last_rent_paid, T0 + 180_000);
        assert_eq!(state.last_medical_bill_paid, T0 + 90_000);
        assert_eq!(state.inflation_level, 2);
        assert_eq!(state.hunger, 100 - 18 * HUNGER_DECAY_AMOUNT);
        assert_eq!(state.happiness, 100 - 12 * 4);
        assert_eq!(state.last_updated, T0 + 180_000);
        assert_eq!(report.money_charged, 55);
    }

    #[test]
    fn catch_up_charges_overdue_bills_at_the_anchor() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        state.last_rent_paid = T0 - 10 * RENT_INTERVAL_MS;
        let report = catch_up(&mut state, T0 + 1_000, &cfg);
        // Overdue cycles all land at once, as they would on a live first fire.
        assert!(report.died);
        assert_eq!(report.cycles(Metric::Bill(BillKind::Rent)), 10);
        assert_eq!(state.money, 50 - 10 * RENT_COST);
        assert_eq!(state.last_rent_paid, T0);
        assert_eq!(state.hunger, 100);
        assert_eq!(state.last_updated, T0);
    }

    #[test]
    fn decay_has_no_offline_ceiling() {
        let mut cfg = ProgressionConfig::default();
        cfg.decay.hunger = crate::config::DecayRule::new(86_400_000, 1);
        cfg.decay.happiness.amount = 0;
        cfg.decay.hygiene.amount = 0;
        cfg.decay.energy.amount = 0;
        cfg.rent.cost = 0;
        cfg.medical_bill.cost = 0;
        let mut state = fresh(&cfg);
        let report = catch_up(&mut state, T0 + 60 * 86_400_000, &cfg);
        assert_eq!(report.cycles(Metric::Need(NeedStat::Hunger)), 60);
        assert_eq!(state.hunger, 40);
        assert!(!report.died);
    }

    #[test]
    fn settle_leaves_a_dead_pet_untouched() {
        let cfg = ProgressionConfig::default();
        let mut state = fresh(&cfg);
        state.money = -1;
        let before = state.clone();
        assert_eq!(settle(&mut state, T0 + 50 * cfg.inflation.interval_ms, &cfg), None);
        assert_eq!(state, before);
        assert_eq!(tick(&mut state, Metric::Inflation, T0 + 10_000_000, &cfg), None);
        assert_eq!(state, before);
    }

    #[test]
    fn settle_sums_to_single_catch_up_inflation() {
        let cfg = ProgressionConfig::default();
        let end = T0 + 11 * cfg.inflation.interval_ms + 7_777;

        let mut once = fresh(&cfg);
        settle(&mut once, end, &cfg);

        let mut stepped = fresh(&cfg);
        let mut now = T0;
        while now < end {
            now = (now + 4_999).min(end);
            settle(&mut stepped, now, &cfg);
        }
        assert_eq!(stepped.inflation_level, once.inflation_level);
        assert_eq!(stepped.feed_cost, once.feed_cost);
        assert_eq!(
            once.feed_cost,
            cfg.base_feed_cost + once.inflation_level * cfg.inflation.feed_increase
        );
    }

    #[test]
    fn metric_names_parse() {
        assert_eq!("rent".parse::<Metric>(), Ok(Metric::Bill(BillKind::Rent)));
        assert_eq!(
            "medicalBill".parse::<Metric>(),
            Ok(Metric::Bill(BillKind::MedicalBill))
        );
        assert_eq!("energy".parse::<Metric>(), Ok(Metric::Need(NeedStat::Energy)));
        assert_eq!("inflation".parse::<Metric>(), Ok(Metric::Inflation));
        assert!("taxes".parse::<Metric>().is_err());
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>(), Ok(metric));
        }
    }
}
