//! Seeded QA scenarios driving the engine through `PetSession`.

use anyhow::{Context, Result, bail, ensure};
use labubu_game::schedule::charge_bill;
use labubu_game::{
    Action, BillKind, Clock, ManualClock, MemoryStorage, NeedStat, PetSession, PetState,
    PetStorage, ProgressionConfig, SAVE_KEY, catch_up, load_state,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

use crate::storage::FileStorage;
use crate::util;

const EPOCH_BASE_MS: i64 = 1_700_000_000_000;
const DAY_MS: i64 = 24 * 60 * 60 * 1_000;

pub struct ScenarioCtx {
    pub cfg: ProgressionConfig,
    pub seed: u64,
    pub rng: ChaCha8Rng,
    pub save_root: Option<PathBuf>,
    pub verbose: bool,
}

impl ScenarioCtx {
    pub fn new(
        cfg: ProgressionConfig,
        seed: u64,
        save_root: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            cfg,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            save_root,
            verbose,
        }
    }

    /// Seeded start time, so runs land at different phases of the inflation epoch.
    fn start_ms(&mut self) -> i64 {
        EPOCH_BASE_MS + self.rng.gen_range(0..DAY_MS)
    }

    fn storage_dir(&self, scenario: &str) -> PathBuf {
        let base = self
            .save_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("labubu-tester"));
        util::save_dir(&base, scenario, self.seed)
    }
}

type ScenarioFn = fn(&mut ScenarioCtx) -> Result<String>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[Scenario] = &[
    Scenario {
        name: "smoke",
        description: "Every action once on a fresh pet",
        run: smoke,
    },
    Scenario {
        name: "catch-up-equivalence",
        description: "Watched pet and reloaded pet agree after the same span",
        run: catch_up_equivalence,
    },
    Scenario {
        name: "billing",
        description: "Bills charged in pieces match one charge and keep their phase",
        run: billing,
    },
    Scenario {
        name: "neglect",
        description: "Pet left alone for hours collapses and stays collapsed",
        run: neglect,
    },
    Scenario {
        name: "caretaker",
        description: "Rule-based caretaker plays for fifteen minutes under invariant checks",
        run: caretaker,
    },
    Scenario {
        name: "persistence",
        description: "File-backed save survives a restart and catches up exactly",
        run: persistence,
    },
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|scenario| (scenario.name, scenario.description))
        .collect()
}

pub fn get_scenario(name: &str) -> Option<Scenario> {
    CATALOG.iter().find(|scenario| scenario.name == name).copied()
}

pub fn all_scenario_names() -> Vec<String> {
    CATALOG.iter().map(|scenario| scenario.name.to_string()).collect()
}

type MemorySession = PetSession<MemoryStorage, ManualClock>;

fn memory_session(ctx: &mut ScenarioCtx) -> Result<(MemorySession, ManualClock)> {
    let clock = ManualClock::new(ctx.start_ms());
    let session = PetSession::start(MemoryStorage::default(), clock.clone(), ctx.cfg.clone())
        .context("starting in-memory session")?;
    Ok((session, clock))
}

fn check_invariants(state: &PetState, cfg: &ProgressionConfig) -> Result<()> {
    for stat in NeedStat::ALL {
        let value = state.stat(stat);
        ensure!((0..=100).contains(&value), "{stat} out of range: {value}");
    }
    ensure!(state.inflation_level >= 0, "negative inflation level");
    ensure!(
        state.feed_cost == cfg.feed_cost_at(state.inflation_level),
        "feed cost {} does not match level {}",
        state.feed_cost,
        state.inflation_level
    );
    ensure!(
        state.play_cost == cfg.play_cost_at(state.inflation_level),
        "play cost {} does not match level {}",
        state.play_cost,
        state.inflation_level
    );
    Ok(())
}

fn smoke(ctx: &mut ScenarioCtx) -> Result<String> {
    let (mut session, clock) = memory_session(ctx)?;
    let cfg = ctx.cfg.clone();
    let tuning = &cfg.actions;

    let money = session.state().money;
    ensure!(session.apply(Action::Feed)?.is_applied(), "feed rejected on a fresh pet");
    ensure!(
        session.state().money == money - cfg.base_feed_cost,
        "feed charged {} instead of {}",
        money - session.state().money,
        cfg.base_feed_cost
    );

    let money = session.state().money;
    ensure!(session.apply(Action::Work)?.is_applied(), "work rejected on a fresh pet");
    ensure!(
        session.state().money == money + tuning.work_earnings,
        "work paid the wrong amount"
    );

    ensure!(session.apply(Action::Play)?.is_applied(), "play rejected");
    ensure!(session.apply(Action::Clean)?.is_applied(), "clean rejected");
    ensure!(session.apply(Action::Sleep)?.is_applied(), "sleep rejected");
    ensure!(
        !session.apply(Action::Feed)?.is_applied(),
        "feed accepted while sleeping"
    );

    clock.advance(tuning.sleeping_ms);
    session.advance()?;
    ensure!(
        session.state().energy == labubu_game::constants::SLEEP_RESTORED_ENERGY,
        "energy {} after waking",
        session.state().energy
    );
    check_invariants(session.state(), &cfg)?;
    Ok(format!("money {}", session.state().money))
}

fn catch_up_equivalence(ctx: &mut ScenarioCtx) -> Result<String> {
    let (mut watched, clock) = memory_session(ctx)?;
    let start = clock.now_ms();
    let span = ctx.rng.gen_range(0..6 * 60 * 1_000);

    while clock.now_ms() < start + span {
        let step = ctx.rng.gen_range(1..=3_000).min(start + span - clock.now_ms());
        clock.advance(step);
        watched.advance()?;
    }

    let mut reloaded = PetState::new(start, &ctx.cfg);
    let report = catch_up(&mut reloaded, start + span, &ctx.cfg);
    ensure!(
        report.died == watched.is_game_over(),
        "watched pet dead: {}, reloaded pet dead: {}",
        watched.is_game_over(),
        report.died
    );

    // A living pet is stamped at its last timer fire when watched, at the reload time otherwise.
    let mut live = watched.state().clone();
    if !live.is_game_over() {
        live.last_updated = reloaded.last_updated;
    }
    ensure!(live == reloaded, "watched {live:?} vs reloaded {reloaded:?}");
    let fate = if report.died { "collapsed" } else { "alive" };
    Ok(format!("span {span}ms, {fate}"))
}

fn billing(ctx: &mut ScenarioCtx) -> Result<String> {
    let start = ctx.start_ms();
    let cfg = ctx.cfg.clone();
    let end = start + ctx.rng.gen_range(0..DAY_MS);

    let mut whole = PetState::new(start, &cfg);
    let mut pieces = PetState::new(start, &cfg);
    for bill in BillKind::ALL {
        charge_bill(&mut whole, bill, end, &cfg);
    }
    let mut now = start;
    let mut chunks = 0;
    while now < end {
        now = (now + ctx.rng.gen_range(1..10 * 60 * 1_000)).min(end);
        for bill in BillKind::ALL {
            charge_bill(&mut pieces, bill, now, &cfg);
        }
        chunks += 1;
    }

    ensure!(pieces.money == whole.money, "money {} vs {}", pieces.money, whole.money);
    ensure!(pieces.last_rent_paid == whole.last_rent_paid, "rent phase drifted");
    ensure!(
        pieces.last_medical_bill_paid == whole.last_medical_bill_paid,
        "medical phase drifted"
    );
    for bill in BillKind::ALL {
        let paid_through = match bill {
            BillKind::Rent => whole.last_rent_paid,
            BillKind::MedicalBill => whole.last_medical_bill_paid,
        };
        let lag = end - paid_through;
        ensure!(
            (0..bill.rule(&cfg).interval_ms).contains(&lag),
            "{bill} paid-through lags by {lag}ms"
        );
    }
    Ok(format!("{chunks} chunks, charged {}", cfg.starting_money - whole.money))
}

fn neglect(ctx: &mut ScenarioCtx) -> Result<String> {
    let storage = MemoryStorage::default();
    let clock = ManualClock::new(ctx.start_ms());
    {
        let _session: MemorySession =
            PetSession::start(storage.clone(), clock.clone(), ctx.cfg.clone())?;
    }
    let hours = ctx.rng.gen_range(1..48);
    clock.advance(hours * 60 * 60 * 1_000);

    let mut session: MemorySession =
        PetSession::start(storage.clone(), clock.clone(), ctx.cfg.clone())?;
    ensure!(session.is_game_over(), "pet survived {hours}h alone");
    ensure!(session.catch_up_report().died, "catch-up did not report the collapse");
    ensure!(session.scheduled_tasks() == 0, "timers still running after game over");
    for action in Action::ALL {
        ensure!(!session.apply(action)?.is_applied(), "{action} accepted after game over");
    }

    clock.advance(DAY_MS);
    let again: MemorySession = PetSession::start(storage, clock, ctx.cfg.clone())?;
    ensure!(again.is_game_over(), "game over did not survive a reload");
    ensure!(again.catch_up_report().frozen, "dead pet was advanced on reload");
    ensure!(again.state() == session.state(), "reload changed a dead pet");
    let cause = again
        .state()
        .collapse_cause()
        .map_or_else(|| "unknown".to_string(), |cause| cause.to_string());
    Ok(format!("{hours}h alone, {cause}"))
}

fn choose_action(
    state: &PetState,
    rng: &mut ChaCha8Rng,
    cfg: &ProgressionConfig,
) -> Option<Action> {
    // A little noise keeps runs from different seeds apart.
    if rng.gen_bool(0.6) {
        return None;
    }
    if state.energy < 25 {
        return Some(Action::Sleep);
    }
    if state.hunger < 60 && state.money >= state.feed_cost {
        return Some(Action::Feed);
    }
    let short_on_rent = state.money < state.feed_cost + cfg.rent.cost;
    if short_on_rent && state.energy >= cfg.actions.work_min_energy {
        return Some(Action::Work);
    }
    if state.hygiene < 50 {
        return Some(Action::Clean);
    }
    if state.happiness < 50 && state.money >= state.play_cost + cfg.rent.cost {
        return Some(Action::Play);
    }
    None
}

fn caretaker(ctx: &mut ScenarioCtx) -> Result<String> {
    let (mut session, clock) = memory_session(ctx)?;
    let cfg = ctx.cfg.clone();
    let start = clock.now_ms();
    let horizon = 15 * 60 * 1_000;
    let mut actions = 0;

    while clock.now_ms() < start + horizon {
        clock.advance(1_000);
        let was_over = session.is_game_over();
        session.advance()?;
        if let Some(action) = choose_action(session.state(), &mut ctx.rng, &cfg)
            && session.apply(action)?.is_applied()
        {
            actions += 1;
        }
        check_invariants(session.state(), &cfg)?;
        if was_over {
            ensure!(session.is_game_over(), "pet came back from game over");
        }
        if session.is_game_over() {
            ensure!(session.scheduled_tasks() == 0, "timers still running after game over");
            let survived = (clock.now_ms() - start) / 1_000;
            return Ok(format!("collapsed after {survived}s and {actions} actions"));
        }
    }
    if ctx.verbose {
        log::info!("caretaker finished alive: {:?}", session.state());
    }
    Ok(format!(
        "alive after {}s, {actions} actions, money {}",
        horizon / 1_000,
        session.state().money
    ))
}

fn persistence(ctx: &mut ScenarioCtx) -> Result<String> {
    let dir = ctx.storage_dir("persistence");
    let storage = FileStorage::new(&dir);
    let clock = ManualClock::new(ctx.start_ms());
    {
        let mut session: PetSession<FileStorage, ManualClock> =
            PetSession::start(storage.clone(), clock.clone(), ctx.cfg.clone())
                .with_context(|| format!("starting file session in {}", dir.display()))?;
        session.apply(Action::Feed)?;
        clock.advance(ctx.rng.gen_range(0..20_000));
        session.advance()?;
        session.apply(Action::Work)?;
    }
    let Some(raw) = storage.read(SAVE_KEY)? else {
        bail!("no save written to {}", storage.path_for(SAVE_KEY).display());
    };

    clock.advance(ctx.rng.gen_range(0..10 * 60 * 1_000));
    let now = clock.now_ms();
    let mut expected = load_state(Some(&raw), now, &ctx.cfg);
    let report = catch_up(&mut expected, now, &ctx.cfg);

    let session: PetSession<FileStorage, ManualClock> =
        PetSession::start(storage.clone(), clock.clone(), ctx.cfg.clone())?;
    ensure!(
        session.state() == &expected,
        "restarted state differs from catch-up of the saved snapshot"
    );
    ensure!(
        session.catch_up_report().elapsed_ms == report.elapsed_ms,
        "catch-up window mismatch"
    );
    storage.remove(SAVE_KEY)?;
    Ok(format!("offline {}ms", report.elapsed_ms))
}
