//! Stateless JS exports of the progression functions.
//!
//! States cross the boundary as plain objects in the persisted snapshot shape.
//! Incoming objects go through the same lenient merge as stored snapshots.

use labubu_game::numbers::f64_to_i64;
use labubu_game::snapshot::merge_value;
use labubu_game::{
    Action, ActionOutcome, ActionTimers, CatchUpReport, Metric, PetState, ProgressionConfig,
    ProgressionEvent, Rejection,
};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(Into::into)
}

fn millis(now: f64) -> Result<i64, JsValue> {
    f64_to_i64(now).ok_or_else(|| JsValue::from_str("timestamp must be a finite number"))
}

/// Exports without a `now` argument stamp missing fields with the JS clock.
fn wall_clock() -> Result<i64, JsValue> {
    millis(crate::dom::now_ms())
}

fn state_from_js(
    value: JsValue,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Result<PetState, JsValue> {
    let json: Value = serde_wasm_bindgen::from_value(value)?;
    Ok(state_from_json(&json, now_ms, cfg))
}

/// Merge an incoming state object. Missing bill and update stamps become `now_ms`.
#[must_use]
pub fn state_from_json(json: &Value, now_ms: i64, cfg: &ProgressionConfig) -> PetState {
    merge_value(json, now_ms, cfg)
}

/// Fire the timer named `metric`. Unknown names leave the state untouched.
pub fn tick_named(
    state: &mut PetState,
    metric: &str,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> Option<ProgressionEvent> {
    match metric.parse::<Metric>() {
        Ok(metric) => labubu_game::tick(state, metric, now_ms, cfg),
        Err(()) => {
            log::debug!("ignoring unknown metric {metric:?}");
            None
        }
    }
}

/// What `applyAction` reports next to the updated state and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionReply {
    pub applied: bool,
    pub rejection: Option<Rejection>,
    /// Milliseconds-since-epoch at which sleep completes, if one was started.
    pub wake_at: Option<i64>,
}

/// Apply the action named `action`. Unknown names are ignored like any other
/// rejected action.
pub fn apply_named(
    state: &mut PetState,
    timers: &mut ActionTimers,
    action: &str,
    now_ms: i64,
    cfg: &ProgressionConfig,
) -> ActionReply {
    let Ok(action) = action.parse::<Action>() else {
        log::debug!("ignoring unknown action {action:?}");
        return ActionReply {
            applied: false,
            rejection: None,
            wake_at: None,
        };
    };
    match labubu_game::apply_action(state, timers, action, now_ms, cfg) {
        ActionOutcome::Applied { follow_up, .. } => ActionReply {
            applied: true,
            rejection: None,
            wake_at: follow_up.map(|task| task.fire_at),
        },
        ActionOutcome::Rejected { reason, .. } => ActionReply {
            applied: false,
            rejection: Some(reason),
            wake_at: None,
        },
    }
}

fn timers_from_js(value: JsValue) -> ActionTimers {
    serde_wasm_bindgen::from_value(value).unwrap_or_default()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatchUpResult {
    state: PetState,
    report: CatchUpReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TickResult {
    state: PetState,
    event: Option<ProgressionEvent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResult {
    state: PetState,
    timers: ActionTimers,
    applied: bool,
    rejection: Option<Rejection>,
    wake_at: Option<i64>,
}

#[wasm_bindgen(js_name = newState)]
pub fn new_state(now: f64) -> Result<JsValue, JsValue> {
    let cfg = ProgressionConfig::default();
    to_js(&labubu_game::new_state(millis(now)?, &cfg))
}

#[wasm_bindgen(js_name = loadState)]
pub fn load_state(raw: Option<String>, now: f64) -> Result<JsValue, JsValue> {
    let cfg = ProgressionConfig::default();
    to_js(&labubu_game::load_state(raw.as_deref(), millis(now)?, &cfg))
}

#[wasm_bindgen(js_name = catchUp)]
pub fn catch_up(state: JsValue, now: f64) -> Result<JsValue, JsValue> {
    let cfg = ProgressionConfig::default();
    let now_ms = millis(now)?;
    let mut state = state_from_js(state, now_ms, &cfg)?;
    let report = labubu_game::catch_up(&mut state, now_ms, &cfg);
    to_js(&CatchUpResult { state, report })
}

#[wasm_bindgen]
pub fn tick(state: JsValue, metric: &str, now: f64) -> Result<JsValue, JsValue> {
    let cfg = ProgressionConfig::default();
    let now_ms = millis(now)?;
    let mut state = state_from_js(state, now_ms, &cfg)?;
    let event = tick_named(&mut state, metric, now_ms, &cfg);
    to_js(&TickResult { state, event })
}

#[wasm_bindgen(js_name = applyAction)]
pub fn apply_action(
    state: JsValue,
    timers: JsValue,
    action: &str,
    now: f64,
) -> Result<JsValue, JsValue> {
    let cfg = ProgressionConfig::default();
    let now_ms = millis(now)?;
    let mut state = state_from_js(state, now_ms, &cfg)?;
    let mut timers = timers_from_js(timers);
    let reply = apply_named(&mut state, &mut timers, action, now_ms, &cfg);
    to_js(&ActionResult {
        state,
        timers,
        applied: reply.applied,
        rejection: reply.rejection,
        wake_at: reply.wake_at,
    })
}

#[wasm_bindgen(js_name = completeSleep)]
pub fn complete_sleep(state: JsValue, now: f64) -> Result<JsValue, JsValue> {
    let cfg = ProgressionConfig::default();
    let mut state = state_from_js(state, millis(now)?, &cfg)?;
    labubu_game::complete_sleep(&mut state);
    to_js(&state)
}

#[wasm_bindgen(js_name = isGameOver)]
pub fn is_game_over(state: JsValue) -> Result<bool, JsValue> {
    let cfg = ProgressionConfig::default();
    let state = state_from_js(state, wall_clock()?, &cfg)?;
    Ok(labubu_game::is_game_over(&state))
}

#[wasm_bindgen]
pub fn serialize(state: JsValue) -> Result<String, JsValue> {
    let cfg = ProgressionConfig::default();
    let state = state_from_js(state, wall_clock()?, &cfg)?;
    Ok(labubu_game::serialize(&state))
}

#[wasm_bindgen(js_name = visualState)]
pub fn visual_state(
    is_game_over: bool,
    timers: JsValue,
    state: JsValue,
) -> Result<String, JsValue> {
    let cfg = ProgressionConfig::default();
    let state = state_from_js(state, wall_clock()?, &cfg)?;
    let timers = timers_from_js(timers);
    Ok(labubu_game::visual_state(is_game_over, &timers, &state).to_string())
}

#[wasm_bindgen(js_name = statLevel)]
#[must_use]
pub fn stat_level(value: i32) -> String {
    labubu_game::stat_level(value).as_str().to_string()
}
