use labubu_game::snapshot::merge_value;
use labubu_game::{NeedStat, PetState, ProgressionConfig, load_state, serialize};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Value, json};

const T0: i64 = 1_700_000_000_000;

#[test]
fn pre_economy_snapshot_is_upgraded() {
    let cfg = ProgressionConfig::default();
    let raw = r#"{"hunger":62,"happiness":48,"hygiene":90,"energy":33,"lastUpdated":1699999990000}"#;
    let state = load_state(Some(raw), T0, &cfg);
    assert_eq!(state.hunger, 62);
    assert_eq!(state.happiness, 48);
    assert_eq!(state.last_updated, 1_699_999_990_000);
    assert_eq!(state.money, cfg.starting_money);
    assert_eq!(state.last_rent_paid, T0);
    assert_eq!(state.last_medical_bill_paid, T0);
    assert_eq!(state.feed_cost, cfg.base_feed_cost);
    assert_eq!(state.play_cost, cfg.base_play_cost);
}

#[test]
fn stale_costs_are_recomputed_from_level() {
    let cfg = ProgressionConfig::default();
    let snapshot = json!({
        "hunger": 80, "happiness": 80, "hygiene": 80, "energy": 80,
        "money": 120, "lastUpdated": T0, "lastRentPaid": T0, "lastMedicalBillPaid": T0,
        "inflationLevel": 3, "feedCost": 10, "playCost": 5,
    });
    let state = merge_value(&snapshot, T0, &cfg);
    assert_eq!(state.inflation_level, 3);
    assert_eq!(state.feed_cost, 16);
    assert_eq!(state.play_cost, 8);
}

#[test]
fn negative_inflation_level_is_floored() {
    let cfg = ProgressionConfig::default();
    let state = merge_value(&json!({ "inflationLevel": -4 }), T0, &cfg);
    assert_eq!(state.inflation_level, 0);
    assert_eq!(state.feed_cost, cfg.base_feed_cost);
}

#[test]
fn serialized_state_reloads_unchanged() {
    let cfg = ProgressionConfig::default();
    for seed in 0..32 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = PetState::new(T0 - rng.gen_range(0..1_000_000), &cfg);
        for stat in NeedStat::ALL {
            state.set_stat(stat, rng.gen_range(0..=100));
        }
        state.money = rng.gen_range(-50..1_000);
        state.last_rent_paid = T0 - rng.gen_range(0..60_000);
        state.last_medical_bill_paid = T0 - rng.gen_range(0..90_000);
        state.inflation_level = rng.gen_range(0..40);
        state.recompute_costs(&cfg);

        let raw = serialize(&state);
        let parsed: Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(parsed["lastMedicalBillPaid"], json!(state.last_medical_bill_paid));
        assert_eq!(load_state(Some(&raw), T0, &cfg), state, "seed {seed}");
    }
}

#[test]
fn unreadable_snapshot_starts_fresh() {
    let cfg = ProgressionConfig::default();
    for raw in ["", "null", "not json", "42", "\"text\""] {
        assert_eq!(load_state(Some(raw), T0, &cfg), PetState::new(T0, &cfg), "{raw:?}");
    }
}
