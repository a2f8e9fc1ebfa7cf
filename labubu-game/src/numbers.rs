//! Numeric helpers centralizing the cycle math and safe narrowing casts.

use num_traits::cast::cast;

/// Saturate an i64 into the i32 range.
#[must_use]
pub fn saturate_i64_to_i32(value: i64) -> i32 {
    let clamped = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
    cast::<i64, i32>(clamped).unwrap_or(0)
}

/// Truncate a finite f64 toward zero into i64, returning `None` for NaN/infinite.
#[must_use]
pub fn f64_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    cast::<f64, i64>(value.trunc())
}

/// Whole intervals that fit in `elapsed_ms`. Non-positive inputs yield 0.
#[must_use]
pub const fn whole_cycles(elapsed_ms: i64, interval_ms: i64) -> i64 {
    if elapsed_ms <= 0 || interval_ms <= 0 {
        return 0;
    }
    elapsed_ms / interval_ms
}

/// Epoch-aligned boundaries of `interval_ms` crossed in `(from_ms, to_ms]`.
///
/// Uses floor division so timestamps before the epoch still align.
#[must_use]
pub const fn boundaries_crossed(from_ms: i64, to_ms: i64, interval_ms: i64) -> i64 {
    if to_ms <= from_ms || interval_ms <= 0 {
        return 0;
    }
    to_ms.div_euclid(interval_ms) - from_ms.div_euclid(interval_ms)
}

/// Apply a signed delta to a need-stat and clamp it to `[min, max]`.
#[must_use]
pub fn clamp_stat(value: i32, delta: i64, min: i32, max: i32) -> i32 {
    let next = i64::from(value).saturating_add(delta);
    saturate_i64_to_i32(next.clamp(i64::from(min), i64::from(max)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate_handles_extremes() {
        assert_eq!(saturate_i64_to_i32(i64::MAX), i32::MAX);
        assert_eq!(saturate_i64_to_i32(i64::MIN), i32::MIN);
        assert_eq!(saturate_i64_to_i32(42), 42);
    }

    #[test]
    fn float_conversion_truncates_and_rejects_non_finite() {
        assert_eq!(f64_to_i64(42.9), Some(42));
        assert_eq!(f64_to_i64(-3.7), Some(-3));
        assert_eq!(f64_to_i64(f64::NAN), None);
        assert_eq!(f64_to_i64(f64::INFINITY), None);
    }

    #[test]
    fn whole_cycles_floors_and_ignores_negative() {
        assert_eq!(whole_cycles(25_000, 10_000), 2);
        assert_eq!(whole_cycles(9_999, 10_000), 0);
        assert_eq!(whole_cycles(-5_000, 10_000), 0);
        assert_eq!(whole_cycles(5_000, 0), 0);
    }

    #[test]
    fn boundaries_are_epoch_aligned() {
        // 119s -> 121s crosses the 120s boundary even though only 2s elapsed.
        assert_eq!(boundaries_crossed(119_000, 121_000, 120_000), 1);
        assert_eq!(boundaries_crossed(121_000, 239_000, 120_000), 0);
        assert_eq!(boundaries_crossed(0, 360_000, 120_000), 3);
        assert_eq!(boundaries_crossed(360_000, 0, 120_000), 0);
        assert_eq!(boundaries_crossed(-1, 0, 120_000), 1);
    }

    #[test]
    fn clamp_stat_bounds_both_ends() {
        assert_eq!(clamp_stat(90, 25, 0, 100), 100);
        assert_eq!(clamp_stat(5, -30, 0, 100), 0);
        assert_eq!(clamp_stat(50, i64::MIN, 0, 100), 0);
    }
}
