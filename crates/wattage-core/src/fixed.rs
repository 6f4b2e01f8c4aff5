use fixed::types::I32F32;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for tick accumulators and upgrade multipliers so that repeated
/// small additions stay deterministic across platforms.
pub type Fixed64 = I32F32;

/// Elapsed time in seconds, fixed-point.
pub type Seconds = Fixed64;

/// Token amounts are stored as integers scaled by this factor (micro-units).
pub const MICRO_SCALE: i64 = 1_000_000;

/// Convert an f64 to Fixed64. Use only for initialization, never per tick.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never per tick.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert a decimal token amount to micro-units, flooring toward zero.
///
/// Fractional remainder below 1e-6 is discarded; amounts outside the i64
/// micro-unit range saturate.
pub fn micro_from_decimal(amount: Decimal) -> i64 {
    let scaled = (amount * Decimal::from(MICRO_SCALE)).trunc();
    scaled.to_i64().unwrap_or(if scaled.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Convert micro-units back to a decimal token amount. Exact.
pub fn decimal_from_micro(micro: i64) -> Decimal {
    Decimal::new(micro, 6)
}

/// Count the whole `interval` periods contained in `acc`, consume them, and
/// keep the remainder. Supports multi-period catch-up after long pauses.
///
/// A non-positive interval yields 0 so a degenerate config cannot divide by
/// zero or spin.
pub fn drain_periods(acc: &mut Seconds, interval: Seconds) -> i64 {
    if interval <= Seconds::ZERO || *acc < interval {
        return 0;
    }
    let periods = acc.saturating_div(interval).to_num::<i64>();
    *acc -= interval.saturating_mul(Seconds::saturating_from_num(periods));
    if *acc < Seconds::ZERO {
        *acc = Seconds::ZERO;
    }
    periods
}
