//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count or index to f64, returning 0.0 if the value cannot be represented.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a position to a signed value for position deltas.
#[must_use]
pub fn position_to_i32(value: usize) -> i32 {
    cast::<usize, i32>(value).unwrap_or(i32::MAX)
}

/// Map a unit draw in [0, 1) onto an index below `len`.
///
/// Returns `None` for an empty range.
#[must_use]
pub fn unit_to_index(unit: f64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let unit = if unit.is_finite() {
        unit.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let scaled = (unit * usize_to_f64(len)).floor();
    let index = cast::<f64, usize>(scaled).unwrap_or(0);
    Some(index.min(len - 1))
}

/// Clamp to the unit interval, returning 0.0 for NaN.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Round a f64 and clamp it to the u8 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, f64::from(u8::MAX)).round();
    cast::<f64, u8>(clamped).unwrap_or(0)
}

/// Floor a non-negative f64 into a u32, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let clamped = value.min(f64::from(u32::MAX)).floor();
    cast::<f64, u32>(clamped).unwrap_or(0)
}
