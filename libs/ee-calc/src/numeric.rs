//! Numeric helpers shared by all calculators
//!
//! Everything here is pure. Helpers that can hit a division by zero or a
//! non-finite result return `Option<f64>` so the caller decides whether the
//! quantity is reported as undefined or rejected as invalid input.

use crate::error::{CalcError, Result};

/// Reference temperature for ratings and temperature coefficients (°C)
pub const REFERENCE_TEMP_C: f64 = 25.0;

/// Tolerance used when comparing a demanded value against a physical limit
pub const LIMIT_EPSILON: f64 = 1e-12;

/// Clamp a value to a range
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

/// Clamp a value from below
pub fn floor_at(value: f64, floor: f64) -> f64 {
    if value < floor {
        floor
    } else {
        value
    }
}

/// Keep a value only if it is finite
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Reject a non-finite value with an error naming the quantity
pub fn require_finite(name: &str, value: f64) -> Result<f64> {
    finite(value).ok_or_else(|| {
        CalcError::invalid_input(format!("{} is not a finite number ({})", name, value))
    })
}

/// Division that yields `None` for a zero denominator or a non-finite quotient
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

/// `numerator / denominator * 100`, defined only for a strictly positive denominator
pub fn percent_of(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        safe_div(numerator, denominator).and_then(|r| finite(r * 100.0))
    } else {
        None
    }
}

/// Root of the sum of squares
pub fn root_sum_square(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// `sqrt(max(0, a² - b²))`, the quadrature component left after removing `b` from `a`
pub fn quadrature_remainder(a: f64, b: f64) -> f64 {
    floor_at(a * a - b * b, 0.0).sqrt()
}

/// Amplitude ratio in dB, defined only when both terms are strictly positive
pub fn amplitude_db(signal: f64, reference: f64) -> Option<f64> {
    if signal > 0.0 && reference > 0.0 {
        finite(20.0 * (signal / reference).log10())
    } else {
        None
    }
}

/// Linear temperature correction around 25 °C with a coefficient in ppm/°C
pub fn ppm_temperature_factor(tcr_ppm: f64, temp_c: f64) -> f64 {
    1.0 + tcr_ppm * 1e-6 * (temp_c - REFERENCE_TEMP_C)
}

/// Scale a value by `1 ± percent/100`
pub fn tolerance_bounds(value: f64, tolerance_pct: f64) -> (f64, f64) {
    (
        value * (1.0 - tolerance_pct / 100.0),
        value * (1.0 + tolerance_pct / 100.0),
    )
}

/// Every combination of lower/upper bounds for `N` independent sources
///
/// Yields `2^N` points; bit `i` of the corner index selects the upper bound
/// of source `i`. Used for worst-case analysis where the expression is not
/// monotonic in the same direction for every source.
pub fn corners<const N: usize>(bounds: [(f64, f64); N]) -> impl Iterator<Item = [f64; N]> {
    (0..1usize << N).map(move |mask| {
        let mut point = [0.0; N];
        for (i, (lo, hi)) in bounds.iter().enumerate() {
            point[i] = if (mask >> i) & 1 == 1 { *hi } else { *lo };
        }
        point
    })
}

/// Round to specified decimal places
pub fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
