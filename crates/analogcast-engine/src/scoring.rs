// SPDX-License-Identifier: Apache-2.0

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// Log-scaled 0-100 index of a median fatality count, saturating at
/// `index_cap`.
#[must_use]
pub fn horizon_index(p50: f64, index_cap: f64) -> f64 {
    if !(p50.is_finite() && index_cap > 0.0) {
        return 0.0;
    }
    let raw = 100.0 * p50.max(0.0).ln_1p() / index_cap.ln_1p();
    round_to(raw.clamp(0.0, 100.0), 1)
}

/// `coverage / (1 + relative spread)`, in [0, 1].
#[must_use]
pub fn confidence(coverage: f64, p10: f64, p50: f64, p90: f64) -> f64 {
    let spread = (p90 - p10).max(0.0) / (1.0 + p50.max(0.0));
    let value = coverage.clamp(0.0, 1.0) / (1.0 + spread);
    if value.is_finite() {
        round_to(value, 3)
    } else {
        0.0
    }
}
