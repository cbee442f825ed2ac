// SPDX-License-Identifier: Apache-2.0

use analogcast_core::canonical::{stable_json_bytes, stable_json_hash_hex};

use crate::limits::{MAX_DTW_BAND, MAX_HORIZON_COUNT, MAX_K, MAX_WINDOW_LENGTH, MIN_WINDOW_LENGTH};
use crate::schema::ForecastConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyValidationError(pub String);

impl std::fmt::Display for PolicyValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PolicyValidationError {}

fn reject(message: impl Into<String>) -> Result<(), PolicyValidationError> {
    Err(PolicyValidationError(message.into()))
}

pub fn validate_forecast_config(cfg: &ForecastConfig) -> Result<(), PolicyValidationError> {
    if !(MIN_WINDOW_LENGTH..=MAX_WINDOW_LENGTH).contains(&cfg.window_length) {
        return reject(format!(
            "window_length must be in {MIN_WINDOW_LENGTH}..={MAX_WINDOW_LENGTH}"
        ));
    }
    if !(1..=MAX_K).contains(&cfg.k) {
        return reject(format!("k must be in 1..={MAX_K}"));
    }
    if !(1..=MAX_HORIZON_COUNT).contains(&cfg.horizon_count) {
        return reject(format!("horizon_count must be in 1..={MAX_HORIZON_COUNT}"));
    }
    if cfg.reported_horizons.first() != Some(&1) {
        return reject("reported_horizons must start with 1");
    }
    if cfg.reported_horizons.windows(2).any(|w| w[0] >= w[1]) {
        return reject("reported_horizons must be strictly increasing");
    }
    if cfg.reported_horizons.iter().any(|h| *h > cfg.horizon_count) {
        return reject(format!(
            "reported_horizons must be within 1..={}",
            cfg.horizon_count
        ));
    }
    if let Some(band) = cfg.dtw_band {
        if band > MAX_DTW_BAND {
            return reject(format!("dtw_band must be <= {MAX_DTW_BAND}"));
        }
    }
    if !cfg.index_cap.is_finite() || cfg.index_cap <= 0.0 {
        return reject("index_cap must be a positive finite number");
    }
    let [low, high] = cfg.band_thresholds;
    if !(low > 0.0 && low < high && high < 100.0) {
        return reject("band_thresholds must be increasing within (0, 100)");
    }
    if cfg.intervals.iter().any(|c| !(*c > 0.0 && *c < 1.0)) {
        return reject("intervals must be coverages within (0, 1)");
    }
    if cfg
        .exceedance_thresholds
        .iter()
        .any(|t| !t.is_finite() || *t < 0.0)
    {
        return reject("exceedance_thresholds must be finite and >= 0");
    }
    if cfg.max_exported_matches == 0 {
        return reject("max_exported_matches must be >= 1");
    }
    if cfg.snapshot_version.trim().is_empty() {
        return reject("snapshot_version must not be empty");
    }
    Ok(())
}

pub fn canonical_config_json(cfg: &ForecastConfig) -> Result<String, PolicyValidationError> {
    let bytes = stable_json_bytes(cfg)
        .map_err(|e| PolicyValidationError(format!("config encode failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| PolicyValidationError(format!("config encode failed: {e}")))
}

/// SHA-256 of the canonical JSON, recorded in every run manifest.
pub fn config_sha256(cfg: &ForecastConfig) -> Result<String, PolicyValidationError> {
    stable_json_hash_hex(cfg).map_err(|e| PolicyValidationError(format!("config hash failed: {e}")))
}
