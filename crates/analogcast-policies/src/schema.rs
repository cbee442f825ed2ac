// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[non_exhaustive]
pub enum ConfigSchemaVersion {
    #[default]
    #[serde(rename = "1")]
    V1,
}

impl ConfigSchemaVersion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
        }
    }
}

/// How a window is rescaled before DTW. Parameters always come from the
/// window itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    None,
    #[default]
    #[serde(rename = "minmax")]
    MinMax,
    #[serde(rename = "zscore")]
    ZScore,
}

impl NormalizationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MinMax => "minmax",
            Self::ZScore => "zscore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightingPolicy {
    #[default]
    Equal,
    InverseDistance,
}

impl WeightingPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::InverseDistance => "inverse_distance",
        }
    }
}

/// What happens to a horizon when some analogs have no observed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartialHorizonPolicy {
    /// Any missing member makes the horizon unavailable.
    RequireComplete,
    /// Missing members are dropped and the rest reweighted to sum 1; the
    /// horizon is unavailable only when every member lacks it.
    #[default]
    Renormalize,
}

impl PartialHorizonPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequireComplete => "require_complete",
            Self::Renormalize => "renormalize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ForecastConfig {
    pub schema_version: ConfigSchemaVersion,
    pub window_length: usize,
    pub k: usize,
    pub horizon_count: u32,
    pub reported_horizons: Vec<u32>,
    pub exclude_self: bool,
    pub require_continuation: bool,
    pub normalization: NormalizationMode,
    pub dtw_band: Option<usize>,
    pub weighting: WeightingPolicy,
    pub partial_horizons: PartialHorizonPolicy,
    pub index_cap: f64,
    pub band_thresholds: [f64; 2],
    pub intervals: Vec<f64>,
    pub exceedance_thresholds: Vec<f64>,
    pub max_exported_matches: usize,
    pub snapshot_version: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            schema_version: ConfigSchemaVersion::V1,
            window_length: 6,
            k: 8,
            horizon_count: 6,
            reported_horizons: vec![1, 3, 6],
            exclude_self: true,
            require_continuation: true,
            normalization: NormalizationMode::MinMax,
            dtw_band: None,
            weighting: WeightingPolicy::Equal,
            partial_horizons: PartialHorizonPolicy::Renormalize,
            index_cap: 1000.0,
            band_thresholds: [33.0, 66.0],
            intervals: vec![0.5, 0.8, 0.95],
            exceedance_thresholds: vec![1.0, 25.0, 100.0],
            max_exported_matches: 4,
            snapshot_version: "1".to_string(),
        }
    }
}
