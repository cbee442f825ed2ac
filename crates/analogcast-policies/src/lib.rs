// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod limits;
mod load;
mod schema;
mod validate;

pub use limits::{
    MAX_DTW_BAND, MAX_HORIZON_COUNT, MAX_K, MAX_WINDOW_LENGTH, MIN_WINDOW_LENGTH,
};
pub use load::{load_config_from_path, load_effective_config, ConfigSource, WORKSPACE_CONFIG_PATH};
pub use schema::{
    ConfigSchemaVersion, ForecastConfig, NormalizationMode, PartialHorizonPolicy, WeightingPolicy,
};
pub use validate::{
    canonical_config_json, config_sha256, validate_forecast_config, PolicyValidationError,
};

pub const CRATE_NAME: &str = "analogcast-policies";
