// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Validated domain types and the document shapes of every artifact the
//! forecaster publishes.
//!
//! ```compile_fail
//! use analogcast_model::Band;
//!
//! fn exhaustive_match(b: Band) -> &'static str {
//!     match b {
//!         Band::Low => "l",
//!         Band::Medium => "m",
//!     }
//! }
//! ```

mod analogs;
mod entity;
mod grid;
mod manifest;
mod month;
mod snapshot;

pub use analogs::{
    validate_matches, validate_scenarios, EntityScenarios, IntervalSeries, MatchRecord, MatchSeries,
    MatchesDocument, MinMax, MinMaxDocument, ScenarioCluster, ScenarioSource, ScenariosDocument,
    TemporalSummary,
};
pub use entity::{EntityId, EntityMeta, EntityType, ENTITY_ID_MAX_LEN, ENTITY_NAME_MAX_LEN};
pub use grid::{
    grid_property_key, GridFeature, GridFeatureCollection, GridPoint, GridProperties,
    PointGeometry, MAX_GRID_HORIZON,
};
pub use manifest::{
    artifact_paths, snapshot_path, ArtifactPaths, RunManifest, FORECASTS_DIR, LATEST_MARKER,
    LATEST_SNAPSHOT, PUBLIC_DATA_DIR, PUBLISH_LOCK,
};
pub use month::{Month, Period, MAX_YEAR, MIN_YEAR};
pub use snapshot::{
    validate_timestamp, Band, Driver, ForecastSnapshot, HorizonKey, HorizonSummary, Omission,
    OmissionReason, SnapshotEntity, DEFAULT_BAND_THRESHOLDS, SNAPSHOT_VERSION,
};

pub const CRATE_NAME: &str = "analogcast-model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}
