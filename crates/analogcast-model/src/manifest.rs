// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::month::Period;
use crate::snapshot::validate_timestamp;
use crate::ValidationError;

pub const FORECASTS_DIR: &str = "content/forecasts";
pub const PUBLIC_DATA_DIR: &str = "public/data";
pub const LATEST_SNAPSHOT: &str = "content/forecasts/latest.json";
pub const LATEST_MARKER: &str = "content/forecasts/LATEST";
pub const PUBLISH_LOCK: &str = ".publish.lock";

/// Checksums of everything a run wrote, stored last under
/// `content/forecasts/manifests/<period>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunManifest {
    pub period: Period,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    #[serde(rename = "configSha256")]
    pub config_sha256: String,
    #[serde(rename = "historySha256")]
    pub history_sha256: String,
    /// Relative artifact path to lowercase hex SHA-256.
    pub artifacts: BTreeMap<String, String>,
    #[serde(rename = "entityCount")]
    pub entity_count: usize,
    #[serde(rename = "omittedCount")]
    pub omitted_count: usize,
}

impl RunManifest {
    pub fn validate_strict(&self) -> Result<(), ValidationError> {
        validate_timestamp(&self.generated_at)?;
        check_sha("configSha256", &self.config_sha256)?;
        check_sha("historySha256", &self.history_sha256)?;
        if self.artifacts.is_empty() {
            return Err(ValidationError("run manifest lists no artifacts".to_string()));
        }
        for (path, sha) in &self.artifacts {
            if path.starts_with('/') || path.split('/').any(|part| part == "..") {
                return Err(ValidationError(format!(
                    "artifact path `{path}` must be relative to the output root"
                )));
            }
            check_sha(path, sha)?;
        }
        Ok(())
    }
}

fn check_sha(field: &str, value: &str) -> Result<(), ValidationError> {
    let ok = value.len() == 64
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if ok {
        Ok(())
    } else {
        Err(ValidationError(format!(
            "{field}: `{value}` is not a lowercase sha256 hex digest"
        )))
    }
}

/// Relative (to the output root) locations of every artifact a run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub period: Period,
    pub snapshot: String,
    pub csv_mirror: String,
    pub manifest: String,
    pub matches: String,
    pub scenarios: String,
    pub minmax: String,
    pub history_csv: String,
    pub grid_dir: String,
}

impl ArtifactPaths {
    #[must_use]
    pub fn grid_json(&self, horizon: u32) -> String {
        format!("{}/{}-m{horizon}.json", self.grid_dir, self.period)
    }

    #[must_use]
    pub fn grid_csv(&self, horizon: u32) -> String {
        format!("{}/{}-m{horizon}.csv", self.grid_dir, self.period)
    }

    #[must_use]
    pub fn grid_geojson(&self) -> String {
        format!("{}/{}.geo.json", self.grid_dir, self.period)
    }
}

#[must_use]
pub fn artifact_paths(period: Period) -> ArtifactPaths {
    ArtifactPaths {
        period,
        snapshot: snapshot_path(period),
        csv_mirror: format!("{FORECASTS_DIR}/csv/{period}.csv"),
        manifest: format!("{FORECASTS_DIR}/manifests/{period}.json"),
        matches: format!("{PUBLIC_DATA_DIR}/matches.json"),
        scenarios: format!("{PUBLIC_DATA_DIR}/scenarios.json"),
        minmax: format!("{PUBLIC_DATA_DIR}/minmax.json"),
        history_csv: format!("{PUBLIC_DATA_DIR}/hist.csv"),
        grid_dir: format!("{PUBLIC_DATA_DIR}/grid"),
    }
}

#[must_use]
pub fn snapshot_path(period: Period) -> String {
    format!("{FORECASTS_DIR}/{period}.json")
}
