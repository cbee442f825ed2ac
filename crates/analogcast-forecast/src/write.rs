// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use analogcast_core::canonical::stable_json_pretty_bytes;
use analogcast_engine::SeriesStore;
use analogcast_model::{artifact_paths, EntityId, EntityMeta, ForecastSnapshot, Period, RunManifest};
use analogcast_policies::{config_sha256, ForecastConfig};
use analogcast_store::{ArtifactFile, PublishRequest};
use serde::Serialize;

use crate::grid::grid_artifacts;
use crate::pipeline::EntityOutcome;
use crate::snapshot::{build_snapshot, snapshot_csv, PriorSnapshots};
use crate::website::{
    display_keys, history_csv, matches_document, minmax_document, scenarios_document,
};
use crate::ForecastError;

pub(crate) fn json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ForecastError> {
    stable_json_pretty_bytes(value)
        .map_err(|e| ForecastError::internal(format!("encode json: {e}")))
}

/// Everything a run's artifacts are derived from.
#[derive(Debug, Clone, Copy)]
pub struct RunInputs<'a> {
    pub period: Period,
    pub generated_at: &'a str,
    pub config: &'a ForecastConfig,
    pub history_sha256: &'a str,
    pub store: &'a SeriesStore,
    pub metas: &'a BTreeMap<EntityId, EntityMeta>,
    pub outcomes: &'a [EntityOutcome],
    pub prior: &'a PriorSnapshots,
}

#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub snapshot: ForecastSnapshot,
    pub manifest: RunManifest,
    /// Ready to publish; `overwrite` is left unset.
    pub request: PublishRequest,
}

/// Encodes every artifact of a run in memory, then the manifest over their
/// checksums. The snapshot is the last file so it is renamed into place
/// after everything it refers to.
pub fn build_artifacts(inputs: &RunInputs<'_>) -> Result<RunArtifacts, ForecastError> {
    let cfg = inputs.config;
    let paths = artifact_paths(inputs.period);
    let snapshot = build_snapshot(
        inputs.period,
        inputs.generated_at,
        cfg,
        inputs.metas,
        inputs.outcomes,
        inputs.prior,
    )?;
    let keys = display_keys(inputs.store.entities().cloned(), inputs.metas);

    let mut files = vec![
        ArtifactFile::new(
            paths.csv_mirror.clone(),
            snapshot_csv(&snapshot, &cfg.reported_horizons)?,
        ),
        ArtifactFile::new(
            paths.matches.clone(),
            json_bytes(&matches_document(inputs.outcomes, &keys, cfg)?)?,
        ),
        ArtifactFile::new(
            paths.scenarios.clone(),
            json_bytes(&scenarios_document(
                inputs.outcomes,
                &keys,
                inputs.period,
                cfg,
            )?)?,
        ),
        ArtifactFile::new(
            paths.minmax.clone(),
            json_bytes(&minmax_document(inputs.outcomes, &keys)?)?,
        ),
        ArtifactFile::new(
            paths.history_csv.clone(),
            history_csv(inputs.store, &keys)?,
        ),
    ];
    files.extend(grid_artifacts(
        &paths,
        cfg.horizon_count,
        inputs.outcomes,
        inputs.metas,
    )?);
    files.push(ArtifactFile::new(
        paths.snapshot.clone(),
        json_bytes(&snapshot)?,
    ));

    let manifest = RunManifest {
        period: inputs.period,
        generated_at: inputs.generated_at.to_string(),
        config_sha256: config_sha256(cfg)?,
        history_sha256: inputs.history_sha256.to_string(),
        artifacts: files.iter().map(|f| (f.path.clone(), f.sha256())).collect(),
        entity_count: snapshot.entities.len(),
        omitted_count: snapshot.omitted.len(),
    };
    manifest
        .validate_strict()
        .map_err(|e| ForecastError::internal(format!("run manifest is invalid: {e}")))?;
    let request = PublishRequest {
        period: inputs.period,
        files,
        manifest: json_bytes(&manifest)?,
        overwrite: false,
    };
    Ok(RunArtifacts {
        snapshot,
        manifest,
        request,
    })
}
