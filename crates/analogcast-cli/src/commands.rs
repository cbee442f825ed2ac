// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use analogcast_core::{resolve_config_path, ConfigPathScope, ErrorCode};
use analogcast_engine::{retrieve, window, Archive, Dtw, RetrievalQuery};
use analogcast_forecast::{
    decode_history, read_history, run_forecast, ForecastOptions, TimestampPolicy,
};
use analogcast_model::{EntityId, ForecastSnapshot, Month};
use analogcast_policies::config_sha256;
use analogcast_store::{ArtifactStore, LocalFsStore};
use serde_json::json;
use tracing::warn;

use crate::helpers::{current_dir, effective_config, emit_ok};
use crate::{CliError, OutputMode};

pub(crate) struct ForecastCliArgs {
    pub(crate) history: PathBuf,
    pub(crate) entities: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) output_root: PathBuf,
    pub(crate) period: Option<Month>,
    pub(crate) generated_at: Option<String>,
    pub(crate) deterministic_time: bool,
    pub(crate) max_threads: Option<usize>,
    pub(crate) overwrite: bool,
}

pub(crate) fn run_forecast_command(
    args: ForecastCliArgs,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let (config, source) = effective_config(args.config.as_deref())?;
    let timestamp_policy = match (args.generated_at, args.deterministic_time) {
        (Some(stamp), _) => TimestampPolicy::Fixed(stamp),
        (None, true) => TimestampPolicy::DeterministicZero,
        (None, false) => TimestampPolicy::WallClock,
    };
    let result = run_forecast(&ForecastOptions {
        history_path: args.history,
        entities_path: args.entities,
        output_root: args.output_root,
        config,
        period: args.period,
        timestamp_policy,
        max_threads: args.max_threads,
        overwrite: args.overwrite,
    })?;
    if !result.latest_moved {
        warn!(period = %result.period, "a newer period is already latest; pointer kept");
    }
    emit_ok(
        output_mode,
        &json!({
            "command": "forecast",
            "status": "ok",
            "period": result.period,
            "generated_at": result.generated_at,
            "config_source": source.label(),
            "snapshot": result.snapshot_path,
            "manifest": result.manifest_path,
            "entities": result.snapshot.entities.len(),
            "omitted": result.snapshot.omitted,
            "skipped_columns": result.skipped_columns,
            "latest_moved": result.latest_moved,
        }),
    )
}

pub(crate) fn run_dtw(
    a: &[f64],
    b: &[f64],
    band: Option<usize>,
    with_path: bool,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let dtw = Dtw::new(band);
    let payload = if with_path {
        let alignment = dtw.alignment(a, b)?;
        json!({
            "distance": alignment.distance,
            "band": band,
            "path": alignment.path,
        })
    } else {
        json!({
            "distance": dtw.distance(a, b)?,
            "band": band,
        })
    };
    emit_ok(output_mode, &payload)
}

pub(crate) fn run_matches(
    history: PathBuf,
    entity: &EntityId,
    config: Option<PathBuf>,
    end: Option<Month>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let (cfg, _) = effective_config(config.as_deref())?;
    let decoded = decode_history(&read_history(&history)?)?;
    let store = decoded.store;
    let series = store.get(entity)?;
    let end = end.unwrap_or_else(|| series.end());
    let target = window(series, end, cfg.window_length, cfg.normalization)?;
    let archive = Archive::build(&store, cfg.window_length, cfg.normalization)?;
    let set = retrieve(
        &store,
        &archive,
        &target,
        &RetrievalQuery::from_config(&cfg),
        &Dtw::new(cfg.dtw_band),
    )?;
    let matches: Vec<_> = set
        .matches
        .iter()
        .map(|m| {
            json!({
                "entity": m.entity,
                "start": m.start,
                "end": m.end,
                "distance": m.distance,
                "values": m.values,
            })
        })
        .collect();
    emit_ok(
        output_mode,
        &json!({
            "target": {
                "entity": set.target_entity,
                "start": set.target_start,
                "end": set.target_end,
                "values": target.raw,
            },
            "k": set.k,
            "band": set.band,
            "archive_windows": archive.len(),
            "matches": matches,
        }),
    )
}

pub(crate) fn validate_snapshot(path: PathBuf, output_mode: OutputMode) -> Result<(), CliError> {
    let raw = fs::read(&path).map_err(|e| {
        let code = if e.kind() == ErrorKind::NotFound {
            ErrorCode::NotFound
        } else {
            ErrorCode::Io
        };
        CliError::from_code(code, format!("read snapshot {} failed: {e}", path.display()))
    })?;
    let snapshot: ForecastSnapshot = serde_json::from_slice(&raw).map_err(|e| {
        CliError::from_code(
            ErrorCode::InvalidInput,
            format!("parse snapshot {} failed: {e}", path.display()),
        )
    })?;
    snapshot.validate_strict()?;
    emit_ok(
        output_mode,
        &json!({
            "command": "snapshot validate",
            "status": "ok",
            "path": path,
            "version": snapshot.version,
            "period": snapshot.period,
            "entities": snapshot.entities.len(),
            "omitted": snapshot.omitted.len(),
        }),
    )
}

pub(crate) fn run_latest(output_root: PathBuf, output_mode: OutputMode) -> Result<(), CliError> {
    let store = LocalFsStore::new(output_root.clone());
    let period = store.read_latest_period()?.ok_or_else(|| {
        CliError::from_code(
            ErrorCode::NotFound,
            format!("no period published under {}", output_root.display()),
        )
    })?;
    emit_ok(
        output_mode,
        &json!({
            "latest": period,
            "periods": store.list_periods()?,
        }),
    )
}

pub(crate) fn run_config(config: Option<PathBuf>, output_mode: OutputMode) -> Result<(), CliError> {
    let (cfg, source) = effective_config(config.as_deref())?;
    let encoded = serde_json::to_value(&cfg).map_err(|e| CliError::internal(e.to_string()))?;
    emit_ok(
        output_mode,
        &json!({
            "source": source.label(),
            "path": source.path(),
            "config_sha256": config_sha256(&cfg)?,
            "config": encoded,
            "workspace_config": current_dir()?.join(resolve_config_path(ConfigPathScope::Workspace)),
            "user_config": resolve_config_path(ConfigPathScope::User),
        }),
    )
}
