// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! One forecast run: decode the history CSV, forecast every entity in
//! parallel, build every artifact in memory, then publish them atomically.

mod decode;
mod grid;
mod job;
mod logging;
mod pipeline;
mod snapshot;
mod timestamp;
mod website;
mod write;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use analogcast_core::{sha256_hex, ErrorCode};
use analogcast_engine::{Archive, EngineError};
use analogcast_model::{ForecastSnapshot, Period, RunManifest, ValidationError};
use analogcast_policies::{validate_forecast_config, ForecastConfig, PolicyValidationError};
use analogcast_store::{ArtifactStore, LocalFsStore, StoreError};
use tracing::{info, info_span, warn};

pub use decode::{decode_history, load_entities, read_history, DecodedHistory};
pub use job::{parallelism_policy, ForecastInputs, ForecastJob};
pub use logging::{ForecastEvent, ForecastLog, ForecastStage};
pub use pipeline::{
    forecast_entities, forecast_entity, EntityForecast, EntityOutcome, ForecastContext,
};
pub use snapshot::{build_snapshot, snapshot_csv, PriorSnapshots};
pub use timestamp::TimestampPolicy;
pub use write::{build_artifacts, RunArtifacts, RunInputs};

use logging::fields;

pub const CRATE_NAME: &str = "analogcast-forecast";

/// Any failure that aborts a run. Per-entity shortfalls are not errors; they
/// become snapshot omissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastError {
    pub code: ErrorCode,
    pub message: String,
}

impl ForecastError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl Display for ForecastError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ForecastError {}

impl From<EngineError> for ForecastError {
    fn from(err: EngineError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<StoreError> for ForecastError {
    fn from(err: StoreError) -> Self {
        Self::new(err.code.as_error_code(), err.message)
    }
}

impl From<PolicyValidationError> for ForecastError {
    fn from(err: PolicyValidationError) -> Self {
        Self::new(ErrorCode::InvalidConfig, err.0)
    }
}

impl From<ValidationError> for ForecastError {
    fn from(err: ValidationError) -> Self {
        Self::invalid(err.0)
    }
}

#[derive(Debug, Clone)]
pub struct ForecastOptions {
    pub history_path: PathBuf,
    /// `entities.json`; entities without metadata fall back to their id.
    pub entities_path: Option<PathBuf>,
    pub output_root: PathBuf,
    pub config: ForecastConfig,
    /// Forecast origin. Defaults to the last month observed in the history.
    pub period: Option<Period>,
    pub timestamp_policy: TimestampPolicy,
    /// `None` uses the global rayon pool.
    pub max_threads: Option<usize>,
    pub overwrite: bool,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            history_path: PathBuf::new(),
            entities_path: None,
            output_root: PathBuf::new(),
            config: ForecastConfig::default(),
            period: None,
            timestamp_policy: TimestampPolicy::DeterministicZero,
            max_threads: None,
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastResult {
    pub period: Period,
    pub generated_at: String,
    pub snapshot_path: PathBuf,
    pub manifest_path: PathBuf,
    pub snapshot: ForecastSnapshot,
    pub manifest: RunManifest,
    /// Whether `latest.json` now points at this period.
    pub latest_moved: bool,
    /// History columns dropped because they held no observation.
    pub skipped_columns: Vec<String>,
    pub events: Vec<ForecastEvent>,
}

pub fn run_forecast(opts: &ForecastOptions) -> Result<ForecastResult, ForecastError> {
    run_forecast_with_events(opts).map(|(result, _)| result)
}

pub fn run_forecast_with_events(
    opts: &ForecastOptions,
) -> Result<(ForecastResult, Vec<ForecastEvent>), ForecastError> {
    let mut log = ForecastLog::default();
    log.emit(ForecastStage::Prepare, "forecast.start", BTreeMap::new());

    validate_forecast_config(&opts.config)?;
    let pool = parallelism_policy(opts.max_threads)?;
    let job = ForecastJob::from_options(opts);
    let generated_at = opts.timestamp_policy.resolve()?;

    log.emit(ForecastStage::Decode, "forecast.decode.begin", BTreeMap::new());
    let history_bytes = read_history(&job.inputs.history_path)?;
    let history_sha256 = sha256_hex(&history_bytes);
    let decoded = decode_history(&history_bytes)?;
    for column in &decoded.skipped_columns {
        warn!(column = %column, "history column has no observations; skipped");
    }
    let metas = match &job.inputs.entities_path {
        Some(path) => load_entities(path)?,
        None => BTreeMap::new(),
    };
    let last = decoded
        .store
        .last_month()
        .ok_or_else(|| ForecastError::invalid("history holds no observations"))?;
    let period = match opts.period {
        Some(p) if p > last => {
            return Err(ForecastError::new(
                ErrorCode::OutOfRange,
                format!("period {p} is after the last observed month {last}"),
            ))
        }
        Some(p) => p,
        None => last,
    };
    log.emit(
        ForecastStage::Decode,
        "forecast.decode.complete",
        fields([
            ("entities", decoded.store.len().to_string()),
            ("skipped_columns", decoded.skipped_columns.len().to_string()),
            ("history_sha256", history_sha256.clone()),
        ]),
    );

    let span = info_span!("forecast", %period);
    let _entered = span.enter();
    info!(entities = decoded.store.len(), "forecast run started");

    let cfg = &job.options.config;
    let archive = Archive::build(&decoded.store, cfg.window_length, cfg.normalization)?;
    let ctx = ForecastContext::new(&decoded.store, &archive, cfg, period);
    let outcomes = match &pool {
        Some(pool) => pool.install(|| forecast_entities(&ctx))?,
        None => forecast_entities(&ctx)?,
    };
    let omitted = outcomes
        .iter()
        .filter(|o| matches!(o, EntityOutcome::Omitted(_)))
        .count();
    log.emit(
        ForecastStage::Retrieve,
        "forecast.retrieve.complete",
        fields([
            ("archive_windows", archive.len().to_string()),
            ("forecast", (outcomes.len() - omitted).to_string()),
            ("omitted", omitted.to_string()),
        ]),
    );

    let store = LocalFsStore::new(job.output_root.clone());
    let prior = PriorSnapshots::load(&store, period)?;
    let artifacts = build_artifacts(&RunInputs {
        period,
        generated_at: &generated_at,
        config: cfg,
        history_sha256: &history_sha256,
        store: &decoded.store,
        metas: &metas,
        outcomes: &outcomes,
        prior: &prior,
    })?;
    log.emit(
        ForecastStage::Emit,
        "forecast.emit.complete",
        fields([("files", artifacts.request.files.len().to_string())]),
    );

    let mut request = artifacts.request;
    request.overwrite = opts.overwrite;
    let receipt = store.publish_period(&request)?;
    let latest_moved = store.repoint_latest(period)?;
    log.emit(
        ForecastStage::Publish,
        "forecast.publish.complete",
        fields([
            ("period", period.to_string()),
            ("latest_moved", latest_moved.to_string()),
        ]),
    );
    info!(
        entities = artifacts.snapshot.entities.len(),
        omitted = artifacts.snapshot.omitted.len(),
        latest_moved,
        "forecast run published"
    );
    log.emit(ForecastStage::Finalize, "forecast.complete", BTreeMap::new());

    let result = ForecastResult {
        period,
        generated_at,
        snapshot_path: job.resolve(&job.layout(period).snapshot),
        manifest_path: job.resolve(&receipt.manifest_path),
        snapshot: artifacts.snapshot,
        manifest: artifacts.manifest,
        latest_moved,
        skipped_columns: decoded.skipped_columns,
        events: log.events().to_vec(),
    };
    Ok((result, log.events().to_vec()))
}
