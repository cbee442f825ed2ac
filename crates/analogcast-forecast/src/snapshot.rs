// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use analogcast_engine::{confidence, horizon_index, round_to, HorizonDistribution};
use analogcast_model::{
    Band, Driver, EntityId, EntityMeta, ForecastSnapshot, HorizonKey, HorizonSummary, Period,
    SnapshotEntity,
};
use analogcast_policies::ForecastConfig;
use analogcast_store::{ArtifactStore, StoreErrorCode};

use crate::pipeline::{EntityForecast, EntityOutcome};
use crate::ForecastError;

/// Published snapshots the month-over-month and year-over-year deltas are
/// taken against.
#[derive(Debug, Clone, Default)]
pub struct PriorSnapshots {
    pub previous_month: Option<ForecastSnapshot>,
    pub previous_year: Option<ForecastSnapshot>,
}

fn read_optional(
    store: &impl ArtifactStore,
    period: Period,
) -> Result<Option<ForecastSnapshot>, ForecastError> {
    match store.read_snapshot(period) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) if e.code == StoreErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl PriorSnapshots {
    pub fn load(store: &impl ArtifactStore, period: Period) -> Result<Self, ForecastError> {
        Ok(Self {
            previous_month: read_optional(store, period.prev())?,
            previous_year: read_optional(store, period.add_months(-12))?,
        })
    }
}

fn delta(current: f64, prior: Option<&ForecastSnapshot>, id: &EntityId) -> f64 {
    prior
        .and_then(|s| s.entity(id))
        .map_or(0.0, |e| round_to(current - e.index, 1))
}

fn horizon_summary(d: &HorizonDistribution, index_cap: f64) -> HorizonSummary {
    let p50 = d.quantile(0.5);
    HorizonSummary {
        index: horizon_index(p50, index_cap),
        p10: round_to(d.quantile(0.1), 3),
        p50: round_to(p50, 3),
        p90: round_to(d.quantile(0.9), 3),
    }
}

fn snapshot_entity(
    f: &EntityForecast,
    meta: EntityMeta,
    cfg: &ForecastConfig,
    prior: &PriorSnapshots,
) -> Result<SnapshotEntity, ForecastError> {
    let one_month = f.mixture.horizon(1).ok_or_else(|| {
        ForecastError::internal(format!("{} forecast without a 1m horizon", meta.id))
    })?;
    let mut horizons = BTreeMap::new();
    let mut unavailable_horizons = Vec::new();
    for h in &cfg.reported_horizons {
        let key = HorizonKey::new(*h)?;
        match f.mixture.horizon(*h) {
            Some(d) => {
                horizons.insert(key, horizon_summary(d, cfg.index_cap));
            }
            None => unavailable_horizons.push(key),
        }
    }
    let index = horizon_summary(one_month, cfg.index_cap).index;
    let coverage = one_month.coverage();
    let drivers = f
        .matches
        .matches
        .iter()
        .zip(&f.mixture.weights)
        .take(cfg.max_exported_matches)
        .map(|(m, w)| Driver {
            category: "analog".to_string(),
            impact: round_to(*w, 3),
            note: Some(format!(
                "{} {}..{} (dtw {:.3})",
                m.entity, m.start, m.end, m.distance
            )),
        })
        .collect();
    let notes = (coverage < 1.0).then(|| {
        format!(
            "1m distribution covers {:.0}% of analog weight",
            coverage * 100.0
        )
    });
    Ok(SnapshotEntity {
        delta_mom: delta(index, prior.previous_month.as_ref(), &meta.id),
        delta_yoy: delta(index, prior.previous_year.as_ref(), &meta.id),
        id: meta.id,
        name: meta.name,
        entity_type: meta.entity_type,
        iso3: meta.iso3,
        index,
        band: Band::from_index(index, cfg.band_thresholds),
        confidence: confidence(
            coverage,
            one_month.quantile(0.1),
            one_month.quantile(0.5),
            one_month.quantile(0.9),
        ),
        horizons,
        unavailable_horizons,
        drivers,
        notes,
    })
}

/// The monthly snapshot for `period`. Entities keep the id order of
/// `outcomes`; the result is validated before it is returned.
pub fn build_snapshot(
    period: Period,
    generated_at: &str,
    cfg: &ForecastConfig,
    metas: &BTreeMap<EntityId, EntityMeta>,
    outcomes: &[EntityOutcome],
    prior: &PriorSnapshots,
) -> Result<ForecastSnapshot, ForecastError> {
    let mut entities = Vec::new();
    let mut omitted = Vec::new();
    for outcome in outcomes {
        match outcome {
            EntityOutcome::Forecast(f) => {
                let meta = metas
                    .get(f.entity())
                    .cloned()
                    .unwrap_or_else(|| EntityMeta::fallback(f.entity().clone()));
                entities.push(snapshot_entity(f, meta, cfg, prior)?);
            }
            EntityOutcome::Omitted(o) => omitted.push(o.clone()),
        }
    }
    let snapshot = ForecastSnapshot {
        version: cfg.snapshot_version.clone(),
        generated_at: generated_at.to_string(),
        period,
        entities,
        omitted,
    };
    snapshot
        .validate_strict()
        .map_err(|e| ForecastError::internal(format!("emitted snapshot is invalid: {e}")))?;
    Ok(snapshot)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Flat CSV mirror of a snapshot, one row per forecast entity.
pub fn snapshot_csv(
    snapshot: &ForecastSnapshot,
    reported_horizons: &[u32],
) -> Result<Vec<u8>, ForecastError> {
    let csv_err = |e: csv::Error| ForecastError::internal(format!("csv mirror: {e}"));
    let mut out = format!(
        "# version={},period={},generatedAt={}\n",
        snapshot.version, snapshot.period, snapshot.generated_at
    )
    .into_bytes();
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<String> = [
        "id",
        "name",
        "entityType",
        "iso3",
        "index",
        "band",
        "confidence",
        "deltaMoM",
        "deltaYoY",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    for h in reported_horizons {
        for stat in ["index", "p10", "p50", "p90"] {
            header.push(format!("{h}m_{stat}"));
        }
    }
    writer.write_record(&header).map_err(csv_err)?;
    for e in &snapshot.entities {
        let mut row = vec![
            e.id.to_string(),
            e.name.clone(),
            e.entity_type.as_str().to_string(),
            e.iso3.clone().unwrap_or_default(),
            e.index.to_string(),
            e.band.as_str().to_string(),
            e.confidence.to_string(),
            e.delta_mom.to_string(),
            e.delta_yoy.to_string(),
        ];
        for h in reported_horizons {
            let summary = HorizonKey::new(*h)
                .ok()
                .and_then(|key| e.horizons.get(&key));
            row.push(cell(summary.map(|s| s.index)));
            row.push(cell(summary.map(|s| s.p10)));
            row.push(cell(summary.map(|s| s.p50)));
            row.push(cell(summary.map(|s| s.p90)));
        }
        writer.write_record(&row).map_err(csv_err)?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| ForecastError::internal(format!("csv mirror: {e}")))?;
    out.extend(body);
    Ok(out)
}
