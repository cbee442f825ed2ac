// SPDX-License-Identifier: Apache-2.0

//! Documents read by the website charts: `matches.json`, `scenarios.json`,
//! `minmax.json` and `hist.csv`.

use std::collections::{BTreeMap, BTreeSet};

use analogcast_engine::{round_to, DistributionSummary, SeriesStore};
use analogcast_model::{
    validate_matches, validate_scenarios, EntityId, EntityMeta, EntityScenarios, IntervalSeries,
    MatchRecord, MatchSeries, MatchesDocument, MinMax, MinMaxDocument, Month, ScenarioCluster,
    ScenarioSource, ScenariosDocument, TemporalSummary,
};
use analogcast_policies::ForecastConfig;

use crate::pipeline::{EntityForecast, EntityOutcome};
use crate::ForecastError;

/// Website documents are keyed by display name; a name shared by two
/// entities falls back to the id for the later one.
pub(crate) fn display_keys(
    ids: impl Iterator<Item = EntityId>,
    metas: &BTreeMap<EntityId, EntityMeta>,
) -> BTreeMap<EntityId, String> {
    let mut used = BTreeSet::new();
    let mut keys = BTreeMap::new();
    for id in ids {
        let name = metas
            .get(&id)
            .map_or_else(|| id.to_string(), |m| m.name.clone());
        let key = if used.insert(name.clone()) {
            name
        } else {
            id.to_string()
        };
        used.insert(key.clone());
        keys.insert(id, key);
    }
    keys
}

fn forecasts(outcomes: &[EntityOutcome]) -> impl Iterator<Item = &EntityForecast> {
    outcomes.iter().filter_map(|o| match o {
        EntityOutcome::Forecast(f) => Some(f.as_ref()),
        EntityOutcome::Omitted(_) => None,
    })
}

fn key_of<'a>(
    keys: &'a BTreeMap<EntityId, String>,
    id: &EntityId,
) -> Result<&'a String, ForecastError> {
    keys.get(id)
        .ok_or_else(|| ForecastError::internal(format!("no display key for {id}")))
}

pub(crate) fn matches_document(
    outcomes: &[EntityOutcome],
    keys: &BTreeMap<EntityId, String>,
    cfg: &ForecastConfig,
) -> Result<MatchesDocument, ForecastError> {
    let mut doc = MatchesDocument::new();
    for f in forecasts(outcomes) {
        let records = f
            .matches
            .matches
            .iter()
            .take(cfg.max_exported_matches)
            .map(|m| MatchRecord {
                series: MatchSeries {
                    values: m.values.clone(),
                    index: Some(m.start.through(m.end).map(Month::iso_date).collect()),
                    name: Some(format!("{} {}..{}", m.entity, m.start, m.end)),
                },
                distance: m.distance,
            })
            .collect();
        doc.insert(key_of(keys, f.entity())?.clone(), records);
    }
    validate_matches(&doc).map_err(|e| ForecastError::internal(e.0))?;
    Ok(doc)
}

fn target_scale(f: &EntityForecast) -> Result<MinMax, ForecastError> {
    MinMax::from_values(&f.target.raw)
        .ok_or_else(|| ForecastError::internal(format!("empty target window for {}", f.entity())))
}

pub(crate) fn minmax_document(
    outcomes: &[EntityOutcome],
    keys: &BTreeMap<EntityId, String>,
) -> Result<MinMaxDocument, ForecastError> {
    let mut doc = MinMaxDocument::new();
    for f in forecasts(outcomes) {
        doc.insert(key_of(keys, f.entity())?.clone(), target_scale(f)?);
    }
    Ok(doc)
}

fn per_horizon(
    summaries: &[Option<DistributionSummary>],
    pick: impl Fn(&DistributionSummary) -> f64,
    scale: impl Fn(f64) -> f64,
) -> Vec<Option<f64>> {
    summaries
        .iter()
        .map(|s| s.as_ref().map(|s| scale(pick(s))))
        .collect()
}

fn entity_scenarios(
    f: &EntityForecast,
    origin: Month,
    cfg: &ForecastConfig,
) -> Result<EntityScenarios, ForecastError> {
    let scale = target_scale(f)?;
    let norm = |v: f64| round_to(scale.normalize(v), 6);
    let horizons = 1..=cfg.horizon_count;

    let clusters = f
        .matches
        .matches
        .iter()
        .zip(&f.continuations)
        .zip(&f.mixture.weights)
        .map(|((m, c), w)| ScenarioCluster {
            weight: *w,
            source: ScenarioSource {
                entity: m.entity.clone(),
                start: m.start,
                end: m.end,
            },
            path: horizons.clone().map(|h| c.outcome(h).value().map(norm)).collect(),
        })
        .collect();

    let summaries: Vec<Option<DistributionSummary>> = horizons
        .clone()
        .map(|h| {
            f.mixture
                .horizon(h)
                .map(|d| d.summarize(&cfg.intervals, &cfg.exceedance_thresholds))
        })
        .collect();
    let temporal = TemporalSummary {
        index: horizons
            .clone()
            .map(|h| origin.add_months(h as i32).iso_date())
            .collect(),
        mean: per_horizon(&summaries, |s| s.mean, norm),
        p10: per_horizon(&summaries, |s| s.p10, norm),
        p50: per_horizon(&summaries, |s| s.p50, norm),
        p90: per_horizon(&summaries, |s| s.p90, norm),
    };
    let intervals = cfg
        .intervals
        .iter()
        .enumerate()
        .map(|(i, coverage)| {
            (
                coverage.to_string(),
                IntervalSeries {
                    lower: per_horizon(&summaries, |s| s.intervals[i].lower, norm),
                    upper: per_horizon(&summaries, |s| s.intervals[i].upper, norm),
                },
            )
        })
        .collect();
    let exceedance = cfg
        .exceedance_thresholds
        .iter()
        .enumerate()
        .map(|(i, threshold)| {
            let probabilities = summaries
                .iter()
                .map(|s| s.as_ref().map(|s| round_to(s.exceedance[i].probability, 6)))
                .collect();
            (threshold.to_string(), probabilities)
        })
        .collect();

    Ok(EntityScenarios {
        origin,
        horizon: cfg.horizon_count,
        clusters,
        temporal,
        intervals,
        exceedance,
    })
}

pub(crate) fn scenarios_document(
    outcomes: &[EntityOutcome],
    keys: &BTreeMap<EntityId, String>,
    origin: Month,
    cfg: &ForecastConfig,
) -> Result<ScenariosDocument, ForecastError> {
    let mut doc = ScenariosDocument::new();
    for f in forecasts(outcomes) {
        doc.insert(
            key_of(keys, f.entity())?.clone(),
            entity_scenarios(f, origin, cfg)?,
        );
    }
    validate_scenarios(&doc).map_err(|e| ForecastError::internal(e.0))?;
    Ok(doc)
}

/// `date,<name>...` over the store's full month span; blank outside each
/// series.
pub(crate) fn history_csv(
    store: &SeriesStore,
    keys: &BTreeMap<EntityId, String>,
) -> Result<Vec<u8>, ForecastError> {
    let csv_err = |e: csv::Error| ForecastError::internal(format!("hist.csv: {e}"));
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["date".to_string()];
    for series in store.iter() {
        header.push(key_of(keys, series.entity())?.clone());
    }
    writer.write_record(&header).map_err(csv_err)?;
    if let (Some(first), Some(last)) = (store.first_month(), store.last_month()) {
        for month in first.through(last) {
            let mut row = vec![month.iso_date()];
            row.extend(
                store
                    .iter()
                    .map(|s| s.value_at(month).map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&row).map_err(csv_err)?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| ForecastError::internal(format!("hist.csv: {e}")))
}
