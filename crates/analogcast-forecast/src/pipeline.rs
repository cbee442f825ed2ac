// SPDX-License-Identifier: Apache-2.0

use analogcast_engine::{
    analog_weights, build_mixture, propagate, retrieve, window, Archive, Continuation, Dtw,
    EngineError, MatchSet, PredictiveMixture, RetrievalQuery, SeriesStore, Window,
};
use analogcast_model::{EntityId, Month, Omission, OmissionReason};
use analogcast_policies::ForecastConfig;
use rayon::prelude::*;
use tracing::debug;

use crate::ForecastError;

/// Shared, read-only state of one run; entities are forecast against it in
/// parallel.
#[derive(Debug, Clone)]
pub struct ForecastContext<'a> {
    pub store: &'a SeriesStore,
    pub archive: &'a Archive,
    pub config: &'a ForecastConfig,
    pub origin: Month,
    dtw: Dtw,
    query: RetrievalQuery,
}

impl<'a> ForecastContext<'a> {
    #[must_use]
    pub fn new(
        store: &'a SeriesStore,
        archive: &'a Archive,
        config: &'a ForecastConfig,
        origin: Month,
    ) -> Self {
        Self {
            store,
            archive,
            config,
            origin,
            dtw: Dtw::new(config.dtw_band),
            query: RetrievalQuery::from_config(config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityForecast {
    pub target: Window,
    pub matches: MatchSet,
    /// Aligned with `matches.matches`.
    pub continuations: Vec<Continuation>,
    pub mixture: PredictiveMixture,
}

impl EntityForecast {
    #[must_use]
    pub fn entity(&self) -> &EntityId {
        &self.target.entity
    }
}

#[derive(Debug, Clone)]
pub enum EntityOutcome {
    Forecast(Box<EntityForecast>),
    Omitted(Omission),
}

impl EntityOutcome {
    #[must_use]
    pub fn entity(&self) -> &EntityId {
        match self {
            Self::Forecast(f) => f.entity(),
            Self::Omitted(o) => &o.id,
        }
    }
}

fn omitted(entity: &EntityId, reason: OmissionReason) -> EntityOutcome {
    debug!(%entity, reason = reason.as_str(), "entity omitted");
    EntityOutcome::Omitted(Omission {
        id: entity.clone(),
        reason,
    })
}

/// Target window, analogs, continuations and mixture for one entity at the
/// context's origin.
pub fn forecast_entity(
    ctx: &ForecastContext<'_>,
    entity: &EntityId,
) -> Result<EntityOutcome, ForecastError> {
    let cfg = ctx.config;
    let series = ctx.store.get(entity)?;
    let target = match window(series, ctx.origin, cfg.window_length, cfg.normalization) {
        Ok(w) => w,
        Err(EngineError::OutOfRange(_)) => {
            return Ok(omitted(entity, OmissionReason::InsufficientHistory))
        }
        Err(e) => return Err(e.into()),
    };
    let matches = retrieve(ctx.store, ctx.archive, &target, &ctx.query, &ctx.dtw)?;
    if matches.is_empty() {
        return Ok(omitted(entity, OmissionReason::NoAnalogs));
    }
    let continuations = matches
        .matches
        .iter()
        .map(|m| propagate(ctx.store, m, cfg.horizon_count, ctx.origin))
        .collect::<Result<Vec<_>, _>>()?;
    let weights = analog_weights(&matches.matches, cfg.weighting);
    let mixture = build_mixture(
        &continuations,
        &weights,
        cfg.horizon_count,
        cfg.partial_horizons,
    )?;
    if mixture.horizon(1).is_none() {
        return Ok(omitted(entity, OmissionReason::Horizon1mUnavailable));
    }
    debug!(
        %entity,
        analogs = matches.len(),
        nearest = matches.matches[0].distance,
        "entity forecast"
    );
    Ok(EntityOutcome::Forecast(Box::new(EntityForecast {
        target,
        matches,
        continuations,
        mixture,
    })))
}

/// Every entity of the store, forecast in parallel; the result is in entity
/// id order whatever the thread count.
pub fn forecast_entities(ctx: &ForecastContext<'_>) -> Result<Vec<EntityOutcome>, ForecastError> {
    let entities: Vec<&EntityId> = ctx.store.entities().collect();
    let mut outcomes = entities
        .par_iter()
        .map(|entity| forecast_entity(ctx, entity))
        .collect::<Result<Vec<_>, _>>()?;
    outcomes.sort_by(|a, b| a.entity().cmp(b.entity()));
    Ok(outcomes)
}
