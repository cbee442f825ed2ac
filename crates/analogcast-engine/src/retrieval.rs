// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;

use analogcast_model::{EntityId, Month};
use analogcast_policies::ForecastConfig;
use rayon::prelude::*;

use crate::archive::Archive;
use crate::dtw::Dtw;
use crate::error::EngineError;
use crate::series::SeriesStore;
use crate::window::{Normalization, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub k: usize,
    pub exclude_self: bool,
    pub horizon_count: u32,
    /// Candidates must have `horizon_count` observed months after their end,
    /// none of them after the target's end.
    pub require_continuation: bool,
}

impl RetrievalQuery {
    #[must_use]
    pub fn from_config(cfg: &ForecastConfig) -> Self {
        Self {
            k: cfg.k,
            exclude_self: cfg.exclude_self,
            horizon_count: cfg.horizon_count,
            require_continuation: cfg.require_continuation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalogMatch {
    pub entity: EntityId,
    pub start: Month,
    pub end: Month,
    /// Source values before normalization.
    pub values: Vec<f64>,
    pub normalization: Normalization,
    pub distance: f64,
}

/// The K nearest analogs of one target, ascending by
/// `(distance, end month, entity id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSet {
    pub target_entity: EntityId,
    pub target_start: Month,
    pub target_end: Month,
    pub band: Option<usize>,
    pub k: usize,
    pub matches: Vec<AnalogMatch>,
}

impl MatchSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

fn is_admissible(
    store: &SeriesStore,
    target: &Window,
    candidate: &Window,
    query: &RetrievalQuery,
) -> Result<bool, EngineError> {
    // Ending strictly before the target also rules out the target itself.
    if candidate.end >= target.end {
        return Ok(false);
    }
    if query.exclude_self && candidate.overlaps(target) {
        return Ok(false);
    }
    if query.require_continuation {
        let last = candidate.end.add_months(query.horizon_count as i32);
        if last > target.end {
            return Ok(false);
        }
        if store.get(&candidate.entity)?.value_at(last).is_none() {
            return Ok(false);
        }
    }
    Ok(true)
}

fn rank(a: &(f64, &Window), b: &(f64, &Window)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.end.cmp(&b.1.end))
        .then_with(|| a.1.entity.cmp(&b.1.entity))
}

/// Exact K-nearest analogs of `target` by full scan of the archive.
pub fn retrieve(
    store: &SeriesStore,
    archive: &Archive,
    target: &Window,
    query: &RetrievalQuery,
    dtw: &Dtw,
) -> Result<MatchSet, EngineError> {
    if query.k == 0 {
        return Err(EngineError::invalid("k must be >= 1"));
    }
    if target.is_empty() {
        return Err(EngineError::invalid("target window is empty"));
    }
    let mut candidates = Vec::new();
    for candidate in archive.windows() {
        if is_admissible(store, target, candidate, query)? {
            candidates.push(candidate);
        }
    }

    let mut scored = candidates
        .par_iter()
        .map(|c| dtw.distance(&target.values, &c.values).map(|d| (d, *c)))
        .collect::<Result<Vec<_>, _>>()?;

    if scored.len() > query.k {
        scored.select_nth_unstable_by(query.k - 1, rank);
        scored.truncate(query.k);
    }
    scored.sort_unstable_by(rank);

    let matches = scored
        .into_iter()
        .map(|(distance, w)| AnalogMatch {
            entity: w.entity.clone(),
            start: w.start,
            end: w.end,
            values: w.raw.clone(),
            normalization: w.normalization,
            distance,
        })
        .collect();
    Ok(MatchSet {
        target_entity: target.entity.clone(),
        target_start: target.start,
        target_end: target.end,
        band: dtw.band(),
        k: query.k,
        matches,
    })
}
