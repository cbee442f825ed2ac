// SPDX-License-Identifier: Apache-2.0

use analogcast_model::{EntityId, Month};

use crate::error::EngineError;
use crate::retrieval::AnalogMatch;
use crate::series::SeriesStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizonOutcome {
    Available(f64),
    /// Not observed, or observed after the forecast origin. Never imputed.
    Unavailable,
}

impl HorizonOutcome {
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }
}

/// What followed one analog, `outcomes[h - 1]` for horizon `h`, as the raw
/// realized values of the analog's own series.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    pub source: EntityId,
    pub end: Month,
    pub outcomes: Vec<HorizonOutcome>,
}

impl Continuation {
    #[must_use]
    pub fn outcome(&self, horizon: u32) -> HorizonOutcome {
        horizon
            .checked_sub(1)
            .and_then(|i| self.outcomes.get(i as usize))
            .copied()
            .unwrap_or(HorizonOutcome::Unavailable)
    }
}

/// Normalization only shapes matching; outcomes are never rescaled.
pub fn propagate(
    store: &SeriesStore,
    analog: &AnalogMatch,
    horizon_count: u32,
    cutoff: Month,
) -> Result<Continuation, EngineError> {
    if horizon_count == 0 {
        return Err(EngineError::invalid("horizon count must be >= 1"));
    }
    let series = store.get(&analog.entity)?;
    let outcomes = (1..=horizon_count)
        .map(|h| {
            let month = analog.end.add_months(h as i32);
            if month > cutoff {
                return HorizonOutcome::Unavailable;
            }
            series
                .value_at(month)
                .map_or(HorizonOutcome::Unavailable, HorizonOutcome::Available)
        })
        .collect();
    Ok(Continuation {
        source: analog.entity.clone(),
        end: analog.end,
        outcomes,
    })
}
