// SPDX-License-Identifier: Apache-2.0

use analogcast_policies::{PartialHorizonPolicy, WeightingPolicy};

use crate::error::EngineError;
use crate::propagate::{Continuation, HorizonOutcome};
use crate::retrieval::AnalogMatch;

pub const INVERSE_DISTANCE_EPSILON: f64 = 1e-9;

/// Base weight of every analog; always sums to 1.
#[must_use]
pub fn analog_weights(matches: &[AnalogMatch], policy: WeightingPolicy) -> Vec<f64> {
    if matches.is_empty() {
        return Vec::new();
    }
    let raw: Vec<f64> = match policy {
        WeightingPolicy::Equal => vec![1.0; matches.len()],
        WeightingPolicy::InverseDistance => matches
            .iter()
            .map(|m| 1.0 / (m.distance + INVERSE_DISTANCE_EPSILON))
            .collect(),
    };
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedOutcome {
    pub value: f64,
    pub weight: f64,
    /// Index of the analog in its match set.
    pub source: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub coverage: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exceedance {
    pub threshold: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSummary {
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub coverage: f64,
    pub intervals: Vec<Interval>,
    pub exceedance: Vec<Exceedance>,
}

/// Weighted outcomes of one horizon, sorted ascending by value. Weights sum
/// to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonDistribution {
    outcomes: Vec<WeightedOutcome>,
    coverage: f64,
}

impl HorizonDistribution {
    #[must_use]
    pub fn outcomes(&self) -> &[WeightedOutcome] {
        &self.outcomes
    }

    /// Share of the base weight mass whose analogs observed this horizon.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.outcomes.iter().map(|o| o.weight).sum()
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.outcomes.iter().map(|o| o.value * o.weight).sum()
    }

    /// Weighted quantile with plotting positions `C_i - w_i / 2`, linear
    /// interpolation between them and clamping outside.
    #[must_use]
    pub fn quantile(&self, p: f64) -> f64 {
        let n = self.outcomes.len();
        let mut positions = Vec::with_capacity(n);
        let mut cumulative = 0.0;
        for o in &self.outcomes {
            cumulative += o.weight;
            positions.push(cumulative - o.weight / 2.0);
        }
        let first = self.outcomes[0].value;
        let last = self.outcomes[n - 1].value;
        if p <= positions[0] {
            return first;
        }
        if p >= positions[n - 1] {
            return last;
        }
        for i in 0..n - 1 {
            if p <= positions[i + 1] {
                let (lo, hi) = (self.outcomes[i].value, self.outcomes[i + 1].value);
                let t = (p - positions[i]) / (positions[i + 1] - positions[i]);
                return (lo + t * (hi - lo)).clamp(lo, hi);
            }
        }
        last
    }

    #[must_use]
    pub fn interval(&self, coverage: f64) -> Interval {
        Interval {
            coverage,
            lower: self.quantile((1.0 - coverage) / 2.0),
            upper: self.quantile((1.0 + coverage) / 2.0),
        }
    }

    /// `P[y >= threshold]`.
    #[must_use]
    pub fn exceedance(&self, threshold: f64) -> f64 {
        self.outcomes
            .iter()
            .filter(|o| o.value >= threshold)
            .map(|o| o.weight)
            .sum()
    }

    #[must_use]
    pub fn summarize(&self, intervals: &[f64], thresholds: &[f64]) -> DistributionSummary {
        DistributionSummary {
            mean: self.mean(),
            p10: self.quantile(0.1),
            p50: self.quantile(0.5),
            p90: self.quantile(0.9),
            coverage: self.coverage,
            intervals: intervals.iter().map(|c| self.interval(*c)).collect(),
            exceedance: thresholds
                .iter()
                .map(|t| Exceedance {
                    threshold: *t,
                    probability: self.exceedance(*t),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HorizonMixture {
    Available(HorizonDistribution),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictiveMixture {
    /// Base analog weights, aligned with the match set.
    pub weights: Vec<f64>,
    /// `horizons[h - 1]` for horizon `h`.
    pub horizons: Vec<HorizonMixture>,
}

impl PredictiveMixture {
    #[must_use]
    pub fn horizon(&self, horizon: u32) -> Option<&HorizonDistribution> {
        let i = usize::try_from(horizon.checked_sub(1)?).ok()?;
        match self.horizons.get(i)? {
            HorizonMixture::Available(d) => Some(d),
            HorizonMixture::Unavailable => None,
        }
    }
}

pub fn build_mixture(
    continuations: &[Continuation],
    weights: &[f64],
    horizon_count: u32,
    policy: PartialHorizonPolicy,
) -> Result<PredictiveMixture, EngineError> {
    if continuations.is_empty() {
        return Err(EngineError::invalid("mixture needs at least one analog"));
    }
    if continuations.len() != weights.len() {
        return Err(EngineError::invalid(format!(
            "{} continuations but {} weights",
            continuations.len(),
            weights.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return Err(EngineError::invalid("analog weights must be positive and finite"));
    }
    let base_total: f64 = weights.iter().sum();

    let horizons = (1..=horizon_count)
        .map(|h| {
            let mut outcomes: Vec<WeightedOutcome> = continuations
                .iter()
                .zip(weights)
                .enumerate()
                .filter_map(|(source, (c, w))| match c.outcome(h) {
                    HorizonOutcome::Available(value) => Some(WeightedOutcome {
                        value,
                        weight: *w,
                        source,
                    }),
                    HorizonOutcome::Unavailable => None,
                })
                .collect();
            let complete = outcomes.len() == continuations.len();
            if outcomes.is_empty() || (!complete && policy == PartialHorizonPolicy::RequireComplete)
            {
                return HorizonMixture::Unavailable;
            }
            let kept: f64 = outcomes.iter().map(|o| o.weight).sum();
            for o in &mut outcomes {
                o.weight /= kept;
            }
            outcomes.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.source.cmp(&b.source)));
            HorizonMixture::Available(HorizonDistribution {
                outcomes,
                coverage: kept / base_total,
            })
        })
        .collect();

    Ok(PredictiveMixture {
        weights: weights.to_vec(),
        horizons,
    })
}
