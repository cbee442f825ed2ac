// SPDX-License-Identifier: Apache-2.0

//! Website documents describing analogs and scenarios:
//! `matches.json`, `scenarios.json` and `minmax.json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entity::EntityId;
use crate::month::Month;
use crate::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchSeries {
    pub values: Vec<f64>,
    /// ISO dates (`YYYY-MM-01`) aligned with `values`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRecord {
    pub series: MatchSeries,
    pub distance: f64,
}

/// `{ [entityName]: MatchRecord[] }`
pub type MatchesDocument = BTreeMap<String, Vec<MatchRecord>>;

pub fn validate_matches(doc: &MatchesDocument) -> Result<(), ValidationError> {
    for (entity, records) in doc {
        for record in records {
            if !record.distance.is_finite() || record.distance < 0.0 {
                return Err(ValidationError(format!(
                    "{entity}: match distance {} must be finite and >= 0",
                    record.distance
                )));
            }
            if let Some(index) = &record.series.index {
                if index.len() != record.series.values.len() {
                    return Err(ValidationError(format!(
                        "{entity}: match index/value length mismatch"
                    )));
                }
            }
        }
        if records.windows(2).any(|w| w[0].distance > w[1].distance) {
            return Err(ValidationError(format!(
                "{entity}: matches must be sorted by ascending distance"
            )));
        }
    }
    Ok(())
}

/// Scale of a target window; `denormalize` maps website values back to
/// fatalities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    /// Flat inputs get `max = min + 1` so the mapping stays invertible.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut iter = values.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if max > min {
            Some(Self { min, max })
        } else {
            Some(Self { min, max: min + 1.0 })
        }
    }

    #[must_use]
    pub fn normalize(self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    #[must_use]
    pub fn denormalize(self, value: f64) -> f64 {
        self.min + value * (self.max - self.min)
    }
}

pub type MinMaxDocument = BTreeMap<String, MinMax>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSource {
    pub entity: EntityId,
    pub start: Month,
    pub end: Month,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioCluster {
    pub weight: f64,
    pub source: ScenarioSource,
    /// Normalized continuation per horizon, `null` where unavailable.
    pub path: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemporalSummary {
    pub index: Vec<String>,
    pub mean: Vec<Option<f64>>,
    pub p10: Vec<Option<f64>>,
    pub p50: Vec<Option<f64>>,
    pub p90: Vec<Option<f64>>,
}

/// Central interval bounds per horizon for one coverage level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalSeries {
    pub lower: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityScenarios {
    pub origin: Month,
    pub horizon: u32,
    pub clusters: Vec<ScenarioCluster>,
    pub temporal: TemporalSummary,
    /// Keyed by coverage, e.g. `"0.8"`; values normalized like `temporal`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub intervals: BTreeMap<String, IntervalSeries>,
    /// Keyed by threshold in fatalities; `P[y >= threshold]` per horizon.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exceedance: BTreeMap<String, Vec<Option<f64>>>,
}

pub type ScenariosDocument = BTreeMap<String, EntityScenarios>;

pub fn validate_scenarios(doc: &ScenariosDocument) -> Result<(), ValidationError> {
    for (entity, scenarios) in doc {
        let h = scenarios.horizon as usize;
        let t = &scenarios.temporal;
        let lengths = [t.index.len(), t.mean.len(), t.p10.len(), t.p50.len(), t.p90.len()];
        if lengths.iter().any(|len| *len != h) {
            return Err(ValidationError(format!(
                "{entity}: temporal summary must have {h} entries per series"
            )));
        }
        let interval_lengths = scenarios
            .intervals
            .values()
            .flat_map(|i| [i.lower.len(), i.upper.len()]);
        let exceedance_lengths = scenarios.exceedance.values().map(Vec::len);
        if interval_lengths.chain(exceedance_lengths).any(|len| len != h) {
            return Err(ValidationError(format!(
                "{entity}: interval and exceedance series must have {h} entries"
            )));
        }
        if scenarios.clusters.iter().any(|c| c.path.len() != h) {
            return Err(ValidationError(format!(
                "{entity}: every cluster path must have {h} entries"
            )));
        }
        let total: f64 = scenarios.clusters.iter().map(|c| c.weight).sum();
        if !scenarios.clusters.is_empty() && (total - 1.0).abs() > 1e-6 {
            return Err(ValidationError(format!(
                "{entity}: cluster weights sum to {total}, expected 1"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MinMax;

    #[test]
    fn flat_window_stays_invertible() {
        let mm = MinMax::from_values(&[4.0, 4.0, 4.0]).expect("minmax");
        assert_eq!(mm, MinMax { min: 4.0, max: 5.0 });
        assert_eq!(mm.denormalize(mm.normalize(4.0)), 4.0);
    }

    #[test]
    fn denormalize_maps_unit_interval_to_range() {
        let mm = MinMax::from_values(&[2.0, 10.0, 6.0]).expect("minmax");
        assert_eq!(mm.denormalize(0.0), 2.0);
        assert_eq!(mm.denormalize(1.0), 10.0);
        assert_eq!(mm.denormalize(0.5), 6.0);
        assert!(MinMax::from_values(&[]).is_none());
    }
}
