// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::entity::{EntityId, EntityType};
use crate::month::Period;
use crate::ValidationError;

pub const SNAPSHOT_VERSION: &str = "1";
pub const DEFAULT_BAND_THRESHOLDS: [f64; 2] = [33.0, 66.0];

/// Forecast lead time in months, serialized as `"<n>m"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HorizonKey(u32);

impl HorizonKey {
    pub fn new(months: u32) -> Result<Self, ValidationError> {
        if months == 0 {
            return Err(ValidationError("horizon must be >= 1 month".to_string()));
        }
        Ok(Self(months))
    }

    #[must_use]
    pub const fn months(self) -> u32 {
        self.0
    }
}

impl Display for HorizonKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl FromStr for HorizonKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_suffix('m')
            .filter(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| ValidationError(format!("horizon key `{s}` must look like 3m")))?;
        let months = digits
            .parse::<u32>()
            .map_err(|_| ValidationError(format!("horizon key `{s}` is out of range")))?;
        Self::new(months)
    }
}

impl From<HorizonKey> for String {
    fn from(value: HorizonKey) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for HorizonKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    /// `thresholds = [low_upper, medium_upper]`: `< low_upper` is low,
    /// `< medium_upper` is medium, anything else is high.
    #[must_use]
    pub fn from_index(index: f64, thresholds: [f64; 2]) -> Self {
        if index < thresholds[0] {
            Self::Low
        } else if index < thresholds[1] {
            Self::Medium
        } else {
            Self::High
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HorizonSummary {
    pub index: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Driver {
    pub category: String,
    pub impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OmissionReason {
    InsufficientHistory,
    NoAnalogs,
    #[serde(rename = "horizon_1m_unavailable")]
    Horizon1mUnavailable,
}

impl OmissionReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientHistory => "insufficient_history",
            Self::NoAnalogs => "no_analogs",
            Self::Horizon1mUnavailable => "horizon_1m_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Omission {
    pub id: EntityId,
    pub reason: OmissionReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "entityType")]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso3: Option<String>,
    pub index: f64,
    pub band: Band,
    pub confidence: f64,
    #[serde(rename = "deltaMoM")]
    pub delta_mom: f64,
    #[serde(rename = "deltaYoY")]
    pub delta_yoy: f64,
    pub horizons: BTreeMap<HorizonKey, HorizonSummary>,
    #[serde(
        rename = "unavailableHorizons",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub unavailable_horizons: Vec<HorizonKey>,
    pub drivers: Vec<Driver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The monthly snapshot consumed by the website's `readSnapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastSnapshot {
    pub version: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub period: Period,
    pub entities: Vec<SnapshotEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<Omission>,
}

impl ForecastSnapshot {
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&SnapshotEntity> {
        self.entities
            .binary_search_by(|e| e.id.cmp(id))
            .ok()
            .map(|i| &self.entities[i])
    }

    pub fn validate_strict(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError("snapshot version must not be empty".to_string()));
        }
        validate_timestamp(&self.generated_at)?;
        for pair in self.entities.windows(2) {
            if pair[0].id >= pair[1].id {
                return Err(ValidationError(format!(
                    "snapshot entities must be sorted by id and unique: `{}` precedes `{}`",
                    pair[0].id, pair[1].id
                )));
            }
        }
        for entity in &self.entities {
            validate_entity(entity)?;
        }
        let mut omitted = BTreeSet::new();
        for omission in &self.omitted {
            if !omitted.insert(&omission.id) {
                return Err(ValidationError(format!(
                    "entity {} omitted more than once",
                    omission.id
                )));
            }
            if self.entity(&omission.id).is_some() {
                return Err(ValidationError(format!(
                    "entity {} is both forecast and omitted",
                    omission.id
                )));
            }
        }
        Ok(())
    }
}

/// RFC3339-like UTC timestamp check, shared by every dated artifact.
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    if value.len() < 20 || !value.contains('T') || !value.ends_with('Z') {
        return Err(ValidationError(format!(
            "timestamp `{value}` must be RFC3339 UTC (e.g. 2024-07-01T00:00:00Z)"
        )));
    }
    Ok(())
}

fn validate_entity(entity: &SnapshotEntity) -> Result<(), ValidationError> {
    let id = &entity.id;
    check_index(id, "index", entity.index)?;
    if !(0.0..=1.0).contains(&entity.confidence) {
        return Err(ValidationError(format!(
            "entity {id} confidence {} outside [0, 1]",
            entity.confidence
        )));
    }
    if !entity.delta_mom.is_finite() || !entity.delta_yoy.is_finite() {
        return Err(ValidationError(format!("entity {id} deltas must be finite")));
    }
    if entity.horizons.is_empty() {
        return Err(ValidationError(format!("entity {id} has no available horizon")));
    }
    for (key, summary) in &entity.horizons {
        check_index(id, "horizon index", summary.index)?;
        let ordered = summary.p10 >= 0.0 && summary.p10 <= summary.p50 && summary.p50 <= summary.p90;
        if !ordered || !summary.p90.is_finite() {
            return Err(ValidationError(format!(
                "entity {id} horizon {key} must satisfy 0 <= p10 <= p50 <= p90"
            )));
        }
        if entity.unavailable_horizons.contains(key) {
            return Err(ValidationError(format!(
                "entity {id} horizon {key} is both available and unavailable"
            )));
        }
    }
    for driver in &entity.drivers {
        if driver.category.trim().is_empty() || !driver.impact.is_finite() {
            return Err(ValidationError(format!(
                "entity {id} has a driver without category or with non-finite impact"
            )));
        }
    }
    Ok(())
}

fn check_index(id: &EntityId, field: &str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError(format!(
            "entity {id} {field} {value} outside [0, 100]"
        )));
    }
    Ok(())
}
