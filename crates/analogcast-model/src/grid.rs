// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entity::EntityId;

pub const MAX_GRID_HORIZON: u32 = 6;

/// One row of `<period>-m<h>.json`; `v` is the horizon's p50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridPoint {
    pub id: EntityId,
    pub lat: f64,
    pub lon: f64,
    pub v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// GeoJSON order: `[lon, lat]`.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridProperties {
    pub id: EntityId,
    /// `m1..m<h>` keys, `null` where the horizon is unavailable.
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: PointGeometry,
    pub properties: GridProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<GridFeature>,
}

impl GridFeature {
    #[must_use]
    pub fn point(id: EntityId, lat: f64, lon: f64, values: BTreeMap<String, Option<f64>>) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry: PointGeometry {
                kind: "Point".to_string(),
                coordinates: [lon, lat],
            },
            properties: GridProperties { id, values },
        }
    }
}

impl GridFeatureCollection {
    #[must_use]
    pub fn new(features: Vec<GridFeature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

#[must_use]
pub fn grid_property_key(horizon: u32) -> String {
    format!("m{horizon}")
}
