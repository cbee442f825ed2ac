// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use analogcast_engine::round_to;
use analogcast_model::{
    grid_property_key, ArtifactPaths, EntityId, EntityMeta, EntityType, GridFeature,
    GridFeatureCollection, GridPoint, MAX_GRID_HORIZON,
};
use analogcast_store::ArtifactFile;

use crate::pipeline::{EntityForecast, EntityOutcome};
use crate::write::json_bytes;
use crate::ForecastError;

struct GridCell<'a> {
    id: &'a EntityId,
    lat: f64,
    lon: f64,
    forecast: &'a EntityForecast,
}

impl GridCell<'_> {
    fn p50(&self, horizon: u32) -> Option<f64> {
        self.forecast
            .mixture
            .horizon(horizon)
            .map(|d| round_to(d.quantile(0.5), 3))
    }
}

fn grid_cells<'a>(
    outcomes: &'a [EntityOutcome],
    metas: &'a BTreeMap<EntityId, EntityMeta>,
) -> Vec<GridCell<'a>> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            EntityOutcome::Forecast(f) => Some(f.as_ref()),
            EntityOutcome::Omitted(_) => None,
        })
        .filter_map(|f| {
            let meta = metas.get(f.entity())?;
            if meta.entity_type != EntityType::Grid {
                return None;
            }
            let (lat, lon) = meta.coordinates()?;
            Some(GridCell {
                id: &meta.id,
                lat,
                lon,
                forecast: f,
            })
        })
        .collect()
}

/// Per-horizon point files plus one GeoJSON collection for grid entities
/// with coordinates; nothing when there are none.
pub(crate) fn grid_artifacts(
    paths: &ArtifactPaths,
    horizon_count: u32,
    outcomes: &[EntityOutcome],
    metas: &BTreeMap<EntityId, EntityMeta>,
) -> Result<Vec<ArtifactFile>, ForecastError> {
    let cells = grid_cells(outcomes, metas);
    if cells.is_empty() {
        return Ok(Vec::new());
    }
    let horizons = 1..=horizon_count.min(MAX_GRID_HORIZON);
    let mut files = Vec::new();
    for h in horizons.clone() {
        let points: Vec<GridPoint> = cells
            .iter()
            .filter_map(|c| {
                Some(GridPoint {
                    id: c.id.clone(),
                    lat: c.lat,
                    lon: c.lon,
                    v: c.p50(h)?,
                })
            })
            .collect();
        files.push(ArtifactFile::new(paths.grid_json(h), json_bytes(&points)?));

        let mut writer = csv::Writer::from_writer(Vec::new());
        let csv_err = |e: csv::Error| ForecastError::internal(format!("grid csv: {e}"));
        writer
            .write_record(["id", "lat", "lon", "v"])
            .map_err(csv_err)?;
        for p in &points {
            writer
                .write_record([
                    p.id.to_string(),
                    p.lat.to_string(),
                    p.lon.to_string(),
                    p.v.to_string(),
                ])
                .map_err(csv_err)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ForecastError::internal(format!("grid csv: {e}")))?;
        files.push(ArtifactFile::new(paths.grid_csv(h), bytes));
    }

    let features = cells
        .iter()
        .map(|c| {
            let values = horizons
                .clone()
                .map(|h| (grid_property_key(h), c.p50(h)))
                .collect();
            GridFeature::point(c.id.clone(), c.lat, c.lon, values)
        })
        .collect();
    files.push(ArtifactFile::new(
        paths.grid_geojson(),
        json_bytes(&GridFeatureCollection::new(features))?,
    ));
    Ok(files)
}
