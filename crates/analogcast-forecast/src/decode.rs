// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use analogcast_core::ErrorCode;
use analogcast_engine::{EngineError, SeriesStore, TimeSeries};
use analogcast_model::{EntityId, EntityMeta, Month};
use csv::{ReaderBuilder, Trim};

use crate::ForecastError;

/// The wide history table as a validated series store.
#[derive(Debug, Clone)]
pub struct DecodedHistory {
    pub store: SeriesStore,
    /// Entity columns without a single observation.
    pub skipped_columns: Vec<String>,
}

fn io_error(path: &Path, err: std::io::Error) -> ForecastError {
    let code = if err.kind() == std::io::ErrorKind::NotFound {
        ErrorCode::NotFound
    } else {
        ErrorCode::Io
    };
    ForecastError::new(code, format!("read {} failed: {err}", path.display()))
}

fn csv_error(err: &csv::Error) -> ForecastError {
    let at = err
        .position()
        .map(|p| format!(" at line {}", p.line()))
        .unwrap_or_default();
    ForecastError::invalid(format!("history csv{at}: {err}"))
}

pub fn read_history(path: &Path) -> Result<Vec<u8>, ForecastError> {
    fs::read(path).map_err(|e| io_error(path, e))
}

fn parse_cell(entity: &EntityId, month: Month, raw: &str) -> Result<Option<f64>, ForecastError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| {
        ForecastError::new(
            ErrorCode::InvalidSeriesValue,
            format!("value `{raw}` for {entity} at {month} is not a number"),
        )
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidSeriesValue {
            entity: entity.clone(),
            month,
            value,
        }
        .into());
    }
    Ok(Some(value))
}

/// Decodes `date,<entity>...` rows of consecutive months. `#` lines are
/// comments. Blank cells are allowed before an entity's first and after its
/// last observation only.
pub fn decode_history(bytes: &[u8]) -> Result<DecodedHistory, ForecastError> {
    let mut reader = ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(bytes);
    let headers = reader.headers().map_err(|e| csv_error(&e))?.clone();
    let mut columns = headers.iter();
    match columns.next() {
        Some(first) if first.eq_ignore_ascii_case("date") => {}
        _ => {
            return Err(ForecastError::invalid(
                "history header must start with a `date` column",
            ))
        }
    }
    let ids = columns
        .map(EntityId::parse)
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(ForecastError::invalid("history has no entity columns"));
    }
    let mut seen = BTreeSet::new();
    for id in &ids {
        if !seen.insert(id) {
            return Err(EngineError::DuplicateEntity(id.clone()).into());
        }
    }

    let mut start: Option<Month> = None;
    let mut prev: Option<Month> = None;
    let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); ids.len()];
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(&e))?;
        let month = Month::parse(record.get(0).unwrap_or_default())?;
        match prev {
            Some(p) if month <= p => {
                return Err(ForecastError::invalid(format!(
                    "history month {month} follows {p}; rows must be in increasing order"
                )))
            }
            Some(p) if month != p.next() => {
                return Err(ForecastError::new(
                    ErrorCode::MissingMonth,
                    format!("history skips from {p} to {month}"),
                ))
            }
            Some(_) => {}
            None => start = Some(month),
        }
        prev = Some(month);
        for (i, id) in ids.iter().enumerate() {
            cells[i].push(parse_cell(id, month, record.get(i + 1).unwrap_or_default())?);
        }
    }

    let mut store = SeriesStore::new();
    let mut skipped_columns = Vec::new();
    let Some(start) = start else {
        return Ok(DecodedHistory {
            store,
            skipped_columns: ids.iter().map(ToString::to_string).collect(),
        });
    };
    for (id, column) in ids.into_iter().zip(cells) {
        let (Some(first), Some(last)) = (
            column.iter().position(Option::is_some),
            column.iter().rposition(Option::is_some),
        ) else {
            skipped_columns.push(id.to_string());
            continue;
        };
        let mut values = Vec::with_capacity(last - first + 1);
        for (offset, cell) in column[first..=last].iter().enumerate() {
            match cell {
                Some(v) => values.push(*v),
                None => {
                    return Err(EngineError::MissingMonth {
                        month: start.add_months((first + offset) as i32),
                        entity: id,
                    }
                    .into())
                }
            }
        }
        store.insert(TimeSeries::new(id, start.add_months(first as i32), values)?)?;
    }
    Ok(DecodedHistory {
        store,
        skipped_columns,
    })
}

/// Reads `entities.json`, a JSON array of entity metadata, keyed by id.
pub fn load_entities(path: &Path) -> Result<BTreeMap<EntityId, EntityMeta>, ForecastError> {
    let raw = fs::read(path).map_err(|e| io_error(path, e))?;
    let metas: Vec<EntityMeta> = serde_json::from_slice(&raw).map_err(|e| {
        ForecastError::invalid(format!("parse entities {} failed: {e}", path.display()))
    })?;
    let mut out = BTreeMap::new();
    for meta in metas {
        meta.validate()?;
        let id = meta.id.clone();
        if out.insert(id.clone(), meta).is_some() {
            return Err(ForecastError::invalid(format!(
                "entity {id} listed twice in {}",
                path.display()
            )));
        }
    }
    Ok(out)
}
