// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use analogcast_model::{EntityId, Month};

use crate::error::EngineError;

/// Contiguous monthly observations for one entity; `values[i]` belongs to
/// `start + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    entity: EntityId,
    start: Month,
    values: Vec<f64>,
}

fn check_value(entity: &EntityId, month: Month, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSeriesValue {
            entity: entity.clone(),
            month,
            value,
        })
    }
}

impl TimeSeries {
    pub fn new(entity: EntityId, start: Month, values: Vec<f64>) -> Result<Self, EngineError> {
        if values.is_empty() {
            return Err(EngineError::invalid(format!("series {entity} has no values")));
        }
        for (i, value) in values.iter().enumerate() {
            check_value(&entity, start.add_months(i as i32), *value)?;
        }
        Ok(Self {
            entity,
            start,
            values,
        })
    }

    #[must_use]
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    #[must_use]
    pub fn start(&self) -> Month {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Month {
        self.start.add_months(self.values.len() as i32 - 1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn offset_of(&self, month: Month) -> Option<usize> {
        usize::try_from(self.start.months_until(month))
            .ok()
            .filter(|i| *i < self.values.len())
    }

    #[must_use]
    pub fn value_at(&self, month: Month) -> Option<f64> {
        self.offset_of(month).map(|i| self.values[i])
    }

    /// `len` values starting at `from`, or `None` when any falls outside the span.
    #[must_use]
    pub fn slice(&self, from: Month, len: usize) -> Option<&[f64]> {
        let start = self.offset_of(from)?;
        self.values.get(start..start.checked_add(len)?)
    }

    /// Appends the next month. Anything but `end + 1` is rejected.
    pub fn push(&mut self, month: Month, value: f64) -> Result<(), EngineError> {
        let expected = self.end().next();
        if month > expected {
            return Err(EngineError::MissingMonth {
                entity: self.entity.clone(),
                month: expected,
            });
        }
        if month < expected {
            return Err(EngineError::OutOfOrder {
                entity: self.entity.clone(),
                month,
            });
        }
        check_value(&self.entity, month, value)?;
        self.values.push(value);
        Ok(())
    }

    /// Replaces an already observed month; the only retroactive mutation.
    pub fn correct(&mut self, month: Month, value: f64) -> Result<(), EngineError> {
        let i = self.offset_of(month).ok_or_else(|| {
            EngineError::OutOfRange(format!(
                "{month} is outside {}..={} for {}",
                self.start,
                self.end(),
                self.entity
            ))
        })?;
        check_value(&self.entity, month, value)?;
        self.values[i] = value;
        Ok(())
    }
}

/// All history, keyed and iterated in `EntityId` order. Read-only during a
/// forecast run.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: BTreeMap<EntityId, TimeSeries>,
}

impl SeriesStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: TimeSeries) -> Result<(), EngineError> {
        if self.series.contains_key(series.entity()) {
            return Err(EngineError::DuplicateEntity(series.entity().clone()));
        }
        self.series.insert(series.entity().clone(), series);
        Ok(())
    }

    pub fn get(&self, entity: &EntityId) -> Result<&TimeSeries, EngineError> {
        self.series
            .get(entity)
            .ok_or_else(|| EngineError::UnknownEntity(entity.clone()))
    }

    fn get_mut(&mut self, entity: &EntityId) -> Result<&mut TimeSeries, EngineError> {
        self.series
            .get_mut(entity)
            .ok_or_else(|| EngineError::UnknownEntity(entity.clone()))
    }

    pub fn append(&mut self, entity: &EntityId, month: Month, value: f64) -> Result<(), EngineError> {
        self.get_mut(entity)?.push(month, value)
    }

    pub fn correct(&mut self, entity: &EntityId, month: Month, value: f64) -> Result<(), EngineError> {
        self.get_mut(entity)?.correct(month, value)
    }

    #[must_use]
    pub fn first_month(&self) -> Option<Month> {
        self.series.values().map(TimeSeries::start).min()
    }

    #[must_use]
    pub fn last_month(&self) -> Option<Month> {
        self.series.values().map(TimeSeries::end).max()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeries> {
        self.series.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
