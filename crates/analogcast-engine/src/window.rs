// SPDX-License-Identifier: Apache-2.0

use analogcast_model::{EntityId, Month};
use analogcast_policies::NormalizationMode;

use crate::error::EngineError;
use crate::series::TimeSeries;

/// Parameters of the rescaling applied to a window, kept so values can be
/// mapped in both directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    None,
    /// `max > min` always holds; flat windows record `max = min + 1`.
    MinMax { min: f64, max: f64 },
    /// `std > 0` always holds; flat windows record `std = 1`.
    ZScore { mean: f64, std: f64 },
}

impl Normalization {
    #[must_use]
    pub fn fit(mode: NormalizationMode, values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::None;
        }
        match mode {
            NormalizationMode::None => Self::None,
            NormalizationMode::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let max = if max > min { max } else { min + 1.0 };
                Self::MinMax { min, max }
            }
            NormalizationMode::ZScore => {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                let std = if std > 0.0 { std } else { 1.0 };
                Self::ZScore { mean, std }
            }
        }
    }

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::None => x,
            Self::MinMax { min, max } => (x - min) / (max - min),
            Self::ZScore { mean, std } => (x - mean) / std,
        }
    }

    #[must_use]
    pub fn invert(self, y: f64) -> f64 {
        match self {
            Self::None => y,
            Self::MinMax { min, max } => min + y * (max - min),
            Self::ZScore { mean, std } => mean + y * std,
        }
    }

    #[must_use]
    pub const fn mode(self) -> NormalizationMode {
        match self {
            Self::None => NormalizationMode::None,
            Self::MinMax { .. } => NormalizationMode::MinMax,
            Self::ZScore { .. } => NormalizationMode::ZScore,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub entity: EntityId,
    pub start: Month,
    pub end: Month,
    /// Values fed to DTW (normalized unless the mode is `none`).
    pub values: Vec<f64>,
    pub raw: Vec<f64>,
    pub normalization: Normalization,
}

impl Window {
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Months `[start, end]` intersect `[other.start, other.end]` for the same entity.
    #[must_use]
    pub fn overlaps(&self, other: &Window) -> bool {
        self.entity == other.entity && self.start <= other.end && other.start <= self.end
    }
}

/// The `length` months of `series` ending at `end`, inclusive.
pub fn window(
    series: &TimeSeries,
    end: Month,
    length: usize,
    mode: NormalizationMode,
) -> Result<Window, EngineError> {
    if length == 0 {
        return Err(EngineError::invalid("window length must be >= 1"));
    }
    if end > series.end() {
        return Err(EngineError::OutOfRange(format!(
            "window end {end} is after the last observed month {} of {}",
            series.end(),
            series.entity()
        )));
    }
    let span = i32::try_from(length - 1)
        .map_err(|_| EngineError::invalid(format!("window length {length} too large")))?;
    let start = end.add_months(-span);
    if start < series.start() {
        return Err(EngineError::OutOfRange(format!(
            "window {start}..={end} starts before the first observed month {} of {}",
            series.start(),
            series.entity()
        )));
    }
    let raw = series
        .slice(start, length)
        .ok_or_else(|| EngineError::OutOfRange(format!("window {start}..={end} not observed")))?
        .to_vec();
    let normalization = Normalization::fit(mode, &raw);
    let values = raw.iter().map(|v| normalization.apply(*v)).collect();
    Ok(Window {
        entity: series.entity().clone(),
        start,
        end,
        values,
        raw,
        normalization,
    })
}
