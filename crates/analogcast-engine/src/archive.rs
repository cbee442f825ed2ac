// SPDX-License-Identifier: Apache-2.0

use analogcast_model::EntityId;
use analogcast_policies::NormalizationMode;

use crate::error::EngineError;
use crate::series::SeriesStore;
use crate::window::{window, Window};

/// Every window of one length over every entity, normalized like targets.
/// Ordered by entity id, then end month.
#[derive(Debug, Clone)]
pub struct Archive {
    length: usize,
    mode: NormalizationMode,
    windows: Vec<Window>,
}

impl Archive {
    pub fn build(
        store: &SeriesStore,
        length: usize,
        mode: NormalizationMode,
    ) -> Result<Self, EngineError> {
        if length == 0 {
            return Err(EngineError::invalid("archive window length must be >= 1"));
        }
        let mut windows = Vec::new();
        for series in store.iter() {
            if series.len() < length {
                continue;
            }
            let first_end = series.start().add_months(length as i32 - 1);
            for end in first_end.through(series.end()) {
                windows.push(window(series, end, length, mode)?);
            }
        }
        Ok(Self {
            length,
            mode,
            windows,
        })
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    #[must_use]
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn windows_for<'a>(&'a self, entity: &'a EntityId) -> impl Iterator<Item = &'a Window> {
        self.windows.iter().filter(move |w| &w.entity == entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
