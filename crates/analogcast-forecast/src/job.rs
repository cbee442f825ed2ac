// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use analogcast_core::ErrorCode;
use analogcast_model::{artifact_paths, ArtifactPaths, Period};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{ForecastError, ForecastOptions};

#[derive(Debug, Clone)]
pub struct ForecastInputs {
    pub history_path: PathBuf,
    pub entities_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ForecastJob {
    pub inputs: ForecastInputs,
    pub output_root: PathBuf,
    pub options: ForecastOptions,
}

impl ForecastJob {
    #[must_use]
    pub fn from_options(options: &ForecastOptions) -> Self {
        Self {
            inputs: ForecastInputs {
                history_path: options.history_path.clone(),
                entities_path: options.entities_path.clone(),
            },
            output_root: options.output_root.clone(),
            options: options.clone(),
        }
    }

    /// Output layout for `period`; the period is only known once the
    /// history is decoded.
    #[must_use]
    pub fn layout(&self, period: Period) -> ArtifactPaths {
        artifact_paths(period)
    }

    /// Absolute location of a store-relative artifact path.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.output_root.clone(), |acc, part| acc.join(part))
    }
}

/// A dedicated pool when a thread cap is given; `0` threads is rejected.
pub fn parallelism_policy(max_threads: Option<usize>) -> Result<Option<ThreadPool>, ForecastError> {
    match max_threads {
        None => Ok(None),
        Some(0) => Err(ForecastError::new(
            ErrorCode::UsageError,
            "max_threads must be >= 1",
        )),
        Some(n) => ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("analogcast-forecast-{i}"))
            .build()
            .map(Some)
            .map_err(|e| ForecastError::internal(format!("thread pool: {e}"))),
    }
}
