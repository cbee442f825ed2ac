// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod error;
mod local;
mod request;

use analogcast_model::{ForecastSnapshot, Period, RunManifest};

pub use error::{StoreError, StoreErrorCode};
pub use local::{LocalFsStore, PublishLockGuard};
pub use request::{ArtifactFile, PublishReceipt, PublishRequest};

pub const CRATE_NAME: &str = "analogcast-store";

pub trait ArtifactStore {
    /// Writes every file of a run, then its manifest, without ever exposing
    /// a partial file at a final path.
    fn publish_period(&self, request: &PublishRequest) -> Result<PublishReceipt, StoreError>;
    /// Points `latest.json`/`LATEST` at `period` unless a newer period is
    /// already latest. Returns whether the pointer moved.
    fn repoint_latest(&self, period: Period) -> Result<bool, StoreError>;
    fn read_snapshot(&self, period: Period) -> Result<ForecastSnapshot, StoreError>;
    fn read_manifest(&self, period: Period) -> Result<RunManifest, StoreError>;
    fn read_latest_period(&self) -> Result<Option<Period>, StoreError>;
    fn list_periods(&self) -> Result<Vec<Period>, StoreError>;
    fn acquire_publish_lock(&self) -> Result<PublishLockGuard, StoreError>;
}
