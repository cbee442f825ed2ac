// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use analogcast_core::sha256_hex;
use analogcast_model::{
    artifact_paths, snapshot_path, ForecastSnapshot, Month, Period, RunManifest, FORECASTS_DIR,
    LATEST_MARKER, LATEST_SNAPSHOT, PUBLISH_LOCK,
};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreErrorCode};
use crate::request::{PublishReceipt, PublishRequest};
use crate::ArtifactStore;

/// Single-writer lock held for the duration of a publish; removed on drop.
pub struct PublishLockGuard {
    lock_path: PathBuf,
}

impl Drop for PublishLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

pub struct LocalFsStore {
    pub root: PathBuf,
}

impl LocalFsStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    fn read_bytes(&self, relative: &str) -> Result<Vec<u8>, StoreError> {
        fs::read(self.resolve(relative)).map_err(|e| StoreError::io(relative, e))
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let context = path.display().to_string();
    let mut f = File::create(path).map_err(|e| StoreError::io(&context, e))?;
    f.write_all(bytes).map_err(|e| StoreError::io(&context, e))?;
    f.sync_all().map_err(|e| StoreError::io(&context, e))?;
    Ok(())
}

fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    let context = dir.display().to_string();
    let f = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| StoreError::io(&context, e))?;
    f.sync_all().map_err(|e| StoreError::io(&context, e))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` next to `path`, syncs and verifies them, and returns the
/// staged temporary path.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(&parent.display().to_string(), e))?;
    }
    let tmp = tmp_path(path);
    write_and_sync(&tmp, bytes)?;
    let written = fs::read(&tmp).map_err(|e| StoreError::io(&tmp.display().to_string(), e))?;
    if sha256_hex(&written) != sha256_hex(bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::new(
            StoreErrorCode::Io,
            format!("checksum verification failed for {}", path.display()),
        ));
    }
    Ok(tmp)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Moves `tmp` onto `path`, keeping any previous file aside as a backup.
fn place(path: &Path, tmp: &Path) -> Result<Option<PathBuf>, StoreError> {
    let context = path.display().to_string();
    let backup = if path.is_file() {
        let bak = backup_path(path);
        fs::rename(path, &bak).map_err(|e| StoreError::io(&context, e))?;
        Some(bak)
    } else {
        None
    };
    if let Err(e) = fs::rename(tmp, path) {
        if let Some(bak) = &backup {
            let _ = fs::rename(bak, path);
        }
        return Err(StoreError::io(&context, e));
    }
    Ok(backup)
}

/// Undoes already placed files (restoring backups) and drops pending temporaries.
fn roll_back(placed: &[(PathBuf, Option<PathBuf>)], pending: &[PathBuf]) {
    for tmp in pending {
        let _ = fs::remove_file(tmp);
    }
    for (path, backup) in placed.iter().rev() {
        let _ = match backup {
            Some(bak) => fs::rename(bak, path),
            None => fs::remove_file(path),
        };
    }
}

/// Stages every `(final, bytes)` pair, then renames them in order. Nothing
/// reaches a final path unless every file staged cleanly, and a failed rename
/// puts every earlier destination back the way it was.
fn commit_all(entries: &[(PathBuf, &[u8])]) -> Result<(), StoreError> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(entries.len());
    for (path, bytes) in entries {
        match stage(path, bytes) {
            Ok(tmp) => staged.push(tmp),
            Err(e) => {
                roll_back(&[], &staged);
                return Err(e);
            }
        }
    }
    let mut placed: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(entries.len());
    for (i, ((path, _), tmp)) in entries.iter().zip(&staged).enumerate() {
        match place(path, tmp) {
            Ok(backup) => placed.push((path.clone(), backup)),
            Err(e) => {
                warn!(path = %path.display(), "commit failed; rolling back");
                roll_back(&placed, &staged[i..]);
                return Err(e);
            }
        }
    }
    let mut dirs = BTreeSet::new();
    for (path, backup) in &placed {
        if let Some(bak) = backup {
            let _ = fs::remove_file(bak);
        }
        if let Some(parent) = path.parent() {
            dirs.insert(parent.to_path_buf());
        }
    }
    for dir in dirs {
        sync_dir(&dir)?;
    }
    Ok(())
}

impl ArtifactStore for LocalFsStore {
    fn publish_period(&self, request: &PublishRequest) -> Result<PublishReceipt, StoreError> {
        let manifest = request.verify()?;
        let _guard = self.acquire_publish_lock()?;
        let paths = artifact_paths(request.period);
        if self.resolve(&paths.snapshot).exists() {
            if !request.overwrite {
                return Err(StoreError::new(
                    StoreErrorCode::Conflict,
                    format!(
                        "period {} already published; snapshots are immutable without overwrite",
                        request.period
                    ),
                ));
            }
            warn!(period = %request.period, "overwriting published period");
        }

        let mut entries: Vec<(PathBuf, &[u8])> = request
            .files
            .iter()
            .map(|f| (self.resolve(&f.path), f.bytes.as_slice()))
            .collect();
        entries.push((self.resolve(&paths.manifest), request.manifest.as_slice()));
        commit_all(&entries)?;

        for file in &request.files {
            debug!(path = %file.path, bytes = file.bytes.len(), "artifact published");
        }
        info!(
            period = %request.period,
            files = request.files.len(),
            root = %self.root.display(),
            "period published"
        );
        Ok(PublishReceipt {
            period: request.period,
            manifest_path: paths.manifest,
            artifacts: manifest.artifacts,
        })
    }

    fn repoint_latest(&self, period: Period) -> Result<bool, StoreError> {
        let _guard = self.acquire_publish_lock()?;
        if let Some(current) = self.read_latest_period()? {
            if current > period {
                debug!(%current, %period, "latest pointer left on newer period");
                return Ok(false);
            }
        }
        let snapshot = self.read_bytes(&snapshot_path(period))?;
        let marker = format!("{period}\n");
        commit_all(&[
            (self.resolve(LATEST_SNAPSHOT), snapshot.as_slice()),
            (self.resolve(LATEST_MARKER), marker.as_bytes()),
        ])?;
        info!(%period, "latest pointer moved");
        Ok(true)
    }

    fn read_snapshot(&self, period: Period) -> Result<ForecastSnapshot, StoreError> {
        let raw = self.read_bytes(&snapshot_path(period))?;
        let snapshot: ForecastSnapshot = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?;
        snapshot
            .validate_strict()
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?;
        Ok(snapshot)
    }

    fn read_manifest(&self, period: Period) -> Result<RunManifest, StoreError> {
        let raw = self.read_bytes(&artifact_paths(period).manifest)?;
        let manifest: RunManifest = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?;
        manifest
            .validate_strict()
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?;
        Ok(manifest)
    }

    fn read_latest_period(&self) -> Result<Option<Period>, StoreError> {
        let path = self.resolve(LATEST_MARKER);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(LATEST_MARKER, e)),
        };
        Month::parse(raw.trim())
            .map(Some)
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, format!("LATEST marker: {e}")))
    }

    fn list_periods(&self) -> Result<Vec<Period>, StoreError> {
        let dir = self.resolve(FORECASTS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(FORECASTS_DIR, e)),
        };
        let mut periods = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(FORECASTS_DIR, e))?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if stem.len() != 7 {
                continue;
            }
            if let Ok(period) = Month::parse(stem) {
                periods.push(period);
            }
        }
        periods.sort();
        Ok(periods)
    }

    fn acquire_publish_lock(&self) -> Result<PublishLockGuard, StoreError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::io(&self.root.display().to_string(), e))?;
        let lock_path = self.root.join(PUBLISH_LOCK);
        match OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&lock_path)
        {
            Ok(_) => Ok(PublishLockGuard { lock_path }),
            Err(e) => Err(StoreError::new(
                StoreErrorCode::Conflict,
                format!("failed to acquire publish lock {}: {e}", lock_path.display()),
            )),
        }
    }
}
