// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use analogcast_core::sha256_hex;
use analogcast_model::{artifact_paths, Period, RunManifest};

use crate::error::{StoreError, StoreErrorCode};

/// One artifact addressed relative to the store root with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArtifactFile {
    #[must_use]
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    #[must_use]
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub period: Period,
    pub files: Vec<ArtifactFile>,
    /// Encoded `RunManifest`; it must list every file above with its checksum.
    pub manifest: Vec<u8>,
    /// Replace an already published snapshot for `period`.
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub period: Period,
    pub manifest_path: String,
    pub artifacts: BTreeMap<String, String>,
}

pub(crate) fn validate_relative_path(path: &str) -> Result<(), StoreError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.ends_with(".tmp")
        || path
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            format!("artifact path `{path}` must be a clean relative path"),
        ));
    }
    Ok(())
}

impl PublishRequest {
    /// Checks paths and that the manifest is the checksum ledger of exactly
    /// these files.
    pub(crate) fn verify(&self) -> Result<RunManifest, StoreError> {
        let manifest: RunManifest = serde_json::from_slice(&self.manifest).map_err(|e| {
            StoreError::new(StoreErrorCode::Validation, format!("run manifest decode: {e}"))
        })?;
        manifest
            .validate_strict()
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?;
        if manifest.period != self.period {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!(
                    "manifest period {} does not match request period {}",
                    manifest.period, self.period
                ),
            ));
        }
        let paths = artifact_paths(self.period);
        let mut seen = BTreeSet::new();
        for file in &self.files {
            validate_relative_path(&file.path)?;
            if file.path == paths.manifest || !seen.insert(file.path.as_str()) {
                return Err(StoreError::new(
                    StoreErrorCode::Validation,
                    format!("artifact path `{}` listed twice", file.path),
                ));
            }
            match manifest.artifacts.get(&file.path) {
                Some(expected) if *expected == file.sha256() => {}
                Some(_) => {
                    return Err(StoreError::new(
                        StoreErrorCode::Validation,
                        format!("manifest checksum mismatch for `{}`", file.path),
                    ))
                }
                None => {
                    return Err(StoreError::new(
                        StoreErrorCode::Validation,
                        format!("manifest does not list `{}`", file.path),
                    ))
                }
            }
        }
        if manifest.artifacts.len() != self.files.len() {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "manifest lists artifacts that are not part of the request",
            ));
        }
        if !seen.contains(paths.snapshot.as_str()) {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!("request must include the period snapshot `{}`", paths.snapshot),
            ));
        }
        Ok(manifest)
    }
}
