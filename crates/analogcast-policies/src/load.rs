// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use analogcast_core::{resolve_config_path, ConfigPathScope, ENV_CONFIG};

use crate::schema::ForecastConfig;
use crate::validate::{validate_forecast_config, PolicyValidationError};

pub const WORKSPACE_CONFIG_PATH: &str = ".analogcast/config.json";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    Workspace(PathBuf),
    User(PathBuf),
    Defaults,
}

impl ConfigSource {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Flag(p) | Self::Env(p) | Self::Workspace(p) | Self::User(p) => Some(p),
            Self::Defaults => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Flag(_) => "flag",
            Self::Env(_) => "env",
            Self::Workspace(_) => "workspace",
            Self::User(_) => "user",
            Self::Defaults => "defaults",
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<ForecastConfig, PolicyValidationError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        PolicyValidationError(format!("read config {} failed: {e}", path.display()))
    })?;
    let cfg: ForecastConfig = serde_json::from_str(&raw).map_err(|e| {
        PolicyValidationError(format!("parse config {} failed: {e}", path.display()))
    })?;
    validate_forecast_config(&cfg)?;
    Ok(cfg)
}

/// Resolution order: explicit flag, `ANALOGCAST_CONFIG`, the workspace file,
/// the user file, then built-in defaults. Explicit sources must exist; the
/// workspace and user files are only used when present.
pub fn load_effective_config(
    explicit: Option<&Path>,
    workspace_root: &Path,
) -> Result<(ForecastConfig, ConfigSource), PolicyValidationError> {
    if let Some(path) = explicit {
        return Ok((load_config_from_path(path)?, ConfigSource::Flag(path.to_path_buf())));
    }
    let env_set = std::env::var(ENV_CONFIG)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    if env_set {
        let path = resolve_config_path(ConfigPathScope::User);
        return Ok((load_config_from_path(&path)?, ConfigSource::Env(path)));
    }
    let workspace = workspace_root.join(resolve_config_path(ConfigPathScope::Workspace));
    if workspace.is_file() {
        return Ok((load_config_from_path(&workspace)?, ConfigSource::Workspace(workspace)));
    }
    let user = resolve_config_path(ConfigPathScope::User);
    if user.is_absolute() && user.is_file() {
        return Ok((load_config_from_path(&user)?, ConfigSource::User(user)));
    }
    let cfg = ForecastConfig::default();
    validate_forecast_config(&cfg)?;
    Ok((cfg, ConfigSource::Defaults))
}
