// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigPathScope {
    /// `ANALOGCAST_CONFIG`, then the XDG/HOME user config file.
    User,
    Workspace,
}

#[must_use]
pub fn resolve_config_path(scope: ConfigPathScope) -> PathBuf {
    match scope {
        ConfigPathScope::User => {
            if let Ok(explicit) = std::env::var(crate::ENV_CONFIG) {
                let trimmed = explicit.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                let trimmed = xdg_config_home.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed)
                        .join("analogcast")
                        .join("config.json");
                }
            }
            if let Ok(home) = std::env::var("HOME") {
                let trimmed = home.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed)
                        .join(".config")
                        .join("analogcast")
                        .join("config.json");
                }
            }
            PathBuf::from(".analogcast").join("config.json")
        }
        ConfigPathScope::Workspace => PathBuf::from(".analogcast").join("config.json"),
    }
}
