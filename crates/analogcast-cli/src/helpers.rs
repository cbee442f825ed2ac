// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use analogcast_core::{ErrorCode, ENV_LOG_JSON, ENV_LOG_LEVEL};
use analogcast_policies::{load_effective_config, ConfigSource, ForecastConfig};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{CliError, LogFlags, OutputMode};

pub(crate) fn emit_ok(output_mode: OutputMode, payload: &Value) -> Result<(), CliError> {
    let encoded = if output_mode.json {
        serde_json::to_string(payload)
    } else {
        serde_json::to_string_pretty(payload)
    }
    .map_err(|e| CliError::internal(e.to_string()))?;
    println!("{encoded}");
    Ok(())
}

fn env_bool(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn log_filter(flags: LogFlags) -> EnvFilter {
    if flags.trace {
        return EnvFilter::new("trace");
    }
    if flags.verbose > 0 {
        return EnvFilter::new("debug");
    }
    if flags.quiet {
        return EnvFilter::new("warn");
    }
    EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs go to stderr so stdout stays a single JSON document.
pub(crate) fn init_tracing(flags: LogFlags) {
    let filter = log_filter(flags);
    let result = if flags.json || env_bool(ENV_LOG_JSON) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    // A subscriber installed by an embedding process wins.
    let _ = result;
}

pub(crate) fn current_dir() -> Result<PathBuf, CliError> {
    std::env::current_dir().map_err(|e| {
        CliError::from_code(ErrorCode::Io, format!("failed to resolve working directory: {e}"))
    })
}

pub(crate) fn effective_config(
    explicit: Option<&Path>,
) -> Result<(ForecastConfig, ConfigSource), CliError> {
    let root = current_dir()?;
    Ok(load_effective_config(explicit, &root)?)
}
