// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Leaf crate shared by every analogcast crate: machine error codes, process
//! exit codes, canonical JSON hashing and config path resolution.

pub mod canonical;
mod config;
mod errors;

pub use canonical::sha256_hex;
pub use config::{resolve_config_path, ConfigPathScope};
pub use errors::{ErrorCode, ExitCode, MachineError, ERROR_CODES};

pub const CRATE_NAME: &str = "analogcast-core";

pub const ENV_LOG_LEVEL: &str = "ANALOGCAST_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "ANALOGCAST_LOG_JSON";
pub const ENV_CONFIG: &str = "ANALOGCAST_CONFIG";
