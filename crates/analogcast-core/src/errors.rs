// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

impl ExitCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::Validation => "validation",
            Self::DependencyFailure => "dependency_failure",
            Self::Internal => "internal",
        }
    }
}

/// Stable machine-readable error codes shared by the CLI and the artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    UsageError,
    InvalidConfig,
    InvalidInput,
    InvalidSeriesValue,
    MissingMonth,
    InsufficientHistory,
    OutOfRange,
    NotFound,
    Conflict,
    Io,
    Internal,
}

pub const ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::UsageError,
    ErrorCode::InvalidConfig,
    ErrorCode::InvalidInput,
    ErrorCode::InvalidSeriesValue,
    ErrorCode::MissingMonth,
    ErrorCode::InsufficientHistory,
    ErrorCode::OutOfRange,
    ErrorCode::NotFound,
    ErrorCode::Conflict,
    ErrorCode::Io,
    ErrorCode::Internal,
];

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UsageError => "usage_error",
            Self::InvalidConfig => "invalid_config",
            Self::InvalidInput => "invalid_input",
            Self::InvalidSeriesValue => "invalid_series_value",
            Self::MissingMonth => "missing_month",
            Self::InsufficientHistory => "insufficient_history",
            Self::OutOfRange => "out_of_range",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Io => "io_error",
            Self::Internal => "internal_error",
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        match self {
            Self::UsageError => ExitCode::Usage,
            Self::InvalidConfig
            | Self::InvalidInput
            | Self::InvalidSeriesValue
            | Self::MissingMonth
            | Self::InsufficientHistory
            | Self::OutOfRange => ExitCode::Validation,
            Self::NotFound | Self::Conflict | Self::Io => ExitCode::DependencyFailure,
            Self::Internal => ExitCode::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MachineError {}
