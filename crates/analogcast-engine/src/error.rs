// SPDX-License-Identifier: Apache-2.0

use analogcast_core::ErrorCode;
use analogcast_model::{EntityId, Month};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EngineError {
    InvalidInput(String),
    OutOfRange(String),
    InsufficientHistory {
        entity: EntityId,
        required: usize,
        available: usize,
    },
    InvalidSeriesValue {
        entity: EntityId,
        month: Month,
        value: f64,
    },
    MissingMonth {
        entity: EntityId,
        month: Month,
    },
    OutOfOrder {
        entity: EntityId,
        month: Month,
    },
    DuplicateEntity(EntityId),
    UnknownEntity(EntityId),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) | Self::OutOfOrder { .. } | Self::DuplicateEntity(_) => {
                ErrorCode::InvalidInput
            }
            Self::OutOfRange(_) => ErrorCode::OutOfRange,
            Self::InsufficientHistory { .. } => ErrorCode::InsufficientHistory,
            Self::InvalidSeriesValue { .. } => ErrorCode::InvalidSeriesValue,
            Self::MissingMonth { .. } => ErrorCode::MissingMonth,
            Self::UnknownEntity(_) => ErrorCode::NotFound,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::OutOfRange(msg) => write!(f, "out of range: {msg}"),
            Self::InsufficientHistory {
                entity,
                required,
                available,
            } => write!(
                f,
                "insufficient history for {entity}: need {required} months, have {available}"
            ),
            Self::InvalidSeriesValue {
                entity,
                month,
                value,
            } => write!(f, "invalid series value {value} for {entity} at {month}"),
            Self::MissingMonth { entity, month } => {
                write!(f, "missing month {month} for {entity}")
            }
            Self::OutOfOrder { entity, month } => {
                write!(f, "month {month} for {entity} is out of order")
            }
            Self::DuplicateEntity(entity) => write!(f, "duplicate entity {entity}"),
            Self::UnknownEntity(entity) => write!(f, "unknown entity {entity}"),
        }
    }
}

impl std::error::Error for EngineError {}
