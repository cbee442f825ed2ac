// SPDX-License-Identifier: Apache-2.0

use analogcast_core::ErrorCode;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::ForecastError;

/// Source of a run's `generatedAt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// `1970-01-01T00:00:00Z`, so identical inputs give identical bytes.
    DeterministicZero,
    WallClock,
    /// Any RFC3339 timestamp; converted to UTC.
    Fixed(String),
}

impl TimestampPolicy {
    pub fn resolve(&self) -> Result<String, ForecastError> {
        match self {
            Self::DeterministicZero => Ok(format_utc(DateTime::<Utc>::UNIX_EPOCH)),
            Self::WallClock => Ok(format_utc(Utc::now())),
            Self::Fixed(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| format_utc(t.with_timezone(&Utc)))
                .map_err(|e| {
                    ForecastError::new(
                        ErrorCode::UsageError,
                        format!("generated-at `{raw}` is not RFC3339: {e}"),
                    )
                }),
        }
    }
}

fn format_utc(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
