// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ValidationError;

pub const ENTITY_ID_MAX_LEN: usize = 64;
pub const ENTITY_NAME_MAX_LEN: usize = 128;

/// Country ISO3 code or grid cell id. Byte order of the id is the
/// deterministic tie-breaker used by analog retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError("entity id must not be empty".to_string()));
        }
        if input.len() > ENTITY_ID_MAX_LEN {
            return Err(ValidationError(format!(
                "entity id exceeds max length {ENTITY_ID_MAX_LEN}"
            )));
        }
        if input.trim() != input {
            return Err(ValidationError(format!(
                "entity id `{input}` must not have leading/trailing whitespace"
            )));
        }
        if input.chars().any(|c| c.is_control() || c == ',' || c == '"') {
            return Err(ValidationError(format!(
                "entity id `{}` must not contain control characters, ',' or '\"'",
                input.escape_debug()
            )));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum EntityType {
    #[default]
    Country,
    Grid,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Grid => "grid",
        }
    }
}

/// Display metadata for one forecasting unit, loaded from `entities.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityMeta {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "entityType", default)]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl EntityMeta {
    /// Metadata used when an entity has no entry in `entities.json`.
    #[must_use]
    pub fn fallback(id: EntityId) -> Self {
        Self {
            name: id.as_str().to_string(),
            id,
            entity_type: EntityType::Country,
            iso3: None,
            lat: None,
            lon: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError(format!("entity {} has an empty name", self.id)));
        }
        if self.name.len() > ENTITY_NAME_MAX_LEN {
            return Err(ValidationError(format!(
                "entity {} name exceeds max length {ENTITY_NAME_MAX_LEN}",
                self.id
            )));
        }
        if let Some(iso3) = &self.iso3 {
            if iso3.len() != 3 || !iso3.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(ValidationError(format!(
                    "entity {} iso3 `{iso3}` must be three upper-case letters",
                    self.id
                )));
            }
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(ValidationError(format!(
                        "entity {} coordinates out of range: lat={lat} lon={lon}",
                        self.id
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(ValidationError(format!(
                    "entity {} must carry both lat and lon or neither",
                    self.id
                )))
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}
