// ABOUTME: SageMaker resource name validation for endpoints.
// ABOUTME: Enforces the 63-character alphanumeric-and-hyphen naming rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Maximum length of a SageMaker endpoint, endpoint configuration or model name.
pub const MAX_NAME_LEN: usize = 63;

/// Timestamp layout appended to generated names.
pub const NAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointNameError {
    #[error("endpoint name cannot be empty")]
    Empty,

    #[error("endpoint name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("endpoint name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("endpoint name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in endpoint name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointName(String);

impl EndpointName {
    pub fn new(value: &str) -> Result<Self, EndpointNameError> {
        Self::validate(value)?;
        Ok(Self(value.to_string()))
    }

    /// Generate `<prefix>-<UTC timestamp>`, trimming the prefix if needed.
    pub fn generate(prefix: &str, now: DateTime<Utc>) -> Result<Self, EndpointNameError> {
        let stamp = now.format(NAME_TIMESTAMP_FORMAT).to_string();
        let room = MAX_NAME_LEN - stamp.len() - 1;
        let prefix: String = prefix.chars().take(room).collect();
        Self::new(&format!("{}-{}", prefix.trim_end_matches('-'), stamp))
    }

    pub(crate) fn validate(value: &str) -> Result<(), EndpointNameError> {
        if value.is_empty() {
            return Err(EndpointNameError::Empty);
        }

        if value.len() > MAX_NAME_LEN {
            return Err(EndpointNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(EndpointNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(EndpointNameError::EndsWithHyphen);
        }

        if let Some(c) = value.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(EndpointNameError::InvalidChar(c));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build `<name>-<suffix>`, truncating the name part so the result stays
    /// within the resource name limit.
    pub fn derived(&self, suffix: &str) -> String {
        let suffix = suffix.trim_matches('-');
        let room = MAX_NAME_LEN.saturating_sub(suffix.len() + 1);
        let head = &self.0[..self.0.len().min(room)];
        format!("{}-{}", head.trim_end_matches('-'), suffix)
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EndpointName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EndpointName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
