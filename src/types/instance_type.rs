// ABOUTME: SageMaker hosting instance type validation.
// ABOUTME: Accepts ml.<family>.<size> and flags types outside the recommended set.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CPU instance types known to host the packaged models well.
pub const RECOMMENDED_INSTANCE_TYPES: &[&str] = &[
    "ml.c5.xlarge",
    "ml.c5.2xlarge",
    "ml.c5.4xlarge",
    "ml.t2.medium",
    "ml.m5.xlarge",
];

pub const DEFAULT_INSTANCE_TYPE: &str = "ml.c5.2xlarge";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceTypeError {
    #[error("instance type cannot be empty")]
    Empty,

    #[error("instance type '{0}' must start with 'ml.'")]
    MissingPrefix(String),

    #[error("instance type '{0}' must look like ml.<family>.<size>")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceType(String);

impl InstanceType {
    pub fn new(value: &str) -> Result<Self, InstanceTypeError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(InstanceTypeError::Empty);
        }

        let rest = value
            .strip_prefix("ml.")
            .ok_or_else(|| InstanceTypeError::MissingPrefix(value.to_string()))?;

        let valid = match rest.split_once('.') {
            Some((family, size)) => {
                !family.is_empty()
                    && !size.is_empty()
                    && family.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                    && size.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            }
            None => false,
        };
        if !valid {
            return Err(InstanceTypeError::InvalidFormat(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_recommended(&self) -> bool {
        RECOMMENDED_INSTANCE_TYPES.contains(&self.0.as_str())
    }
}

impl Default for InstanceType {
    fn default() -> Self {
        Self(DEFAULT_INSTANCE_TYPE.to_string())
    }
}

impl FromStr for InstanceType {
    type Err = InstanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
