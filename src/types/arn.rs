// ABOUTME: Amazon Resource Name parsing for model packages and IAM roles.
// ABOUTME: Handles arn:partition:service:region:account:resource shapes.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseArnError {
    #[error("ARN cannot be empty")]
    Empty,

    #[error("'{0}' is not an ARN (expected arn:<partition>:<service>:<region>:<account>:<resource>)")]
    NotAnArn(String),

    #[error("invalid character in ARN: {0:?}")]
    InvalidChar(char),

    #[error("expected a {expected} ARN, got service '{found}'")]
    WrongService {
        expected: &'static str,
        found: String,
    },

    #[error("expected a {expected} resource, got '{found}'")]
    WrongResource {
        expected: &'static str,
        found: String,
    },

    #[error("ARN is missing its {0}")]
    MissingField(&'static str),
}

/// A syntactically valid ARN, split into its components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Arn {
    partition: String,
    service: String,
    region: String,
    account: String,
    resource: String,
}

impl Arn {
    fn parse(input: &str) -> Result<Self, ParseArnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseArnError::Empty);
        }

        if let Some(c) = input.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(ParseArnError::InvalidChar(c));
        }

        // The resource part may itself contain colons, so only split five times.
        let parts: Vec<&str> = input.splitn(6, ':').collect();
        match parts.as_slice() {
            ["arn", partition, service, region, account, resource] => {
                if !partition.starts_with("aws") {
                    return Err(ParseArnError::NotAnArn(input.to_string()));
                }
                Ok(Self {
                    partition: (*partition).to_string(),
                    service: (*service).to_string(),
                    region: (*region).to_string(),
                    account: (*account).to_string(),
                    resource: (*resource).to_string(),
                })
            }
            _ => Err(ParseArnError::NotAnArn(input.to_string())),
        }
    }

    fn expect_service(&self, expected: &'static str) -> Result<(), ParseArnError> {
        if self.service != expected {
            return Err(ParseArnError::WrongService {
                expected,
                found: self.service.clone(),
            });
        }
        Ok(())
    }

    fn require(value: &str, field: &'static str) -> Result<(), ParseArnError> {
        if value.is_empty() {
            return Err(ParseArnError::MissingField(field));
        }
        Ok(())
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

/// ARN of a registered SageMaker model package, versioned or not.
///
/// `arn:aws:sagemaker:us-east-1:123456789012:model-package/fraud-detector/3`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelPackageArn {
    arn: Arn,
}

impl ModelPackageArn {
    const RESOURCE_PREFIX: &'static str = "model-package/";

    pub fn parse(input: &str) -> Result<Self, ParseArnError> {
        let arn = Arn::parse(input)?;
        arn.expect_service("sagemaker")?;
        Arn::require(&arn.region, "region")?;
        Arn::require(&arn.account, "account")?;

        let name = arn
            .resource
            .strip_prefix(Self::RESOURCE_PREFIX)
            .ok_or_else(|| ParseArnError::WrongResource {
                expected: "model-package",
                found: arn.resource.clone(),
            })?;
        Arn::require(name, "model package name")?;

        Ok(Self { arn })
    }

    pub fn region(&self) -> &str {
        &self.arn.region
    }

    pub fn account(&self) -> &str {
        &self.arn.account
    }

    /// Package group name (or package name for unversioned packages).
    pub fn group(&self) -> &str {
        self.package_path()
            .split('/')
            .next()
            .unwrap_or_default()
    }

    /// Version number for versioned packages.
    pub fn version(&self) -> Option<u32> {
        self.package_path()
            .split_once('/')
            .and_then(|(_, v)| v.parse().ok())
    }

    fn package_path(&self) -> &str {
        self.arn
            .resource
            .strip_prefix(Self::RESOURCE_PREFIX)
            .unwrap_or(&self.arn.resource)
    }
}

impl fmt::Display for ModelPackageArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.arn.fmt(f)
    }
}

/// ARN of the IAM role SageMaker assumes to pull model artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleArn {
    arn: Arn,
}

impl RoleArn {
    pub fn parse(input: &str) -> Result<Self, ParseArnError> {
        let arn = Arn::parse(input)?;
        arn.expect_service("iam")?;
        Arn::require(&arn.account, "account")?;
        match arn.resource.strip_prefix("role/") {
            Some(name) if !name.is_empty() => Ok(Self { arn }),
            _ => Err(ParseArnError::WrongResource {
                expected: "role",
                found: arn.resource.clone(),
            }),
        }
    }

    pub fn account(&self) -> &str {
        &self.arn.account
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.arn.fmt(f)
    }
}
