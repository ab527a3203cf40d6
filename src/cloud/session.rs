// ABOUTME: Explicit AWS session built once per command and handed to collaborators.
// ABOUTME: Resolves credentials in order: profile, session token, access keys, default chain.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sagemaker::config::Credentials;
use std::fmt;

use super::cloudwatch::CloudWatchLogsBackend;
use super::sagemaker::SageMakerBackend;

const PROVIDER_NAME: &str = "sagedeploy-environment";

/// Errors resolving where credentials and region come from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(
        "no AWS region configured; export AWS_REGION, pass --region, or set `region:` in sagedeploy.yml"
    )]
    MissingRegion,

    #[error("{present} is set but {missing} is not; export both or neither")]
    IncompleteKeyPair {
        present: &'static str,
        missing: &'static str,
    },
}

/// Where the session's credentials come from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Named profile from the shared config files.
    Profile(String),
    /// Temporary credentials from the environment.
    SessionToken {
        access_key_id: String,
        secret_access_key: String,
        session_token: String,
    },
    /// Long-lived access keys from the environment.
    AccessKeys {
        access_key_id: String,
        secret_access_key: String,
    },
    /// The SDK's default provider chain (instance profile, SSO, etc.).
    Default,
}

impl CredentialSource {
    /// Resolve the credential source from an explicit profile and an
    /// environment lookup.
    pub fn resolve(
        profile: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SessionError> {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(profile) = profile
            .map(str::to_string)
            .or_else(|| non_empty("AWS_PROFILE"))
        {
            return Ok(CredentialSource::Profile(profile));
        }

        let key_id = non_empty("AWS_ACCESS_KEY_ID");
        let secret = non_empty("AWS_SECRET_ACCESS_KEY");
        let (access_key_id, secret_access_key) = match (key_id, secret) {
            (Some(k), Some(s)) => (k, s),
            (Some(_), None) => {
                return Err(SessionError::IncompleteKeyPair {
                    present: "AWS_ACCESS_KEY_ID",
                    missing: "AWS_SECRET_ACCESS_KEY",
                });
            }
            (None, Some(_)) => {
                return Err(SessionError::IncompleteKeyPair {
                    present: "AWS_SECRET_ACCESS_KEY",
                    missing: "AWS_ACCESS_KEY_ID",
                });
            }
            (None, None) => return Ok(CredentialSource::Default),
        };

        Ok(match non_empty("AWS_SESSION_TOKEN") {
            Some(session_token) => CredentialSource::SessionToken {
                access_key_id,
                secret_access_key,
                session_token,
            },
            None => CredentialSource::AccessKeys {
                access_key_id,
                secret_access_key,
            },
        })
    }

    /// Resolve from the process environment.
    pub fn from_env(profile: Option<&str>) -> Result<Self, SessionError> {
        Self::resolve(profile, |key| std::env::var(key).ok())
    }

    pub fn describe(&self) -> String {
        match self {
            CredentialSource::Profile(name) => format!("profile '{name}'"),
            CredentialSource::SessionToken { .. } => "session token from environment".to_string(),
            CredentialSource::AccessKeys { .. } => "access keys from environment".to_string(),
            CredentialSource::Default => "default credential chain".to_string(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialSource({})", self.describe())
    }
}

/// A loaded AWS configuration for one region.
pub struct AwsSession {
    region: String,
    source: CredentialSource,
    config: SdkConfig,
}

impl AwsSession {
    /// Load SDK configuration for `region` with credentials from `source`.
    pub async fn connect(region: &str, source: CredentialSource) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        loader = match &source {
            CredentialSource::Profile(name) => loader.profile_name(name),
            CredentialSource::SessionToken {
                access_key_id,
                secret_access_key,
                session_token,
            } => loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                Some(session_token.clone()),
                None,
                PROVIDER_NAME,
            )),
            CredentialSource::AccessKeys {
                access_key_id,
                secret_access_key,
            } => loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                PROVIDER_NAME,
            )),
            CredentialSource::Default => loader,
        };

        let config = loader.load().await;
        tracing::debug!(region, credentials = %source.describe(), "AWS session ready");

        Self {
            region: region.to_string(),
            source,
            config,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn credential_source(&self) -> &CredentialSource {
        &self.source
    }

    pub fn hosting(&self) -> SageMakerBackend {
        SageMakerBackend::new(aws_sdk_sagemaker::Client::new(&self.config))
    }

    pub fn logs(&self) -> CloudWatchLogsBackend {
        CloudWatchLogsBackend::new(aws_sdk_cloudwatchlogs::Client::new(&self.config))
    }
}
