// ABOUTME: Error type shared by the SageMaker capability traits.
// ABOUTME: Classifies service answers into not-found, conflict, transient, and terminal.

/// Errors from SageMaker endpoint, provisioning, and registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostingError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("transient service error: {0}")]
    Transient(String),

    #[error("service error: {0}")]
    Service(String),
}

impl HostingError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostingError::NotFound(_))
    }

    /// Worth retrying at the caller's cadence.
    pub fn is_transient(&self) -> bool {
        matches!(self, HostingError::Transient(_))
    }

    /// Classify a service error code and message.
    ///
    /// SageMaker reports missing endpoints and duplicate names as
    /// `ValidationException`, so the message text decides.
    pub fn classify(code: &str, message: &str, resource: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        match code {
            "ThrottlingException" | "Throttling" | "ThrottledException" | "TooManyRequestsException"
            | "ServiceUnavailable" | "InternalFailure" | "InternalServerError" => {
                HostingError::Transient(format!("{code}: {message}"))
            }
            "ResourceNotFound" | "ResourceNotFoundException" => {
                HostingError::NotFound(resource.to_string())
            }
            "ResourceInUse" => HostingError::AlreadyExists(resource.to_string()),
            _ if lowered.contains("could not find") || lowered.contains("does not exist") => {
                HostingError::NotFound(resource.to_string())
            }
            _ if lowered.contains("already exist") => {
                HostingError::AlreadyExists(resource.to_string())
            }
            "ValidationException" | "ResourceLimitExceeded" => {
                HostingError::Rejected(format!("{code}: {message}"))
            }
            _ => HostingError::Service(format!("{code}: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_endpoint_validation_error_is_not_found() {
        let err = HostingError::classify(
            "ValidationException",
            "Could not find endpoint \"fraud-ep\".",
            "fraud-ep",
        );
        assert_eq!(err, HostingError::NotFound("fraud-ep".to_string()));
    }

    #[test]
    fn duplicate_endpoint_is_already_exists() {
        let err = HostingError::classify(
            "ValidationException",
            "Cannot create already existing endpoint \"arn:aws:sagemaker:...\".",
            "fraud-ep",
        );
        assert!(matches!(err, HostingError::AlreadyExists(_)));
    }

    #[test]
    fn throttling_is_transient() {
        assert!(HostingError::classify("ThrottlingException", "Rate exceeded", "x").is_transient());
    }

    #[test]
    fn other_validation_errors_are_rejected() {
        let err = HostingError::classify("ValidationException", "Role is invalid", "x");
        assert!(matches!(err, HostingError::Rejected(_)));
        assert!(!err.is_transient());
    }
}
