// ABOUTME: Console links and log group naming for SageMaker endpoints.
// ABOUTME: Used in success output and in failure guidance.

use crate::types::EndpointName;

/// CloudWatch log group SageMaker writes endpoint container output to.
pub fn log_group_name(endpoint: &EndpointName) -> String {
    format!("/aws/sagemaker/Endpoints/{endpoint}")
}

pub fn endpoint_console_url(region: &str, endpoint: &EndpointName) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/sagemaker/home?region={region}#/endpoints/{endpoint}"
    )
}

/// Link to the endpoint's log group. The console expects the group name
/// URL-encoded twice with `%` replaced by `$`.
pub fn log_group_console_url(region: &str, endpoint: &EndpointName) -> String {
    let group = log_group_name(endpoint);
    let encoded = urlencoding::encode(&urlencoding::encode(&group)).replace('%', "$");
    format!(
        "https://{region}.console.aws.amazon.com/cloudwatch/home?region={region}#logsV2:log-groups/log-group/{encoded}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_group_link_matches_console_encoding() {
        let ep = EndpointName::new("fraud-ep").unwrap();
        let url = log_group_console_url("us-east-1", &ep);
        assert!(url.ends_with("log-group/$252Faws$252Fsagemaker$252FEndpoints$252Ffraud-ep"));
    }

    #[test]
    fn endpoint_link_includes_region_and_name() {
        let ep = EndpointName::new("fraud-ep").unwrap();
        assert_eq!(
            endpoint_console_url("eu-west-1", &ep),
            "https://eu-west-1.console.aws.amazon.com/sagemaker/home?region=eu-west-1#/endpoints/fraud-ep"
        );
    }
}
