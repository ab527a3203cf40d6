// ABOUTME: SageMaker-backed implementation of the hosting capability traits.
// ABOUTME: Maps SDK requests and errors onto backend-neutral types.

use async_trait::async_trait;
use aws_sdk_sagemaker::Client;
use aws_sdk_sagemaker::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sagemaker::primitives::DateTime as SdkDateTime;
use aws_sdk_sagemaker::types::{
    ContainerDefinition, ModelApprovalStatus, ModelPackageSortBy, ProductionVariant,
    ProductionVariantInstanceType, SortOrder,
};
use chrono::{DateTime, Utc};

use super::traits::{EndpointOps, HostingError, ProvisioningOps, RegistryOps};
use super::types::{
    ApprovalStatus, ConfigVariant, EndpointConfigDescription, EndpointConfigSpec,
    EndpointDescription, EndpointStatus, ModelPackageSummary, ModelSpec, VARIANT_NAME,
    VariantSummary,
};
use crate::types::{EndpointConfigName, EndpointName, ModelName};

const PAGE_SIZE: i32 = 100;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_sdk_error<E, R>(err: SdkError<E, R>, resource: &str) -> HostingError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            HostingError::classify(
                service_err.code().unwrap_or("Unknown"),
                service_err.message().unwrap_or_default(),
                resource,
            )
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            HostingError::Transient(DisplayErrorContext(&err).to_string())
        }
        _ => HostingError::Service(DisplayErrorContext(&err).to_string()),
    }
}

pub(crate) fn to_chrono(ts: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

/// SDK getters for members the service model marks required return plain
/// references; optional members return `Option`. This folds both into `Option`.
pub(crate) trait OptionalField<'a> {
    type Target: ?Sized;
    fn optional(self) -> Option<&'a Self::Target>;
}

impl<'a, T: ?Sized> OptionalField<'a> for &'a T {
    type Target = T;
    fn optional(self) -> Option<&'a T> {
        Some(self)
    }
}

impl<'a, T: ?Sized> OptionalField<'a> for Option<&'a T> {
    type Target = T;
    fn optional(self) -> Option<&'a T> {
        self
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

// =============================================================================
// Backend
// =============================================================================

/// Hosting backend over the SageMaker API.
#[derive(Clone)]
pub struct SageMakerBackend {
    client: Client,
}

impl SageMakerBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointOps for SageMakerBackend {
    async fn describe_endpoint(
        &self,
        name: &EndpointName,
    ) -> Result<EndpointDescription, HostingError> {
        tracing::debug!(endpoint = %name, "DescribeEndpoint");
        let out = self
            .client
            .describe_endpoint()
            .endpoint_name(name.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;

        let status = out
            .endpoint_status()
            .optional()
            .map(|s| EndpointStatus::parse(s.as_str()))
            .unwrap_or_else(|| EndpointStatus::Unknown(String::new()));

        let variants = out
            .production_variants()
            .optional()
            .unwrap_or_default()
            .iter()
            .map(|v| VariantSummary {
                name: v.variant_name().optional().unwrap_or_default().to_string(),
                current_instance_count: v.current_instance_count(),
                desired_instance_count: v.desired_instance_count(),
            })
            .collect();

        Ok(EndpointDescription {
            name: owned(out.endpoint_name().optional()).unwrap_or_else(|| name.to_string()),
            status,
            config_name: owned(out.endpoint_config_name().optional()),
            failure_reason: owned(out.failure_reason().optional()),
            created_at: out.creation_time().optional().and_then(to_chrono),
            last_modified_at: out.last_modified_time().optional().and_then(to_chrono),
            variants,
        })
    }

    async fn create_endpoint(
        &self,
        name: &EndpointName,
        config: &EndpointConfigName,
    ) -> Result<(), HostingError> {
        tracing::debug!(endpoint = %name, config = %config, "CreateEndpoint");
        self.client
            .create_endpoint()
            .endpoint_name(name.as_str())
            .endpoint_config_name(config.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;
        Ok(())
    }

    async fn update_endpoint(
        &self,
        name: &EndpointName,
        config: &EndpointConfigName,
    ) -> Result<(), HostingError> {
        tracing::debug!(endpoint = %name, config = %config, "UpdateEndpoint");
        self.client
            .update_endpoint()
            .endpoint_name(name.as_str())
            .endpoint_config_name(config.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;
        Ok(())
    }

    async fn delete_endpoint(&self, name: &EndpointName) -> Result<(), HostingError> {
        tracing::debug!(endpoint = %name, "DeleteEndpoint");
        self.client
            .delete_endpoint()
            .endpoint_name(name.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;
        Ok(())
    }
}

#[async_trait]
impl ProvisioningOps for SageMakerBackend {
    async fn create_model(&self, spec: &ModelSpec) -> Result<(), HostingError> {
        tracing::debug!(model = %spec.name, package = %spec.package, "CreateModel");
        let container = ContainerDefinition::builder()
            .model_package_name(spec.package.to_string())
            .build();
        self.client
            .create_model()
            .model_name(spec.name.as_str())
            .execution_role_arn(spec.execution_role.to_string())
            .primary_container(container)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, spec.name.as_str()))?;
        Ok(())
    }

    async fn delete_model(&self, name: &ModelName) -> Result<(), HostingError> {
        tracing::debug!(model = %name, "DeleteModel");
        self.client
            .delete_model()
            .model_name(name.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;
        Ok(())
    }

    async fn create_endpoint_config(&self, spec: &EndpointConfigSpec) -> Result<(), HostingError> {
        tracing::debug!(
            config = %spec.name,
            model = %spec.model,
            instance_type = %spec.instance_type,
            "CreateEndpointConfig"
        );
        let variant = ProductionVariant::builder()
            .variant_name(VARIANT_NAME)
            .model_name(spec.model.as_str())
            .instance_type(ProductionVariantInstanceType::from(
                spec.instance_type.as_str(),
            ))
            .initial_instance_count(spec.initial_instance_count)
            .initial_variant_weight(1.0)
            .build();

        self.client
            .create_endpoint_config()
            .endpoint_config_name(spec.name.as_str())
            .production_variants(variant)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, spec.name.as_str()))?;
        Ok(())
    }

    async fn describe_endpoint_config(
        &self,
        name: &EndpointConfigName,
    ) -> Result<EndpointConfigDescription, HostingError> {
        tracing::debug!(config = %name, "DescribeEndpointConfig");
        let out = self
            .client
            .describe_endpoint_config()
            .endpoint_config_name(name.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;

        let variants = out
            .production_variants()
            .optional()
            .unwrap_or_default()
            .iter()
            .map(|v| ConfigVariant {
                name: v.variant_name().optional().unwrap_or_default().to_string(),
                model_name: owned(v.model_name().optional()),
                instance_type: v.instance_type().optional().map(|t| t.as_str().to_string()),
                initial_instance_count: v.initial_instance_count(),
            })
            .collect();

        Ok(EndpointConfigDescription {
            name: name.to_string(),
            variants,
        })
    }

    async fn delete_endpoint_config(
        &self,
        name: &EndpointConfigName,
    ) -> Result<(), HostingError> {
        tracing::debug!(config = %name, "DeleteEndpointConfig");
        self.client
            .delete_endpoint_config()
            .endpoint_config_name(name.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, name.as_str()))?;
        Ok(())
    }
}

#[async_trait]
impl RegistryOps for SageMakerBackend {
    async fn list_model_package_groups(&self) -> Result<Vec<String>, HostingError> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let out = self
                .client
                .list_model_package_groups()
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error(e, "model package groups"))?;

            groups.extend(
                out.model_package_group_summary_list()
                    .optional()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|g| owned(g.model_package_group_name().optional())),
            );

            match owned(out.next_token().optional()) {
                Some(token) => next_token = Some(token),
                None => return Ok(groups),
            }
        }
    }

    async fn list_model_packages(
        &self,
        group: &str,
        approval: Option<&ApprovalStatus>,
    ) -> Result<Vec<ModelPackageSummary>, HostingError> {
        tracing::debug!(group, approval = ?approval, "ListModelPackages");
        let mut packages = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let out = self
                .client
                .list_model_packages()
                .model_package_group_name(group)
                .set_model_approval_status(
                    approval.map(|a| ModelApprovalStatus::from(a.as_str())),
                )
                .sort_by(ModelPackageSortBy::CreationTime)
                .sort_order(SortOrder::Descending)
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error(e, group))?;

            packages.extend(
                out.model_package_summary_list()
                    .optional()
                    .unwrap_or_default()
                    .iter()
                    .map(|p| ModelPackageSummary {
                        arn: p.model_package_arn().optional().unwrap_or_default().to_string(),
                        group: owned(p.model_package_group_name().optional()),
                        version: p.model_package_version(),
                        approval: p
                            .model_approval_status()
                            .optional()
                            .map(|s| ApprovalStatus::parse(s.as_str()))
                            .unwrap_or_else(|| ApprovalStatus::Unknown(String::new())),
                        created_at: p.creation_time().optional().and_then(to_chrono),
                        description: owned(p.model_package_description().optional()),
                    }),
            );

            match owned(out.next_token().optional()) {
                Some(token) => next_token = Some(token),
                None => return Ok(packages),
            }
        }
    }
}
