// ABOUTME: Type-safe resource names and validated domain types.
// ABOUTME: Uses phantom types to prevent resource name confusion at compile time.

mod arn;
mod endpoint_name;
mod id;
mod instance_type;

pub use arn::{ModelPackageArn, ParseArnError, RoleArn};
pub use endpoint_name::{EndpointName, EndpointNameError, MAX_NAME_LEN, NAME_TIMESTAMP_FORMAT};
pub use id::{EndpointConfigName, ModelName};
pub use instance_type::{
    DEFAULT_INSTANCE_TYPE, InstanceType, InstanceTypeError, RECOMMENDED_INSTANCE_TYPES,
};
