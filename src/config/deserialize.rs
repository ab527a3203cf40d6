// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates role ARNs and instance types while the file is parsed.

use serde::Deserialize;

use crate::types::{InstanceType, RoleArn};

pub fn deserialize_role_arn<'de, D>(deserializer: D) -> Result<Option<RoleArn>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| RoleArn::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_instance_type<'de, D>(deserializer: D) -> Result<Option<InstanceType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| InstanceType::new(&s).map_err(serde::de::Error::custom))
        .transpose()
}
