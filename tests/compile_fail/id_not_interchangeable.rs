// ABOUTME: Compile-fail test verifying ModelName and EndpointConfigName are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use sagedeploy::types::{EndpointConfigName, ModelName};

fn takes_config_name(_name: EndpointConfigName) {}

fn main() {
    let model = ModelName::new("fraud-model").unwrap();
    takes_config_name(model); // ERROR: expected Id<EndpointConfigMarker>, found Id<ModelMarker>
}
