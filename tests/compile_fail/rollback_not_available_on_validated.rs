// ABOUTME: Compile-fail test verifying rollback cannot be called before anything was requested.
// ABOUTME: This test should fail to compile, validating state machine safety.

use sagedeploy::cloud::{EndpointOps, ProvisioningOps};
use sagedeploy::deploy::{Deployment, RollbackController, Validated};

async fn try_invalid_rollback<H: EndpointOps + ProvisioningOps>(
    deployment: Deployment<Validated>,
    controller: &RollbackController<'_, H>,
) {
    // ERROR: rollback() method doesn't exist on Deployment<Validated>
    let _ = deployment.rollback(controller).await;
}

fn main() {}
