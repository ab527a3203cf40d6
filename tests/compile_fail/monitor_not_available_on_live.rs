// ABOUTME: Compile-fail test verifying a live deployment cannot be monitored again.
// ABOUTME: This test should fail to compile, validating state machine safety.

use sagedeploy::cloud::{EndpointOps, LogOps};
use sagedeploy::deploy::{DeploymentMonitor, Deployment, Live, NullSink};

async fn try_invalid_monitor<E: EndpointOps, L: LogOps>(
    deployment: Deployment<Live>,
    monitor: &DeploymentMonitor<'_, E, L>,
) {
    // ERROR: monitor() method doesn't exist on Deployment<Live>
    let _ = deployment.monitor(monitor, &NullSink).await;
}

fn main() {}
