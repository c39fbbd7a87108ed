//! Common test utilities for workflow integration tests.

use workflow_tests::WorkflowTestContext;

/// Start every service against fresh provider and upstream doubles.
pub async fn setup() -> WorkflowTestContext {
    WorkflowTestContext::start()
        .await
        .expect("Failed to start workflow services")
}
