use crate::helpers::{orchestrator_for, unreachable_address};
use claims::assert_err;
use uuid::Uuid;
use workflow_harness::client::{SetupError, TransportErrorKind};
use workflow_harness::configuration::PolicySettings;
use workflow_harness::domain::EmailFactory;
use workflow_harness::scenarios::default_suite;

#[tokio::test]
async fn an_unreachable_target_aborts_the_run_before_any_scenario() {
    // Arrange
    let address = unreachable_address();
    let suite = default_suite(&PolicySettings::mock(), &EmailFactory::fixed());
    // Act
    let outcome = orchestrator_for(&address)
        .run_suite(Uuid::new_v4(), &suite)
        .await;
    // Assert
    let SetupError::Unavailable { base_url, source } = assert_err!(outcome);
    assert_eq!(base_url, address);
    assert_eq!(source.kind(), TransportErrorKind::Connect);
}
