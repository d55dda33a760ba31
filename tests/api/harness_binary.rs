use crate::helpers::{spawn_harness, unreachable_address};
use crate::mock_api::MockFlavor;
use std::process::{Command, Output};

/// Run the harness binary against `base_url` with the local configuration.
async fn run_harness(base_url: String, report_format: &'static str) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_workflow_harness"))
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .env("APP_ENVIRONMENT", "local")
            .env("APP_TARGET__BASE_URL", base_url)
            .env("APP_REPORT__FORMAT", report_format)
            .output()
            .expect("Failed to run the harness binary.")
    })
    .await
    .expect("The harness binary task panicked.")
}

#[tokio::test(flavor = "multi_thread")]
async fn the_binary_prints_a_passing_text_report_and_exits_with_zero() {
    // Arrange
    let harness = spawn_harness(MockFlavor::lenient()).await;
    // Act
    let output = run_harness(harness.mock_api.address(), "text").await;
    // Assert
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "{}", stdout);
    assert!(stdout.contains("PASS     authentication :: registers a user with valid data"));
    assert!(stdout.contains("0 failed, 0 blocked"));
}

#[tokio::test(flavor = "multi_thread")]
async fn the_binary_exits_with_one_when_a_scenario_fails() {
    // Arrange
    let flavor = MockFlavor {
        validates_plans: false,
        ..MockFlavor::lenient()
    };
    let harness = spawn_harness(flavor).await;
    // Act
    let output = run_harness(harness.mock_api.address(), "json").await;
    // Assert
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should only carry the report");
    assert_eq!(report["summary"]["failed"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn the_binary_exits_with_two_when_the_target_is_down() {
    let output = run_harness(unreachable_address(), "text").await;

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}
