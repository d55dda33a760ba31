use crate::helpers::spawn_harness;
use crate::mock_api::MockFlavor;
use serde_json::json;
use workflow_harness::client::{ApiRequest, Authorization};
use workflow_harness::configuration::PolicySettings;
use workflow_harness::domain::{EmailFactory, NewUser};
use workflow_harness::endpoints::{LOGIN_PATH, PRODUCTS_PATH, REGISTER_PATH, SUBSCRIPTIONS_PATH};
use workflow_harness::expectation::{BodyCheck, Expectation, StatusExpectation};
use workflow_harness::report::{StepStatus, Verdict};
use workflow_harness::scenarios::default_suite;
use workflow_harness::workflow::{Capture, Context, Scenario, Step, TOKEN_KEY};

fn user() -> NewUser {
    NewUser::new("e@x.com", "Pw123!", "N", "C")
}

fn register() -> Step {
    Step::fixed(
        "register",
        ApiRequest::post(REGISTER_PATH, user().registration_body()),
        Expectation::status(StatusExpectation::Exactly(201)),
    )
}

fn log_in(password: &str) -> Step {
    Step::fixed(
        "log in",
        ApiRequest::post(
            LOGIN_PATH,
            json!({ "email": user().email, "password": password }),
        ),
        Expectation::status(StatusExpectation::OneOf(vec![200, 201]))
            .check(BodyCheck::is_string("/access_token")),
    )
    .capture(Capture::secret(TOKEN_KEY, "/access_token"))
}

fn subscribe() -> Step {
    Step::new(
        "subscribe",
        |context: &Context| {
            let plan_id = context.require_str("plan_id")?;
            Ok(ApiRequest::post(
                SUBSCRIPTIONS_PATH,
                json!({
                    "planId": plan_id,
                    "paymentMethodId": "pm_card_visa",
                    "billingDetails": { "name": "N", "email": "e@x.com" }
                }),
            )
            .with_authorization(Authorization::Bearer(context.token()?)))
        },
        Expectation::status(StatusExpectation::Exactly(201))
            .check(BodyCheck::equals("/status", "active"))
            .check(BodyCheck::equals_context("/planId", "plan_id")),
    )
}

#[tokio::test]
async fn captured_values_flow_into_dependent_scenarios() {
    // Arrange
    let harness = spawn_harness(MockFlavor::lenient()).await;
    let scenarios = vec![
        Scenario::new("workflow", "logs in")
            .step(register())
            .step(log_in("Pw123!")),
        Scenario::new("workflow", "picks a plan").step(
            Step::fixed(
                "list products",
                ApiRequest::get(PRODUCTS_PATH),
                Expectation::status(StatusExpectation::Any),
            )
            .capture(Capture::value("plan_id", "/products/0/id")),
        ),
        Scenario::new("workflow", "subscribes")
            .depends_on("logs in")
            .depends_on("picks a plan")
            .step(subscribe()),
    ];
    // Act
    let report = harness.run(&scenarios).await;
    // Assert
    assert_eq!(report.summary.passed, 3);
    assert_eq!(harness.mock_api.subscription_count(), 1);
}

#[tokio::test]
async fn a_failed_prerequisite_blocks_its_dependents_transitively() {
    // Arrange
    let harness = spawn_harness(MockFlavor::lenient()).await;
    let scenarios = vec![
        Scenario::new("workflow", "logs in")
            .step(register())
            .step(log_in("WrongPassword")),
        Scenario::new("workflow", "subscribes")
            .depends_on("logs in")
            .step(subscribe()),
        Scenario::new("workflow", "subscribes again")
            .depends_on("subscribes")
            .step(subscribe()),
    ];
    // Act
    let report = harness.run(&scenarios).await;
    // Assert
    assert_eq!(report.scenarios[0].verdict.label(), "FAIL");
    for dependent in &report.scenarios[1..] {
        let Verdict::Blocked { reason } = &dependent.verdict else {
            panic!("`{}` should be blocked", dependent.name);
        };
        assert!(reason.contains("ended in"), "{}", reason);
        assert!(dependent.steps.iter().all(|s| s.status == StepStatus::Skipped));
    }
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.blocked, 2);
    assert_eq!(harness.mock_api.subscription_count(), 0);
}

#[tokio::test]
async fn a_step_without_its_context_value_blocks_the_scenario() {
    let harness = spawn_harness(MockFlavor::lenient()).await;
    let scenarios = vec![Scenario::new("workflow", "subscribes").step(subscribe())];

    let report = harness.run(&scenarios).await;

    assert_eq!(report.scenarios[0].verdict.label(), "BLOCKED");
    assert_eq!(report.scenarios[0].steps[0].status, StepStatus::Blocked);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn registration_without_password_stores_no_user() {
    let harness = spawn_harness(MockFlavor::lenient()).await;
    let suite: Vec<Scenario> = default_suite(&PolicySettings::mock(), &EmailFactory::fixed())
        .into_iter()
        .filter(|s| s.name == "rejects a registration without password")
        .collect();

    let report = harness.run(&suite).await;

    assert!(report.scenarios[0].verdict.is_pass());
    assert_eq!(harness.mock_api.user_count(), 0);
}

#[tokio::test]
async fn the_json_report_lists_every_step() {
    // Arrange
    let harness = spawn_harness(MockFlavor::lenient()).await;
    let scenarios = vec![
        Scenario::new("workflow", "logs in")
            .step(register())
            .step(log_in("WrongPassword")),
    ];
    // Act
    let report = harness.run(&scenarios).await;
    let json: serde_json::Value =
        serde_json::from_str(&report.to_json().unwrap()).unwrap();
    // Assert
    let scenario = &json["scenarios"][0];
    assert_eq!(scenario["verdict"], "FAIL");
    assert_eq!(scenario["step"], "log in");
    assert_eq!(scenario["steps"][0]["status"], "passed");
    assert_eq!(scenario["steps"][1]["status"], "failed");
    assert_eq!(scenario["steps"][1]["response_status"], 400);
    assert_eq!(json["target"], harness.mock_api.address());
}
