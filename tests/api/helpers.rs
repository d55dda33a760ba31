use crate::mock_api::{MockApi, MockFlavor};
use std::net::TcpListener;
use std::sync::LazyLock;
use std::time::Duration;
use uuid::Uuid;
use workflow_harness::client::ApiClient;
use workflow_harness::configuration::PolicySettings;
use workflow_harness::domain::EmailFactory;
use workflow_harness::report::Report;
use workflow_harness::scenarios::default_suite;
use workflow_harness::telemetry::{get_subscriber, init_subscriber};
use workflow_harness::workflow::{Orchestrator, Scenario};

// Ensure that the `tracing` stack is only initialised once using `LazyLock`
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // The sink is part of the subscriber type, hence one branch per sink.
    if let Ok(directory) = std::env::var("TEST_LOG_DIR") {
        let file_appender = tracing_appender::rolling::never(directory, "api-tests.log");
        let subscriber = get_subscriber(subscriber_name, default_filter_level, file_appender);
        init_subscriber(subscriber);
    } else if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestHarness {
    pub mock_api: MockApi,
    pub orchestrator: Orchestrator,
}

impl TestHarness {
    pub async fn run(&self, scenarios: &[Scenario]) -> Report {
        self.orchestrator
            .run_suite(Uuid::new_v4(), scenarios)
            .await
            .expect("The mock API should be reachable.")
    }

    pub async fn run_default_suite(&self, policy: &PolicySettings) -> Report {
        self.run(&default_suite(policy, &EmailFactory::fixed())).await
    }
}

pub async fn spawn_harness(flavor: MockFlavor) -> TestHarness {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    LazyLock::force(&TRACING);

    let mock_api = MockApi::start(flavor).await;
    let orchestrator = orchestrator_for(&mock_api.address());
    TestHarness {
        mock_api,
        orchestrator,
    }
}

pub fn orchestrator_for(base_url: &str) -> Orchestrator {
    let client = ApiClient::new(base_url.to_string(), Duration::from_secs(5))
        .expect("Failed to build the API client.");
    Orchestrator::new(client)
}

/// An address nothing listens on.
pub fn unreachable_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a random port.");
    let port = listener
        .local_addr()
        .expect("Failed to read the local address.")
        .port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Names of the scenarios that did not pass, for readable assertion messages.
pub fn not_passed(report: &Report) -> Vec<String> {
    report
        .scenarios
        .iter()
        .filter(|s| !s.verdict.is_pass())
        .map(|s| format!("{} [{}]", s.name, s.verdict.label()))
        .collect()
}
