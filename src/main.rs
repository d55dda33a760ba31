use anyhow::Context;
use uuid::Uuid;
use workflow_harness::configuration::{ReportFormat, get_configuration};
use workflow_harness::domain::EmailFactory;
use workflow_harness::scenarios::default_suite;
use workflow_harness::telemetry::{get_subscriber, init_subscriber};
use workflow_harness::workflow::Orchestrator;

/// Exit status when the target could not be reached at all.
const SETUP_FAILURE: i32 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so that stdout only carries the report.
    let subscriber = get_subscriber(
        "workflow_harness".into(),
        "info".into(),
        std::io::stderr,
    );
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let run_id = Uuid::new_v4();
    let emails = if configuration.policy.unique_emails {
        EmailFactory::tagged(run_id)
    } else {
        EmailFactory::fixed()
    };
    let suite = default_suite(&configuration.policy, &emails);
    let client = configuration
        .target
        .client()
        .context("Failed to build the HTTP client.")?;
    let orchestrator = Orchestrator::new(client);

    let report = match orchestrator.run_suite(run_id, &suite).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, error.message = %e, "Scenario suite aborted");
            std::process::exit(SETUP_FAILURE);
        }
    };

    match configuration.report.format {
        ReportFormat::Text => println!("{}", report.render_text()),
        ReportFormat::Json => println!(
            "{}",
            report.to_json().context("Failed to serialize the report.")?
        ),
    }

    if report.has_failures() {
        std::process::exit(report.exit_code());
    }
    Ok(())
}
