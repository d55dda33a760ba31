use super::context::{Context, ContextError};
use super::scenario::Scenario;
use super::step::Step;
use crate::client::{ApiClient, SetupError};
use crate::report::{
    FailureReason, Report, ScenarioReport, ScenarioState, StepRecord, StepStatus, Verdict,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::Span;
use uuid::Uuid;

pub enum StepOutcome {
    Passed {
        status: u16,
    },
    Failed {
        status: Option<u16>,
        reason: FailureReason,
    },
    /// A context value the request needs was never captured. Nothing was sent.
    Blocked(ContextError),
}

pub struct ScenarioRun {
    pub verdict: Verdict,
    pub steps: Vec<StepRecord>,
    /// Values captured by the steps, handed to dependent scenarios.
    pub context: Context,
}

/// Drives the steps of each scenario one at a time, in declaration order.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: ApiClient,
}

impl Orchestrator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[tracing::instrument(
        name = "Executing step",
        skip_all,
        fields(step = %step.name, status = tracing::field::Empty)
    )]
    pub async fn execute(&self, step: &Step, context: &mut Context) -> StepOutcome {
        let request = match step.build_request(context) {
            Ok(request) => request,
            Err(ContextError::WrongType {
                key,
                expected,
                actual,
            }) => {
                tracing::warn!(%key, "Step cannot use a captured context value");
                return StepOutcome::Failed {
                    status: None,
                    reason: FailureReason::ContextType {
                        key,
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    },
                };
            }
            Err(missing) => {
                tracing::warn!(key = %missing.key(), "Step blocked on a missing context value");
                return StepOutcome::Blocked(missing);
            }
        };

        let response = match self.client.request(&request).await {
            Ok(response) => response,
            Err(e) => {
                return StepOutcome::Failed {
                    status: None,
                    reason: FailureReason::Network {
                        error: e.kind(),
                        message: e.to_string(),
                    },
                };
            }
        };
        Span::current().record("status", response.status);

        if let Err(mismatches) = step.expectation.evaluate(&response, context) {
            tracing::info!(mismatches = mismatches.len(), "Response diverges from expectation");
            return StepOutcome::Failed {
                status: Some(response.status),
                reason: FailureReason::Mismatches { mismatches },
            };
        }

        for capture in &step.captures {
            if !capture.apply(&response.body, context) {
                return StepOutcome::Failed {
                    status: Some(response.status),
                    reason: FailureReason::Capture {
                        key: capture.key().to_string(),
                        pointer: capture.pointer().to_string(),
                    },
                };
            }
        }

        StepOutcome::Passed {
            status: response.status,
        }
    }

    /// Steps after the first failing or blocked one are recorded as skipped.
    #[tracing::instrument(
        name = "Running scenario",
        skip_all,
        fields(
            scenario = %scenario.name,
            group = %scenario.group,
            verdict = tracing::field::Empty
        )
    )]
    pub async fn run_scenario(&self, scenario: &Scenario, mut context: Context) -> ScenarioRun {
        let mut records = Vec::with_capacity(scenario.steps.len());
        let mut verdict = Verdict::Pass;
        let mut steps = scenario.steps.iter();

        for step in steps.by_ref() {
            let started = Instant::now();
            let outcome = self.execute(step, &mut context).await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let record = |status, response_status| StepRecord {
                name: step.name.clone(),
                status,
                response_status,
                elapsed_ms,
            };
            match outcome {
                StepOutcome::Passed { status } => {
                    records.push(record(StepStatus::Passed, Some(status)));
                }
                StepOutcome::Failed { status, reason } => {
                    records.push(record(StepStatus::Failed, status));
                    verdict = Verdict::Fail {
                        step: step.name.clone(),
                        reason,
                    };
                    break;
                }
                StepOutcome::Blocked(missing) => {
                    records.push(record(StepStatus::Blocked, None));
                    verdict = Verdict::Blocked {
                        reason: format!("step `{}`: {}", step.name, missing),
                    };
                    break;
                }
            }
        }
        records.extend(steps.map(skipped));

        Span::current().record("verdict", verdict.label());
        tracing::info!("Scenario finished with {}", verdict.label());
        ScenarioRun {
            verdict,
            steps: records,
            context,
        }
    }

    /// Probe the target, then run every scenario.
    ///
    /// Only an unreachable target is an error; every other problem ends up as a verdict.
    #[tracing::instrument(
        name = "Running scenario suite",
        skip_all,
        fields(run_id = %run_id, scenarios = scenarios.len())
    )]
    pub async fn run_suite(
        &self,
        run_id: Uuid,
        scenarios: &[Scenario],
    ) -> Result<Report, SetupError> {
        self.client.probe().await?;

        let mut report = Report::new(run_id, self.client.base_url());
        let mut states: HashMap<&str, ScenarioState> = scenarios
            .iter()
            .map(|scenario| (scenario.name.as_str(), ScenarioState::default()))
            .collect();
        let mut exports: HashMap<&str, Context> = HashMap::new();

        for scenario in scenarios {
            let name = scenario.name.as_str();
            let started = states.get_mut(name).map(ScenarioState::start);

            let run = match &started {
                Some(Ok(())) => match seed_context(scenario, &states, &exports) {
                    Ok(context) => self.run_scenario(scenario, context).await,
                    Err(reason) => not_run(scenario, reason),
                },
                // A second scenario under an already used name.
                Some(Err(e)) => not_run(scenario, format!("duplicate scenario name: {}", e)),
                None => not_run(scenario, format!("scenario `{}` is not declared", name)),
            };

            // Only the run that moved the state to its terminal verdict exports values.
            if let Some(Ok(())) = started {
                let finished = states
                    .get_mut(name)
                    .map(|state| state.finish(run.verdict.clone()));
                if let Some(Ok(())) = finished {
                    exports.insert(name, run.context);
                }
            }
            report.record(ScenarioReport {
                name: scenario.name.clone(),
                group: scenario.group.clone(),
                verdict: run.verdict,
                steps: run.steps,
            });
        }

        report.finish();
        tracing::info!(
            passed = report.summary.passed,
            failed = report.summary.failed,
            blocked = report.summary.blocked,
            "Scenario suite finished"
        );
        Ok(report)
    }
}

fn skipped(step: &Step) -> StepRecord {
    StepRecord {
        name: step.name.clone(),
        status: StepStatus::Skipped,
        response_status: None,
        elapsed_ms: 0,
    }
}

fn not_run(scenario: &Scenario, reason: String) -> ScenarioRun {
    tracing::warn!(scenario = %scenario.name, %reason, "Scenario blocked");
    ScenarioRun {
        verdict: Verdict::Blocked { reason },
        steps: scenario.steps.iter().map(skipped).collect(),
        context: Context::new(),
    }
}

/// Merge the contexts of the prerequisites, or explain why the scenario cannot run.
fn seed_context(
    scenario: &Scenario,
    states: &HashMap<&str, ScenarioState>,
    exports: &HashMap<&str, Context>,
) -> Result<Context, String> {
    let mut context = Context::new();
    for dependency in &scenario.depends_on {
        let state = states.get(dependency.as_str());
        match state.and_then(ScenarioState::verdict) {
            Some(Verdict::Pass) => {
                if let Some(exported) = exports.get(dependency.as_str()) {
                    context.extend(exported);
                }
            }
            Some(verdict) => {
                return Err(format!(
                    "prerequisite `{}` ended in {}",
                    dependency,
                    verdict.label()
                ));
            }
            None => {
                return Err(format!(
                    "prerequisite `{}` has not run ({})",
                    dependency,
                    state.map_or("UNKNOWN", ScenarioState::name)
                ));
            }
        }
    }
    Ok(context)
}
