use crate::client::TransportErrorKind;
use crate::expectation::Mismatch;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    Mismatches { mismatches: Vec<Mismatch> },
    Network {
        error: TransportErrorKind,
        message: String,
    },
    /// A value the expectation passed on could not be captured.
    Capture { key: String, pointer: String },
    /// A captured value has a type the next request cannot use.
    ContextType {
        key: String,
        expected: String,
        actual: String,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Mismatches { mismatches } => {
                let lines: Vec<String> = mismatches.iter().map(Mismatch::to_string).collect();
                write!(f, "{}", lines.join("; "))
            }
            FailureReason::Network { error, message } => {
                write!(f, "network error ({}): {}", error, message)
            }
            FailureReason::Capture { key, pointer } => {
                write!(f, "could not capture `{}` from `{}`", key, pointer)
            }
            FailureReason::ContextType {
                key,
                expected,
                actual,
            } => write!(f, "context value `{}` is {}, expected {}", key, actual, expected),
        }
    }
}

/// Terminal classification of a scenario.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "verdict", rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail { step: String, reason: FailureReason },
    Blocked { reason: String },
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail { .. } => "FAIL",
            Verdict::Blocked { .. } => "BLOCKED",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot move a scenario from {from} to {to}.")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub to: &'static str,
}

/// `Pending -> Running -> Finished`, no re-entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScenarioState {
    #[default]
    Pending,
    Running,
    Finished(Verdict),
}

impl ScenarioState {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioState::Pending => "PENDING",
            ScenarioState::Running => "RUNNING",
            ScenarioState::Finished(verdict) => verdict.label(),
        }
    }

    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        match self {
            ScenarioState::Pending => {
                *self = ScenarioState::Running;
                Ok(())
            }
            other => Err(InvalidTransition {
                from: other.name(),
                to: "RUNNING",
            }),
        }
    }

    pub fn finish(&mut self, verdict: Verdict) -> Result<(), InvalidTransition> {
        match self {
            ScenarioState::Running => {
                *self = ScenarioState::Finished(verdict);
                Ok(())
            }
            other => Err(InvalidTransition {
                from: other.name(),
                to: verdict.label(),
            }),
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            ScenarioState::Finished(verdict) => Some(verdict),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Blocked,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub group: String,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub scenarios: Vec<ScenarioReport>,
    pub summary: Summary,
}

impl Report {
    pub fn new(run_id: Uuid, target: impl Into<String>) -> Self {
        Self {
            run_id,
            target: target.into(),
            started_at: Utc::now(),
            finished_at: None,
            scenarios: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn record(&mut self, scenario: ScenarioReport) {
        self.summary.total += 1;
        match scenario.verdict {
            Verdict::Pass => self.summary.passed += 1,
            Verdict::Fail { .. } => self.summary.failed += 1,
            Verdict::Blocked { .. } => self.summary.blocked += 1,
        }
        self.scenarios.push(scenario);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn verdict_of(&self, name: &str) -> Option<&Verdict> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.verdict)
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// `1` if any scenario failed, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() { 1 } else { 0 }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![format!("Scenario run {} against {}", self.run_id, self.target)];
        for scenario in &self.scenarios {
            lines.push(format!(
                "{:<8} {} :: {}",
                scenario.verdict.label(),
                scenario.group,
                scenario.name
            ));
            match &scenario.verdict {
                Verdict::Pass => {}
                Verdict::Fail { step, reason } => {
                    lines.push(format!("         step `{}`: {}", step, reason));
                }
                Verdict::Blocked { reason } => {
                    lines.push(format!("         {}", reason));
                }
            }
        }
        lines.push(format!(
            "{} passed, {} failed, {} blocked ({} total)",
            self.summary.passed, self.summary.failed, self.summary.blocked, self.summary.total
        ));
        lines.join("\n")
    }
}
