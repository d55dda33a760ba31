use super::step::Step;

/// A named sequence of steps, the unit of pass/fail reporting.
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub group: String,
    /// Scenarios that must PASS first; their captured values seed this scenario's context.
    pub depends_on: Vec<String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(group: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            depends_on: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn depends_on(mut self, scenario: &str) -> Self {
        self.depends_on.push(scenario.to_string());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}
