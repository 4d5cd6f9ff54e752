use satlink_frame::Frame;
use tracing::debug;

use crate::alert::Alert;
use crate::rule::{default_rules, Rule};

/// Evaluates an ordered rule table against decoded frames.
///
/// Rules are kept ordered by severity (RED before YELLOW), insertion order
/// within a level, so callers always see the most severe alerts first.
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    rules: Vec<Rule>,
}

impl HealthEvaluator {
    /// Create an evaluator over an explicit rule table.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut rules = rules;
        rules.sort_by_key(Rule::level);
        Self { rules }
    }

    /// Create an evaluator with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule to the table.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        let at = self
            .rules
            .iter()
            .position(|existing| existing.level() > rule.level())
            .unwrap_or(self.rules.len());
        self.rules.insert(at, rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// All alerts the frame triggers, most severe first.
    pub fn evaluate(&self, frame: &Frame) -> Vec<Alert> {
        let alerts: Vec<Alert> = self.rules.iter().filter_map(|rule| rule.check(frame)).collect();
        if !alerts.is_empty() {
            debug!(
                satellite_id = frame.satellite_id,
                timestamp = frame.timestamp,
                count = alerts.len(),
                "health rules triggered"
            );
        }
        alerts
    }
}

impl Default for HealthEvaluator {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
