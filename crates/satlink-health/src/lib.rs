//! Threshold-based health alerts for decoded telemetry.
//!
//! Rules are data: an ordered table of (level, field, predicate, message)
//! entries evaluated uniformly against each housekeeping frame. Adding a
//! threshold means adding a [`Rule`], never touching [`HealthEvaluator`].

pub mod alert;
pub mod evaluator;
pub mod rule;

pub use alert::{Alert, AlertLevel};
pub use evaluator::HealthEvaluator;
pub use rule::{default_rules, Rule, BATTERY_VOLTAGE_MIN_MV, MSI_TEMPERATURE_MAX_C};
