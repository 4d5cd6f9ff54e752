use std::fmt;
use std::sync::Arc;

use satlink_frame::Frame;

use crate::alert::{Alert, AlertLevel};

/// MSI temperature above this raises RED.
pub const MSI_TEMPERATURE_MAX_C: i64 = 40;

/// Battery voltage below this raises YELLOW.
pub const BATTERY_VOLTAGE_MIN_MV: i64 = 12_000;

type Predicate = Arc<dyn Fn(i64) -> bool + Send + Sync>;
type MessageBuilder = Arc<dyn Fn(i64) -> String + Send + Sync>;

/// One entry of the health rule table.
#[derive(Clone)]
pub struct Rule {
    level: AlertLevel,
    field: String,
    predicate: Predicate,
    message: MessageBuilder,
}

impl Rule {
    /// Create a rule from a predicate and a message builder over the field value.
    pub fn new(
        level: AlertLevel,
        field: impl Into<String>,
        predicate: impl Fn(i64) -> bool + Send + Sync + 'static,
        message: impl Fn(i64) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            level,
            field: field.into(),
            predicate: Arc::new(predicate),
            message: Arc::new(message),
        }
    }

    /// Fires when the value is strictly greater than `limit`.
    pub fn above(level: AlertLevel, field: impl Into<String>, limit: i64) -> Self {
        let field = field.into();
        let name = field.clone();
        Self::new(
            level,
            field,
            move |v| v > limit,
            move |v| format!("{name} is {v}, above the {limit} threshold"),
        )
    }

    /// Fires when the value is strictly less than `limit`.
    pub fn below(level: AlertLevel, field: impl Into<String>, limit: i64) -> Self {
        let field = field.into();
        let name = field.clone();
        Self::new(
            level,
            field,
            move |v| v < limit,
            move |v| format!("{name} is {v}, below the {limit} threshold"),
        )
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Evaluate against one frame.
    ///
    /// A frame that does not carry the field never fires.
    pub fn check(&self, frame: &Frame) -> Option<Alert> {
        let value = frame.measurement(&self.field)?;
        if !(self.predicate)(value) {
            return None;
        }

        Some(Alert {
            level: self.level,
            field: self.field.clone(),
            value,
            message: (self.message)(value),
            satellite_id: frame.satellite_id,
            timestamp: frame.timestamp,
            packet_timestamp: frame.timestamp,
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("level", &self.level)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// The operational thresholds every ground station monitors.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            AlertLevel::Red,
            "msi_temperature_c",
            |v| v > MSI_TEMPERATURE_MAX_C,
            |v| format!("MSI Temperature critical: {v}°C exceeds the 40°C threshold"),
        ),
        Rule::new(
            AlertLevel::Yellow,
            "battery_voltage_mv",
            |v| v < BATTERY_VOLTAGE_MIN_MV,
            |v| format!("Battery voltage low: {v} mV is below the 12 000 mV threshold"),
        ),
    ]
}
