use serde::Serialize;

/// Severity of a triggered health condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Red,
    Yellow,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Red => "RED",
            AlertLevel::Yellow => "YELLOW",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triggered health condition for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    /// Name of the offending measurement.
    pub field: String,
    /// Measured value that tripped the rule.
    pub value: i64,
    pub message: String,
    pub satellite_id: u16,
    pub timestamp: u32,
    /// Same as `timestamp`; part of the store's dedup key.
    pub packet_timestamp: u32,
}

impl Alert {
    /// `(satellite_id, field, packet_timestamp)`: at most one stored alert per key.
    pub fn dedup_key(&self) -> (u16, &str, u32) {
        (self.satellite_id, self.field.as_str(), self.packet_timestamp)
    }
}
