use std::sync::Arc;

use satlink_frame::Frame;
use satlink_health::Alert;

use crate::error::Result;

/// Identifier the store assigns to a persisted frame.
pub type TelemetryId = u64;

/// Persistence collaborator for decoded frames and their alerts.
///
/// Implementations own their own concurrency control; the service calls
/// them from its single listener thread.
pub trait TelemetryStore: Send + Sync {
    /// Persist a housekeeping frame.
    fn store_telemetry(&self, frame: &Frame) -> Result<TelemetryId>;

    /// Persist an alert unless one with the same
    /// `(satellite_id, field, packet_timestamp)` is already stored.
    ///
    /// Returns `Ok(false)` for a duplicate. That is not an error.
    fn store_alert(&self, alert: &Alert) -> Result<bool>;
}

impl<S: TelemetryStore + ?Sized> TelemetryStore for Arc<S> {
    fn store_telemetry(&self, frame: &Frame) -> Result<TelemetryId> {
        (**self).store_telemetry(frame)
    }

    fn store_alert(&self, alert: &Alert) -> Result<bool> {
        (**self).store_alert(alert)
    }
}
