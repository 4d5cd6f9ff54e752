use std::any::Any;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use satlink_frame::{decode, Frame, FrameError, FrameKind};
use satlink_health::{Alert, HealthEvaluator};
use tracing::{debug, error, info, warn};

use crate::observer::FrameObserver;
use crate::stats::{IngestStats, StatsCounters};
use crate::store::TelemetryStore;

/// What happened to one datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The datagram did not decode. Nothing was stored or observed.
    Rejected(FrameError),
    /// A frame decoded and was dispatched.
    Accepted { kind: FrameKind, alerts: usize },
}

/// Per-datagram pipeline: text decode, frame decode, store, evaluate, observe.
///
/// Synchronous and socket-free; the service runs it on its listener thread.
#[derive(Clone)]
pub struct DatagramProcessor {
    store: Arc<dyn TelemetryStore>,
    evaluator: HealthEvaluator,
    observer: Option<Arc<dyn FrameObserver>>,
    stats: Arc<StatsCounters>,
}

impl DatagramProcessor {
    /// Create a processor with the default health rules and no observer.
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self {
            store,
            evaluator: HealthEvaluator::default(),
            observer: None,
            stats: Arc::new(StatsCounters::default()),
        }
    }

    /// Override the health rule table.
    pub fn with_evaluator(mut self, evaluator: HealthEvaluator) -> Self {
        self.set_evaluator(evaluator);
        self
    }

    /// Attach an observer notified after every decoded frame.
    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_evaluator(&mut self, evaluator: HealthEvaluator) {
        self.evaluator = evaluator;
    }

    pub fn set_observer(&mut self, observer: Arc<dyn FrameObserver>) {
        self.observer = Some(observer);
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> IngestStats {
        self.stats.snapshot()
    }

    /// Handle one received datagram.
    pub fn process(&self, datagram: &[u8], from: Option<SocketAddr>) -> Outcome {
        self.stats.received();

        let text = datagram_text(datagram);
        let frame = match decode(text.trim()) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.rejected();
                warn!(peer = ?from, kind = err.kind(), error = %err, "dropping malformed datagram");
                return Outcome::Rejected(err);
            }
        };
        self.stats.decoded();

        let alerts = match frame.kind() {
            FrameKind::Housekeeping => self.handle_housekeeping(&frame),
            FrameKind::PayloadData => {
                info!(
                    satellite_id = frame.satellite_id,
                    timestamp = frame.timestamp,
                    payload_length = frame.measurement("payload_length").unwrap_or_default(),
                    "payload data frame"
                );
                Vec::new()
            }
        };

        self.notify(&frame, &alerts);

        Outcome::Accepted {
            kind: frame.kind(),
            alerts: alerts.len(),
        }
    }

    fn handle_housekeeping(&self, frame: &Frame) -> Vec<Alert> {
        match self.store.store_telemetry(frame) {
            Ok(id) => debug!(id, satellite_id = frame.satellite_id, "stored telemetry"),
            Err(err) => {
                self.stats.store_failure();
                error!(satellite_id = frame.satellite_id, error = %err, "failed to store telemetry");
            }
        }

        let alerts = self.evaluator.evaluate(frame);
        for alert in &alerts {
            match self.store.store_alert(alert) {
                Ok(true) => {
                    self.stats.alert_raised();
                    warn!(
                        level = %alert.level,
                        satellite_id = alert.satellite_id,
                        field = %alert.field,
                        value = alert.value,
                        "[{} ALERT] {}",
                        alert.level,
                        alert.message
                    );
                }
                Ok(false) => {
                    self.stats.alert_suppressed();
                    debug!(
                        satellite_id = alert.satellite_id,
                        field = %alert.field,
                        packet_timestamp = alert.packet_timestamp,
                        "alert already recorded"
                    );
                }
                Err(err) => {
                    self.stats.store_failure();
                    error!(satellite_id = alert.satellite_id, error = %err, "failed to store alert");
                }
            }
        }

        if let Some(readings) = frame.housekeeping() {
            info!(
                satellite_id = frame.satellite_id,
                timestamp = frame.timestamp,
                battery_voltage_mv = readings.battery_voltage_mv,
                msi_temperature_c = readings.msi_temperature_c,
                "housekeeping frame"
            );
        }

        alerts
    }

    fn notify(&self, frame: &Frame, alerts: &[Alert]) {
        let Some(observer) = &self.observer else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| observer.observe(frame, alerts))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.stats.observer_failure();
                error!(satellite_id = frame.satellite_id, error = %err, "frame observer failed");
            }
            Err(payload) => {
                self.stats.observer_failure();
                error!(
                    satellite_id = frame.satellite_id,
                    panic = panic_message(payload.as_ref()),
                    "frame observer panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for DatagramProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramProcessor")
            .field("evaluator", &self.evaluator)
            .field("observer", &self.observer.is_some())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// UTF-8 text of a datagram with invalid byte sequences dropped, not replaced.
pub(crate) fn datagram_text(datagram: &[u8]) -> String {
    datagram.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
