use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use satlink_frame::Frame;
use satlink_health::Alert;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::store::{TelemetryId, TelemetryStore};

/// Frames (and alerts) kept before the oldest are evicted.
pub const DEFAULT_RETENTION: usize = 10_000;

/// A frame as persisted by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredTelemetry {
    pub id: TelemetryId,
    #[serde(flatten)]
    pub frame: Frame,
}

type AlertKey = (u16, String, u32);

#[derive(Debug, Default)]
struct Inner {
    next_id: TelemetryId,
    telemetry: VecDeque<StoredTelemetry>,
    alerts: VecDeque<Alert>,
    alert_keys: HashSet<AlertKey>,
}

/// In-process persistence collaborator with bounded retention.
///
/// Alert deduplication covers the alerts currently retained.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    retention: usize,
}

impl MemoryStore {
    /// Create a store with [`DEFAULT_RETENTION`].
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a store keeping at most `retention` frames and `retention` alerts.
    pub fn with_retention(retention: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            retention: retention.max(1),
        }
    }

    pub fn telemetry_count(&self) -> usize {
        self.lock().telemetry.len()
    }

    /// Retained frames, oldest first.
    pub fn telemetry(&self) -> Vec<StoredTelemetry> {
        self.lock().telemetry.iter().cloned().collect()
    }

    /// Most recently stored frame for a satellite.
    pub fn latest_telemetry(&self, satellite_id: u16) -> Option<StoredTelemetry> {
        self.lock()
            .telemetry
            .iter()
            .rev()
            .find(|stored| stored.frame.satellite_id == satellite_id)
            .cloned()
    }

    /// Retained alerts, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts.iter().cloned().collect()
    }

    /// Retained alerts for one satellite, oldest first.
    pub fn alerts_for(&self, satellite_id: u16) -> Vec<Alert> {
        self.lock()
            .alerts
            .iter()
            .filter(|alert| alert.satellite_id == satellite_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every mutation leaves `Inner` consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore for MemoryStore {
    fn store_telemetry(&self, frame: &Frame) -> Result<TelemetryId> {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        if inner.telemetry.len() >= self.retention {
            inner.telemetry.pop_front();
        }
        inner.telemetry.push_back(StoredTelemetry {
            id,
            frame: frame.clone(),
        });
        Ok(id)
    }

    fn store_alert(&self, alert: &Alert) -> Result<bool> {
        let mut inner = self.lock();
        let key = (
            alert.satellite_id,
            alert.field.clone(),
            alert.packet_timestamp,
        );
        if inner.alert_keys.contains(&key) {
            debug!(
                satellite_id = alert.satellite_id,
                field = %alert.field,
                packet_timestamp = alert.packet_timestamp,
                "duplicate alert ignored"
            );
            return Ok(false);
        }

        if inner.alerts.len() >= self.retention {
            if let Some(evicted) = inner.alerts.pop_front() {
                inner.alert_keys.remove(&(
                    evicted.satellite_id,
                    evicted.field,
                    evicted.packet_timestamp,
                ));
            }
        }
        inner.alert_keys.insert(key);
        inner.alerts.push_back(alert.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use satlink_frame::{decode, encode_housekeeping, to_hex, HousekeepingReadings};
    use satlink_health::HealthEvaluator;

    use super::*;

    fn frame(satellite_id: u16, timestamp: u32, msi_temperature_c: u8) -> Frame {
        let readings = HousekeepingReadings {
            battery_voltage_mv: 13_000,
            battery_temp_c: 20,
            msi_temperature_c,
            ssr_used_mb: 64,
        };
        decode(&to_hex(&encode_housekeeping(
            satellite_id,
            timestamp,
            &readings,
        )))
        .unwrap()
    }

    fn red_alert(satellite_id: u16, timestamp: u32) -> Alert {
        HealthEvaluator::default()
            .evaluate(&frame(satellite_id, timestamp, 45))
            .remove(0)
    }

    #[test]
    fn assigns_increasing_ids() {
        let store = MemoryStore::new();
        assert_eq!(store.store_telemetry(&frame(1, 10, 20)).unwrap(), 1);
        assert_eq!(store.store_telemetry(&frame(1, 11, 20)).unwrap(), 2);
        assert_eq!(store.telemetry_count(), 2);
    }

    #[test]
    fn latest_telemetry_per_satellite() {
        let store = MemoryStore::new();
        store.store_telemetry(&frame(1, 10, 20)).unwrap();
        store.store_telemetry(&frame(2, 11, 20)).unwrap();
        store.store_telemetry(&frame(1, 12, 20)).unwrap();

        let latest = store.latest_telemetry(1).expect("satellite 1 has frames");
        assert_eq!(latest.frame.timestamp, 12);
        assert_eq!(latest.id, 3);
        assert!(store.latest_telemetry(3).is_none());
    }

    #[test]
    fn duplicate_alert_is_not_restored() {
        let store = MemoryStore::new();
        assert!(store.store_alert(&red_alert(1, 100)).unwrap());
        assert!(!store.store_alert(&red_alert(1, 100)).unwrap());
        assert!(store.store_alert(&red_alert(1, 101)).unwrap());
        assert!(store.store_alert(&red_alert(2, 100)).unwrap());

        assert_eq!(store.alerts().len(), 3);
        assert_eq!(store.alerts_for(1).len(), 2);
    }

    #[test]
    fn retention_evicts_oldest() {
        let store = MemoryStore::with_retention(2);
        for ts in 1..=3 {
            store.store_telemetry(&frame(1, ts, 20)).unwrap();
            store.store_alert(&red_alert(1, ts)).unwrap();
        }

        let timestamps: Vec<_> = store.telemetry().iter().map(|s| s.frame.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3]);
        let alert_times: Vec<_> = store.alerts().iter().map(|a| a.packet_timestamp).collect();
        assert_eq!(alert_times, vec![2, 3]);

        // The evicted alert's key no longer blocks a re-store.
        assert!(store.store_alert(&red_alert(1, 1)).unwrap());
    }
}
