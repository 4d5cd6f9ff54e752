use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Datagrams handed to the decoder.
    pub received: u64,
    /// Datagrams that decoded into a frame.
    pub decoded: u64,
    /// Datagrams dropped as malformed.
    pub rejected: u64,
    /// Alerts the store accepted.
    pub alerts_raised: u64,
    /// Alerts the store judged duplicates.
    pub alerts_suppressed: u64,
    /// Store calls that returned an error.
    pub store_failures: u64,
    /// Observer calls that returned an error or panicked.
    pub observer_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    received: AtomicU64,
    decoded: AtomicU64,
    rejected: AtomicU64,
    alerts_raised: AtomicU64,
    alerts_suppressed: AtomicU64,
    store_failures: AtomicU64,
    observer_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn alert_raised(&self) {
        self.alerts_raised.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn alert_suppressed(&self) {
        self.alerts_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn observer_failure(&self) {
        self.observer_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> IngestStats {
        IngestStats {
            received: self.received.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            alerts_suppressed: self.alerts_suppressed.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            observer_failures: self.observer_failures.load(Ordering::Relaxed),
        }
    }
}
