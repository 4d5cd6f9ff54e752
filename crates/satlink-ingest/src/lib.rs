//! UDP ingestion service for satellite telemetry.
//!
//! One dedicated thread receives datagrams, decodes each as a frame,
//! stores housekeeping frames and their health alerts through an injected
//! [`TelemetryStore`], and notifies an optional [`FrameObserver`]. A
//! malformed datagram is logged and dropped; it never stops the loop.

pub mod config;
pub mod error;
pub mod memory;
pub mod observer;
pub mod processor;
pub mod service;
pub mod stats;
pub mod store;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use memory::{MemoryStore, StoredTelemetry, DEFAULT_RETENTION};
pub use observer::{FrameObserver, ObserverResult};
pub use processor::{DatagramProcessor, Outcome};
pub use service::{IngestService, ServiceState};
pub use stats::IngestStats;
pub use store::{TelemetryId, TelemetryStore};
