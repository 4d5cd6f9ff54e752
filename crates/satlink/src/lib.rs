//! Satellite telemetry ingestion.
//!
//! A ground station receives hex-encoded telemetry frames over UDP,
//! validates them, persists housekeeping readings and raises health alerts.
//!
//! # Crate Structure
//!
//! - [`transport`]: UDP socket with bounded receive and prompt shutdown
//! - [`frame`]: wire format, CRC-16 and the frame decoder/encoder
//! - [`health`]: threshold rules and alert evaluation
//! - [`ingest`]: the listener service, persistence trait and in-memory store

/// Re-export transport types.
pub mod transport {
    pub use satlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use satlink_frame::*;
}

/// Re-export health rule types.
pub mod health {
    pub use satlink_health::*;
}

/// Re-export ingestion service types.
pub mod ingest {
    pub use satlink_ingest::*;
}
