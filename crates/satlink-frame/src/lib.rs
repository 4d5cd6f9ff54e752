//! Telemetry frame codec for satellite ground-station links.
//!
//! Every frame on the wire is big-endian and laid out as:
//! - A 2-byte sync marker (`0x1ACF`)
//! - A 1-byte total length and a 1-byte packet type
//! - A 2-byte satellite id and a 4-byte Unix timestamp
//! - A variable payload followed by a 2-byte CRC-16 trailer
//!
//! Decoding is pure and stateless: a [`Frame`] exists only when the sync,
//! length and checksum all validated.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod packet_type;

pub use checksum::{crc16, CRC16_POLY};
pub use codec::{
    decode, encode_frame, encode_housekeeping, encode_payload_data, normalize_hex, to_hex, Frame,
    FrameBody, FrameKind, HousekeepingReadings, PayloadData, CRC_SIZE, HEADER_SIZE,
    HK_PAYLOAD_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE, SYNC_HEADER,
};
pub use error::{FrameError, Result};
pub use packet_type::{packet_type_name, HOUSEKEEPING, PAYLOAD_DATA};
