use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::checksum::crc16;
use crate::error::{FrameError, Result};
use crate::packet_type::{HOUSEKEEPING, PAYLOAD_DATA};

/// Frame sync marker at offset 0.
pub const SYNC_HEADER: u16 = 0x1ACF;

/// Fixed header: sync (2) + length (1) + type (1) + satellite (2) + timestamp (4).
pub const HEADER_SIZE: usize = 10;

/// Checksum trailer size.
pub const CRC_SIZE: usize = 2;

/// Smallest valid frame: header and checksum around an empty payload.
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + CRC_SIZE;

/// Largest frame the one-byte length field can describe.
pub const MAX_PACKET_SIZE: usize = u8::MAX as usize;

/// Housekeeping payload: voltage (2) + battery temp (1) + MSI temp (1) + SSR used (4).
pub const HK_PAYLOAD_SIZE: usize = 8;

/// A decoded, fully validated telemetry frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Source spacecraft.
    pub satellite_id: u16,
    /// Unix epoch seconds stamped on board.
    pub timestamp: u32,
    /// Type-specific contents.
    #[serde(flatten)]
    pub body: FrameBody,
    /// The normalized hex text this frame was decoded from.
    pub raw_hex: String,
}

/// Type-specific frame contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "packet_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameBody {
    Housekeeping(HousekeepingReadings),
    PayloadData(PayloadData),
}

/// Readings carried by a housekeeping frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HousekeepingReadings {
    pub battery_voltage_mv: u16,
    pub battery_temp_c: i8,
    pub msi_temperature_c: u8,
    pub ssr_used_mb: u32,
}

/// Opaque payload of a payload-data frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadData {
    pub payload_hex: String,
    pub payload_length: usize,
}

/// Frame variant without its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Housekeeping,
    PayloadData,
}

impl FrameKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameKind::Housekeeping => "HOUSEKEEPING",
            FrameKind::PayloadData => "PAYLOAD_DATA",
        }
    }

    /// Wire type code.
    pub fn code(self) -> u8 {
        match self {
            FrameKind::Housekeeping => HOUSEKEEPING,
            FrameKind::PayloadData => PAYLOAD_DATA,
        }
    }
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self.body {
            FrameBody::Housekeeping(_) => FrameKind::Housekeeping,
            FrameBody::PayloadData(_) => FrameKind::PayloadData,
        }
    }

    /// Housekeeping readings, if this is a housekeeping frame.
    pub fn housekeeping(&self) -> Option<&HousekeepingReadings> {
        match &self.body {
            FrameBody::Housekeeping(readings) => Some(readings),
            FrameBody::PayloadData(_) => None,
        }
    }

    /// Look up a numeric measurement by field name.
    ///
    /// Returns `None` when this frame variant does not carry the field.
    pub fn measurement(&self, field: &str) -> Option<i64> {
        match &self.body {
            FrameBody::Housekeeping(readings) => readings.measurement(field),
            FrameBody::PayloadData(data) => match field {
                "payload_length" => i64::try_from(data.payload_length).ok(),
                _ => None,
            },
        }
    }
}

impl HousekeepingReadings {
    /// Numeric value of a named reading.
    pub fn measurement(&self, field: &str) -> Option<i64> {
        match field {
            "battery_voltage_mv" => Some(i64::from(self.battery_voltage_mv)),
            "battery_temp_c" => Some(i64::from(self.battery_temp_c)),
            "msi_temperature_c" => Some(i64::from(self.msi_temperature_c)),
            "ssr_used_mb" => Some(i64::from(self.ssr_used_mb)),
            _ => None,
        }
    }
}

/// Strip whitespace and every lowercase `0x` marker from hex text.
///
/// `0X` is left in place and rejected as an invalid hex character.
pub fn normalize_hex(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.replace("0x", "")
}

/// Decode one hex-encoded telemetry frame.
///
/// Validation order: text shape, minimum size, sync, declared length,
/// checksum, then type dispatch. The first failing check is reported.
pub fn decode(hex_text: &str) -> Result<Frame> {
    let cleaned = normalize_hex(hex_text);
    if cleaned.is_empty() {
        return Err(FrameError::EmptyInput);
    }

    let digits = cleaned.chars().count();
    if digits % 2 != 0 {
        return Err(FrameError::OddHexLength { digits });
    }

    let data = hex::decode(&cleaned).map_err(|err| invalid_hex(&cleaned, err))?;
    if data.len() < MIN_PACKET_SIZE {
        return Err(FrameError::TooShort {
            actual: data.len(),
            minimum: MIN_PACKET_SIZE,
        });
    }

    let mut header = &data[..HEADER_SIZE];
    let sync = header.get_u16();
    if sync != SYNC_HEADER {
        return Err(FrameError::SyncMismatch {
            expected: SYNC_HEADER,
            actual: sync,
        });
    }

    let declared = header.get_u8();
    if usize::from(declared) != data.len() {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: data.len(),
        });
    }
    if usize::from(declared) < MIN_PACKET_SIZE {
        return Err(FrameError::DeclaredLengthBelowMinimum {
            declared,
            minimum: MIN_PACKET_SIZE,
        });
    }

    let packet_type = header.get_u8();
    let satellite_id = header.get_u16();
    let timestamp = header.get_u32();

    let crc_offset = data.len() - CRC_SIZE;
    let (covered, mut trailer) = data.split_at(crc_offset);
    let received = trailer.get_u16();
    let calculated = crc16(covered);
    if received != calculated {
        return Err(FrameError::CrcMismatch {
            offset: crc_offset,
            received,
            calculated,
        });
    }

    let payload = &covered[HEADER_SIZE..];
    let body = match packet_type {
        HOUSEKEEPING => FrameBody::Housekeeping(decode_housekeeping(payload)?),
        PAYLOAD_DATA => FrameBody::PayloadData(PayloadData {
            payload_hex: hex::encode(payload),
            payload_length: payload.len(),
        }),
        code => return Err(FrameError::UnknownType { code }),
    };

    Ok(Frame {
        satellite_id,
        timestamp,
        body,
        raw_hex: cleaned,
    })
}

fn decode_housekeeping(mut payload: &[u8]) -> Result<HousekeepingReadings> {
    if payload.len() < HK_PAYLOAD_SIZE {
        return Err(FrameError::TruncatedPayload {
            actual: payload.len(),
            expected: HK_PAYLOAD_SIZE,
        });
    }

    Ok(HousekeepingReadings {
        battery_voltage_mv: payload.get_u16(),
        battery_temp_c: payload.get_i8(),
        msi_temperature_c: payload.get_u8(),
        ssr_used_mb: payload.get_u32(),
    })
}

fn invalid_hex(cleaned: &str, err: hex::FromHexError) -> FrameError {
    // Report the offending character by char position; the hex crate reports
    // byte positions, which drift on multi-byte UTF-8 input.
    match cleaned
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii_hexdigit())
    {
        Some((index, character)) => FrameError::InvalidHexChars { character, index },
        None => match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => FrameError::InvalidHexChars {
                character: c,
                index,
            },
            _ => FrameError::OddHexLength {
                digits: cleaned.len(),
            },
        },
    }
}

/// Encode a frame of any type code.
///
/// Wire format:
/// ```text
/// ┌──────────┬────────┬──────┬───────────┬────────────┬─────────┬──────────┐
/// │ Sync 2B  │ Len 1B │ Type │ Sat id 2B │ Time 4B    │ Payload │ CRC 2B   │
/// │ 0x1ACF   │ total  │ 1B   │ BE        │ BE seconds │         │ BE       │
/// └──────────┴────────┴──────┴───────────┴────────────┴─────────┴──────────┘
/// ```
pub fn encode_frame(
    packet_type: u8,
    satellite_id: u16,
    timestamp: u32,
    payload: &[u8],
) -> Result<Bytes> {
    let total = HEADER_SIZE + payload.len() + CRC_SIZE;
    if total > MAX_PACKET_SIZE {
        return Err(FrameError::PayloadTooLarge {
            size: total,
            max: MAX_PACKET_SIZE,
        });
    }
    Ok(assemble(packet_type, satellite_id, timestamp, payload))
}

/// Encode a housekeeping frame.
pub fn encode_housekeeping(
    satellite_id: u16,
    timestamp: u32,
    readings: &HousekeepingReadings,
) -> Bytes {
    let mut payload = BytesMut::with_capacity(HK_PAYLOAD_SIZE);
    payload.put_u16(readings.battery_voltage_mv);
    payload.put_i8(readings.battery_temp_c);
    payload.put_u8(readings.msi_temperature_c);
    payload.put_u32(readings.ssr_used_mb);
    assemble(HOUSEKEEPING, satellite_id, timestamp, &payload)
}

/// Encode a payload-data frame.
pub fn encode_payload_data(satellite_id: u16, timestamp: u32, payload: &[u8]) -> Result<Bytes> {
    encode_frame(PAYLOAD_DATA, satellite_id, timestamp, payload)
}

/// Lowercase hex text, as sent over the wire.
pub fn to_hex(frame: &[u8]) -> String {
    hex::encode(frame)
}

// Callers guarantee the total fits the length byte.
fn assemble(packet_type: u8, satellite_id: u16, timestamp: u32, payload: &[u8]) -> Bytes {
    let total = HEADER_SIZE + payload.len() + CRC_SIZE;
    let mut dst = BytesMut::with_capacity(total);
    dst.put_u16(SYNC_HEADER);
    dst.put_u8(total as u8);
    dst.put_u8(packet_type);
    dst.put_u16(satellite_id);
    dst.put_u32(timestamp);
    dst.put_slice(payload);
    let crc = crc16(&dst);
    dst.put_u16(crc);
    dst.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal() -> HousekeepingReadings {
        HousekeepingReadings {
            battery_voltage_mv: 13_800,
            battery_temp_c: 22,
            msi_temperature_c: 28,
            ssr_used_mb: 512,
        }
    }

    fn nominal_hex() -> String {
        to_hex(&encode_housekeeping(1, 1_700_000_000, &nominal()))
    }

    #[test]
    fn housekeeping_roundtrip() {
        let frame = decode(&nominal_hex()).unwrap();

        assert_eq!(frame.kind(), FrameKind::Housekeeping);
        assert_eq!(frame.satellite_id, 1);
        assert_eq!(frame.timestamp, 1_700_000_000);
        assert_eq!(frame.housekeeping(), Some(&nominal()));
        assert_eq!(frame.raw_hex, nominal_hex());
    }

    #[test]
    fn housekeeping_wire_layout() {
        let wire = encode_housekeeping(1, 1_700_000_000, &nominal());
        assert_eq!(wire.len(), 20);
        assert_eq!(&wire[..4], &[0x1A, 0xCF, 20, HOUSEKEEPING]);
        assert_eq!(&wire[4..6], &[0x00, 0x01]);
        assert_eq!(&wire[6..10], &1_700_000_000u32.to_be_bytes());
        assert_eq!(&wire[10..12], &13_800u16.to_be_bytes());
        let crc = crc16(&wire[..18]);
        assert_eq!(&wire[18..], &crc.to_be_bytes());
    }

    #[test]
    fn negative_battery_temperature() {
        let readings = HousekeepingReadings {
            battery_temp_c: -40,
            ..nominal()
        };
        let frame = decode(&to_hex(&encode_housekeeping(7, 42, &readings))).unwrap();
        assert_eq!(frame.housekeeping().unwrap().battery_temp_c, -40);
    }

    #[test]
    fn payload_data_roundtrip() {
        let wire = encode_payload_data(9, 1234, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        let frame = decode(&to_hex(&wire)).unwrap();

        assert_eq!(frame.kind(), FrameKind::PayloadData);
        assert_eq!(frame.satellite_id, 9);
        assert_eq!(
            frame.body,
            FrameBody::PayloadData(PayloadData {
                payload_hex: "deadbeef".to_string(),
                payload_length: 4,
            })
        );
        assert!(frame.housekeeping().is_none());
    }

    #[test]
    fn empty_payload_data_is_minimum_frame() {
        let wire = encode_payload_data(1, 1, &[]).unwrap();
        assert_eq!(wire.len(), MIN_PACKET_SIZE);
        let frame = decode(&to_hex(&wire)).unwrap();
        assert_eq!(frame.measurement("payload_length"), Some(0));
    }

    #[test]
    fn normalizes_prefix_spaces_and_newlines() {
        let spaced: String = nominal_hex()
            .as_bytes()
            .chunks(2)
            .map(|pair| format!("0x{} ", std::str::from_utf8(pair).unwrap().to_uppercase()))
            .collect::<Vec<_>>()
            .join("\n");
        let frame = decode(&format!("  {spaced}\r\n")).unwrap();
        assert_eq!(frame.satellite_id, 1);
        assert_eq!(frame.raw_hex, nominal_hex().to_uppercase());
    }

    #[test]
    fn uppercase_prefix_is_invalid_hex() {
        let prefixed = format!("0X{}", nominal_hex());
        assert_eq!(
            decode(&prefixed),
            Err(FrameError::InvalidHexChars {
                character: 'X',
                index: 1
            })
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(decode(""), Err(FrameError::EmptyInput));
        assert_eq!(decode("  \n 0x "), Err(FrameError::EmptyInput));
    }

    #[test]
    fn rejects_odd_length() {
        assert_eq!(decode("1acf1"), Err(FrameError::OddHexLength { digits: 5 }));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert_eq!(
            decode("1acfzz"),
            Err(FrameError::InvalidHexChars {
                character: 'z',
                index: 4
            })
        );
    }

    #[test]
    fn rejects_multibyte_character_by_char_position() {
        assert_eq!(
            decode("1aé0"),
            Err(FrameError::InvalidHexChars {
                character: 'é',
                index: 2
            })
        );
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(
            decode("1acf14"),
            Err(FrameError::TooShort {
                actual: 3,
                minimum: MIN_PACKET_SIZE
            })
        );
    }

    #[test]
    fn rejects_wrong_sync() {
        let hex = format!("dead{}", &nominal_hex()[4..]);
        assert_eq!(
            decode(&hex),
            Err(FrameError::SyncMismatch {
                expected: SYNC_HEADER,
                actual: 0xDEAD
            })
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut wire = encode_housekeeping(1, 1, &nominal()).to_vec();
        wire.push(0x00);
        assert_eq!(
            decode(&to_hex(&wire)),
            Err(FrameError::LengthMismatch {
                declared: 20,
                actual: 21
            })
        );
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut wire = encode_housekeeping(1, 1, &nominal()).to_vec();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        let err = decode(&to_hex(&wire)).unwrap_err();
        assert!(matches!(err, FrameError::CrcMismatch { offset: 18, .. }));
    }

    #[test]
    fn rejects_unknown_type_with_valid_checksum() {
        let wire = encode_frame(0x30, 1, 1, &[0u8; 8]).unwrap();
        assert_eq!(
            decode(&to_hex(&wire)),
            Err(FrameError::UnknownType { code: 0x30 })
        );
    }

    #[test]
    fn rejects_truncated_housekeeping_payload() {
        let wire = encode_frame(HOUSEKEEPING, 1, 1, &[0x2E, 0xE0, 0x16, 0x1C]).unwrap();
        assert_eq!(
            decode(&to_hex(&wire)),
            Err(FrameError::TruncatedPayload {
                actual: 4,
                expected: HK_PAYLOAD_SIZE
            })
        );
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_PACKET_SIZE - MIN_PACKET_SIZE + 1];
        assert_eq!(
            encode_payload_data(1, 1, &payload),
            Err(FrameError::PayloadTooLarge {
                size: MAX_PACKET_SIZE + 1,
                max: MAX_PACKET_SIZE
            })
        );
        let largest = vec![0u8; MAX_PACKET_SIZE - MIN_PACKET_SIZE];
        assert_eq!(encode_payload_data(1, 1, &largest).unwrap().len(), MAX_PACKET_SIZE);
    }

    #[test]
    fn measurement_lookup() {
        let frame = decode(&nominal_hex()).unwrap();
        assert_eq!(frame.measurement("battery_voltage_mv"), Some(13_800));
        assert_eq!(frame.measurement("msi_temperature_c"), Some(28));
        assert_eq!(frame.measurement("payload_length"), None);
        assert_eq!(frame.measurement("solar_current_ma"), None);
    }

    #[test]
    fn serializes_flat_with_packet_type_tag() {
        let frame = decode(&nominal_hex()).unwrap();
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["packet_type"], "HOUSEKEEPING");
        assert_eq!(value["satellite_id"], 1);
        assert_eq!(value["battery_voltage_mv"], 13_800);
        assert_eq!(value["raw_hex"], nominal_hex());
    }
}
