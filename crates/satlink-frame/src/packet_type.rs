//! Packet type codes carried at header offset 3.

/// Routine health telemetry (battery, thermal, recorder usage).
pub const HOUSEKEEPING: u8 = 0x10;

/// Opaque mission payload.
pub const PAYLOAD_DATA: u8 = 0x20;

/// Returns a human-readable name for a packet type code.
pub fn packet_type_name(code: u8) -> &'static str {
    match code {
        HOUSEKEEPING => "HOUSEKEEPING",
        PAYLOAD_DATA => "PAYLOAD_DATA",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_codes() {
        assert_eq!(packet_type_name(HOUSEKEEPING), "HOUSEKEEPING");
        assert_eq!(packet_type_name(PAYLOAD_DATA), "PAYLOAD_DATA");
        assert_eq!(packet_type_name(0x30), "UNKNOWN");
    }
}
