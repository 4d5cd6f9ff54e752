/// Reasons a telemetry frame is rejected.
///
/// Each decode failure maps to exactly one variant; they are checked in the
/// order listed, so one input never produces more than one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Nothing left after stripping whitespace and `0x` markers.
    #[error("empty packet string")]
    EmptyInput,

    /// Hex text cannot be split into whole bytes.
    #[error("hex string has an odd number of characters ({digits}); each byte requires exactly two hex digits")]
    OddHexLength { digits: usize },

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex character {character:?} at position {index}")]
    InvalidHexChars { character: char, index: usize },

    /// Fewer bytes than a header plus checksum.
    #[error("packet too short: {actual} bytes (minimum is {minimum})")]
    TooShort { actual: usize, minimum: usize },

    /// The first two bytes are not the sync marker.
    #[error("sync header mismatch at offset 0: got 0x{actual:04X}, expected 0x{expected:04X}")]
    SyncMismatch { expected: u16, actual: u16 },

    /// The length byte at offset 2 disagrees with the decoded byte count.
    #[error("length field at offset 2 says {declared} bytes but actual data is {actual} bytes")]
    LengthMismatch { declared: u8, actual: usize },

    /// The length byte is smaller than a header plus checksum.
    #[error("declared packet length {declared} is below minimum {minimum}")]
    DeclaredLengthBelowMinimum { declared: u8, minimum: usize },

    /// The trailing checksum does not match the recomputed one.
    #[error("CRC mismatch at offset {offset}: packet carries 0x{received:04X}, calculated 0x{calculated:04X}")]
    CrcMismatch {
        offset: usize,
        received: u16,
        calculated: u16,
    },

    /// A housekeeping frame whose payload cannot hold every reading.
    #[error("housekeeping payload too short: {actual} bytes, expected {expected}")]
    TruncatedPayload { actual: usize, expected: usize },

    /// The type byte at offset 3 is not an assigned code.
    #[error("unknown packet type at offset 3: 0x{code:02X}")]
    UnknownType { code: u8 },

    /// Encoding would overflow the one-byte length field.
    #[error("packet too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl FrameError {
    /// Stable label for log fields and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::EmptyInput => "empty_input",
            FrameError::OddHexLength { .. } => "odd_hex_length",
            FrameError::InvalidHexChars { .. } => "invalid_hex_chars",
            FrameError::TooShort { .. } => "too_short",
            FrameError::SyncMismatch { .. } => "sync_mismatch",
            FrameError::LengthMismatch { .. } => "length_mismatch",
            FrameError::DeclaredLengthBelowMinimum { .. } => "declared_length_below_minimum",
            FrameError::CrcMismatch { .. } => "crc_mismatch",
            FrameError::TruncatedPayload { .. } => "truncated_payload",
            FrameError::UnknownType { .. } => "unknown_type",
            FrameError::PayloadTooLarge { .. } => "payload_too_large",
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
