//! CRC-16 with polynomial `0x8005` (CRC-16/UMTS parameters).
//!
//! Initial register `0x0000`, MSB first, no reflection, no final XOR.
//! Producers and the decoder must share this routine.

/// Generator polynomial.
pub const CRC16_POLY: u16 = 0x8005;

/// Compute the frame checksum over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0x0000;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
