//! NextPM concentration frame
//!
//! Response to the "read concentrations" command, 16 bytes:
//!
//! | offset | len | content                                   |
//! |--------|-----|-------------------------------------------|
//! | 0      | 2   | header `0x81 0x12`                        |
//! | 2      | 1   | sensor state                              |
//! | 3      | 12  | six big-endian u16, PM values in 3 last   |
//! | 15     | 1   | checksum: all 16 bytes sum to 0 mod 256   |

use super::error::DecodeError;

/// Request for the 10 s averaged concentrations
pub const CONCENTRATION_REQUEST: [u8; 3] = [0x81, 0x12, 0x6D];

/// Leading bytes of a concentration response
pub const FRAME_HEADER: [u8; 2] = [0x81, 0x12];

/// Full frame length
pub const FRAME_LEN: usize = 16;

/// Payload length between state byte and checksum
pub const PAYLOAD_LEN: usize = 12;

/// Payload offsets of the big-endian PM1, PM2.5 and PM10 words
const PM1_OFFSET: usize = 6;
const PM2_5_OFFSET: usize = 8;
const PM10_OFFSET: usize = 10;

/// Raw values are tenths of µg/m³
const RAW_SCALE: f32 = 10.0;

/// Particulate concentrations [µg/m³]
///
/// `valid` only describes the most recent sampling attempt; the numbers
/// may be left over from an earlier successful one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParticulateReading {
    pub pm1: f32,
    pub pm2_5: f32,
    pub pm10: f32,
    pub valid: bool,
}

/// One 16-byte frame as received from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticulateFrame {
    bytes: [u8; FRAME_LEN],
}

impl ParticulateFrame {
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self { bytes }
    }

    /// Reassemble a frame from its separately read parts
    pub fn from_parts(state: u8, payload: &[u8; PAYLOAD_LEN], checksum: u8) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[..2].copy_from_slice(&FRAME_HEADER);
        bytes[2] = state;
        bytes[3..3 + PAYLOAD_LEN].copy_from_slice(payload);
        bytes[FRAME_LEN - 1] = checksum;
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Sensor state byte, passed through uninterpreted
    pub fn state(&self) -> u8 {
        self.bytes[2]
    }

    pub fn checksum_ok(&self) -> bool {
        checksum(&self.bytes) == 0
    }

    fn payload_word(&self, offset: usize) -> u16 {
        let i = 3 + offset;
        u16::from_be_bytes([self.bytes[i], self.bytes[i + 1]])
    }

    /// Validate the checksum and convert the three PM words
    pub fn decode(&self) -> Result<ParticulateReading, DecodeError> {
        if !self.checksum_ok() {
            return Err(DecodeError::ChecksumMismatch);
        }
        Ok(ParticulateReading {
            pm1: f32::from(self.payload_word(PM1_OFFSET)) / RAW_SCALE,
            pm2_5: f32::from(self.payload_word(PM2_5_OFFSET)) / RAW_SCALE,
            pm10: f32::from(self.payload_word(PM10_OFFSET)) / RAW_SCALE,
            valid: true,
        })
    }
}

/// 8-bit additive sum
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Valid frame carrying the given raw PM words
    pub fn frame_with(pm1: u16, pm2_5: u16, pm10: u16) -> [u8; FRAME_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[PM1_OFFSET..PM1_OFFSET + 2].copy_from_slice(&pm1.to_be_bytes());
        payload[PM2_5_OFFSET..PM2_5_OFFSET + 2].copy_from_slice(&pm2_5.to_be_bytes());
        payload[PM10_OFFSET..PM10_OFFSET + 2].copy_from_slice(&pm10.to_be_bytes());
        let mut frame = ParticulateFrame::from_parts(0x00, &payload, 0);
        let sum = checksum(frame.as_bytes());
        frame.bytes[FRAME_LEN - 1] = 0u8.wrapping_sub(sum);
        *frame.as_bytes()
    }
}
