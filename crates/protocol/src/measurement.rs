//! Weight report layout
//!
//! A Dymo scale reports each reading as a fixed 6-byte little-endian record:
//!
//! ```text
//! [always_three: i8][stability: i8][mode: i8][scale_factor: i8][weight_minor: u8][weight_major: u8]
//! ```
//!
//! Fields are surfaced exactly as the device sends them. Nothing here checks
//! `always_three` or converts the weight into physical units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a weight report on the wire
pub const MEASUREMENT_LEN: usize = 6;

/// A decoded weight report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Measurement {
    /// Report marker, normally 3
    pub always_three: i8,
    /// How settled the reading is
    pub stability: i8,
    /// Unit mode (grams or ounces)
    pub mode: i8,
    /// Power-of-ten exponent applied to `weight_minor` in ounce mode
    pub scale_factor: i8,
    /// Low byte of the weight
    pub weight_minor: u8,
    /// Overflow for `weight_minor`, counted in units of 256
    pub weight_major: u8,
}

impl Measurement {
    /// Build a report from exactly one wire record
    ///
    /// # Example
    /// ```
    /// use protocol::Measurement;
    ///
    /// let m = Measurement::from_bytes([3, 2, 1, 0, 200, 1]);
    /// assert_eq!(m.raw_weight(), 456);
    /// ```
    pub fn from_bytes(bytes: [u8; MEASUREMENT_LEN]) -> Self {
        let [always_three, stability, mode, scale_factor, weight_minor, weight_major] = bytes;
        Self {
            always_three: i8::from_le_bytes([always_three]),
            stability: i8::from_le_bytes([stability]),
            mode: i8::from_le_bytes([mode]),
            scale_factor: i8::from_le_bytes([scale_factor]),
            weight_minor,
            weight_major,
        }
    }

    /// Combined raw weight: `weight_minor + weight_major * 256`
    pub fn raw_weight(&self) -> u16 {
        u16::from_le_bytes([self.weight_minor, self.weight_major])
    }

    /// Encode back into the wire layout
    pub fn to_bytes(&self) -> [u8; MEASUREMENT_LEN] {
        [
            self.always_three.to_le_bytes()[0],
            self.stability.to_le_bytes()[0],
            self.mode.to_le_bytes()[0],
            self.scale_factor.to_le_bytes()[0],
            self.weight_minor,
            self.weight_major,
        ]
    }
}

impl TryFrom<&[u8]> for Measurement {
    type Error = crate::ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        crate::decode_measurement(bytes)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "weight={} (major={}, minor={}) mode={} scale_factor={} stability={}",
            self.raw_weight(),
            self.weight_major,
            self.weight_minor,
            self.mode,
            self.scale_factor,
            self.stability
        )
    }
}
