//! Protocol library for dymo-scale
//!
//! This crate defines the weight report a Dymo USB scale sends on its
//! interrupt endpoint and the decoder that turns raw bytes into a
//! [`Measurement`].
//!
//! # Example
//!
//! ```
//! use protocol::decode_measurement;
//!
//! let measurement = decode_measurement(&[3, 2, 1, 0, 200, 1]).unwrap();
//! assert_eq!(measurement.always_three, 3);
//! assert_eq!(measurement.raw_weight(), 456);
//! ```
//!
//! # Streams
//!
//! Any [`std::io::Read`] source can be decoded from directly:
//!
//! ```
//! use protocol::read_measurement;
//! use std::io::Cursor;
//!
//! let mut stream = Cursor::new(vec![3, 4, 2, 0xff, 10, 0]);
//! let measurement = read_measurement(&mut stream).unwrap();
//! assert_eq!(measurement.scale_factor, -1);
//! ```

pub mod codec;
pub mod error;
pub mod measurement;

pub use codec::{decode_measurement, read_measurement};
pub use error::{ProtocolError, Result};
pub use measurement::{MEASUREMENT_LEN, Measurement};
