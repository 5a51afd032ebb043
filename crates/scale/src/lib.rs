//! Dymo USB scale access
//!
//! Opens the one Dymo scale attached to the host and reads weight reports
//! from its interrupt endpoint.
//!
//! ```no_run
//! use scale::ScaleSession;
//!
//! # fn main() -> scale::Result<()> {
//! let mut session = ScaleSession::open()?;
//! let measurement = session.read_measurement()?;
//! println!("raw weight: {}", measurement.raw_weight());
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! The session is generic over the USB collaborator
//! ([`common::UsbBackend`]); [`ScaleSession::open`] uses libusb through
//! [`RusbBackend`], while [`ScaleSession::open_with`] accepts any backend.

pub use rusb;

pub mod error;
pub mod session;
pub mod usb;

pub use error::{Result, ScaleError};
pub use protocol::{MEASUREMENT_LEN, Measurement};
pub use session::{EndpointReader, RawPacket, ScaleSession};
pub use usb::{RusbBackend, RusbDevice};
