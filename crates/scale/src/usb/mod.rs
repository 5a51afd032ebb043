//! libusb collaborator
//!
//! Implements [`common::UsbBackend`] and [`common::ScaleDevice`] on top of
//! rusb. Everything here is a thin mapping onto libusb calls; the session
//! logic lives in [`crate::session`].

pub mod context;
pub mod device;

pub use context::RusbBackend;
pub use device::RusbDevice;
