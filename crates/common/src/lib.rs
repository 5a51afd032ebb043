//! Common utilities for dymo-scale
//!
//! This crate provides shared functionality between the session library and
//! the reader binary: the USB collaborator abstractions the session is
//! written against, logging setup, and error handling. A recording mock
//! collaborator for tests is available behind the `test-utils` feature.

pub mod error;
pub mod logging;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod usb_types;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use usb_types::{
    DYMO_VENDOR_ID, DeviceListing, DeviceSummary, EndpointInfo, EndpointPath, ScaleDevice,
    UsbBackend,
};
