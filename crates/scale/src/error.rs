//! Scale session error types

use protocol::ProtocolError;
use thiserror::Error;

/// Errors raised while opening, reading from or closing a scale session
#[derive(Debug, Error)]
pub enum ScaleError {
    /// The libusb context could not be created
    #[error("Failed to initialise USB context: {0}")]
    ContextInit(#[source] rusb::Error),

    /// Listing USB devices failed
    #[error("Failed to enumerate USB devices: {0}")]
    Enumeration(#[source] rusb::Error),

    /// Zero or several Dymo devices were attached
    #[error("expected exactly 1 device, found {found}")]
    DeviceCount { found: usize },

    /// The configuration / interface / endpoint chain could not be opened
    #[error("Failed to open scale endpoint: {0}")]
    EndpointOpen(#[source] rusb::Error),

    /// An endpoint read failed
    #[error("Failed to read from scale: {0}")]
    Read(#[source] rusb::Error),

    /// A report could not be decoded from what the endpoint delivered
    #[error("Failed to decode measurement: {0}")]
    Decode(#[from] ProtocolError),

    /// Closing the device failed; `context` holds the context close error, if
    /// that failed too
    #[error("Failed to close scale device: {source}{}", context_suffix(.context))]
    DeviceClose {
        #[source]
        source: rusb::Error,
        context: Option<rusb::Error>,
    },

    /// The device closed cleanly but the context did not
    #[error("Failed to close USB context: {0}")]
    ContextClose(#[source] rusb::Error),
}

fn context_suffix(context: &Option<rusb::Error>) -> String {
    match context {
        Some(e) => format!(" (closing USB context also failed: {})", e),
        None => String::new(),
    }
}

/// Type alias for scale results
pub type Result<T> = std::result::Result<T, ScaleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_device_count_display() {
        let err = ScaleError::DeviceCount { found: 0 };
        assert_eq!(err.to_string(), "expected exactly 1 device, found 0");

        let err = ScaleError::DeviceCount { found: 2 };
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_device_close_reports_both_errors() {
        let err = ScaleError::DeviceClose {
            source: rusb::Error::Io,
            context: Some(rusb::Error::Busy),
        };
        let msg = err.to_string();
        assert!(msg.contains(&rusb::Error::Io.to_string()));
        assert!(msg.contains(&rusb::Error::Busy.to_string()));
        assert!(msg.contains("also failed"));
    }

    #[test]
    fn test_device_close_source_is_device_error() {
        let err = ScaleError::DeviceClose {
            source: rusb::Error::NoDevice,
            context: None,
        };
        assert!(!err.to_string().contains("also failed"));
        let source = err.source().and_then(|s| s.downcast_ref::<rusb::Error>());
        assert_eq!(source, Some(&rusb::Error::NoDevice));
    }

    #[test]
    fn test_decode_conversion() {
        let err: ScaleError = ProtocolError::IncompleteMeasurement {
            expected: 6,
            actual: 2,
        }
        .into();
        assert!(matches!(err, ScaleError::Decode(_)));
    }
}
