//! Protocol error types

use thiserror::Error;

/// Errors raised while decoding a weight report
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Fewer bytes than a full report were available
    #[error("Incomplete measurement: expected {expected} bytes, got {actual}")]
    IncompleteMeasurement { expected: usize, actual: usize },

    /// The byte source reported an error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_measurement_display() {
        let err = ProtocolError::IncompleteMeasurement {
            expected: 6,
            actual: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Incomplete measurement"));
        assert!(msg.contains("expected 6"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "endpoint gone");
        let err: ProtocolError = io.into();
        assert!(matches!(err, ProtocolError::Io(_)));
        assert!(format!("{}", err).contains("endpoint gone"));
    }
}
