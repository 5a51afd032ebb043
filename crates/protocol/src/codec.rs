//! Weight report decoding
//!
//! Decoding is purely positional. Exactly [`MEASUREMENT_LEN`] bytes are
//! consumed per report; a source that runs dry earlier fails the whole
//! report and no partially filled [`Measurement`] is ever returned.

use crate::{MEASUREMENT_LEN, Measurement, error::ProtocolError, error::Result};
use std::io::{ErrorKind, Read};

/// Decode a weight report from an in-memory packet
///
/// Only the first [`MEASUREMENT_LEN`] bytes are inspected; anything after
/// them (e.g. padding up to the endpoint's max packet size) is ignored.
///
/// # Example
/// ```
/// use protocol::decode_measurement;
///
/// let m = decode_measurement(&[3, 2, 1, 0, 200, 1, 0, 0]).unwrap();
/// assert_eq!(m.weight_minor, 200);
/// assert_eq!(m.weight_major, 1);
///
/// assert!(decode_measurement(&[3, 2, 1]).is_err());
/// ```
pub fn decode_measurement(bytes: &[u8]) -> Result<Measurement> {
    if bytes.len() < MEASUREMENT_LEN {
        return Err(ProtocolError::IncompleteMeasurement {
            expected: MEASUREMENT_LEN,
            actual: bytes.len(),
        });
    }

    let mut packet = [0u8; MEASUREMENT_LEN];
    packet.copy_from_slice(&bytes[..MEASUREMENT_LEN]);
    Ok(Measurement::from_bytes(packet))
}

/// Read and decode one weight report from a byte source
///
/// Keeps reading until [`MEASUREMENT_LEN`] bytes have arrived. A read that
/// returns zero bytes before then is reported as
/// [`ProtocolError::IncompleteMeasurement`]. Only `Interrupted` errors are
/// retried; every other source error is returned as-is.
///
/// # Example
/// ```
/// use protocol::read_measurement;
/// use std::io::Cursor;
///
/// let mut stream = Cursor::new(vec![3, 2, 1, 0, 200, 1, 0xaa]);
/// let m = read_measurement(&mut stream).unwrap();
/// assert_eq!(m.raw_weight(), 456);
/// assert_eq!(stream.position(), 6);
/// ```
pub fn read_measurement<R: Read>(reader: &mut R) -> Result<Measurement> {
    let mut packet = [0u8; MEASUREMENT_LEN];
    let mut filled = 0;

    while filled < MEASUREMENT_LEN {
        match reader.read(&mut packet[filled..]) {
            Ok(0) => {
                return Err(ProtocolError::IncompleteMeasurement {
                    expected: MEASUREMENT_LEN,
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProtocolError::Io(e)),
        }
    }

    Ok(Measurement::from_bytes(packet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Hands out its data a few bytes per read call
    struct Trickle {
        data: Vec<u8>,
        chunk: usize,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let remaining = self.data.len() - self.pos;
            let n = remaining.min(self.chunk).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Fails with `Interrupted` once, then behaves like a cursor
    struct InterruptedOnce {
        inner: Cursor<Vec<u8>>,
        interrupted: bool,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn test_decode_reference_packet() {
        let m = decode_measurement(&[3, 2, 1, 0, 200, 1]).unwrap();
        assert_eq!(m.always_three, 3);
        assert_eq!(m.stability, 2);
        assert_eq!(m.mode, 1);
        assert_eq!(m.scale_factor, 0);
        assert_eq!(m.weight_minor, 200);
        assert_eq!(m.weight_major, 1);
        assert_eq!(m.raw_weight(), 456);
    }

    #[test]
    fn test_decode_signed_fields() {
        let m = decode_measurement(&[0xff, 0x80, 0x7f, 0xfe, 0, 0]).unwrap();
        assert_eq!(m.always_three, -1);
        assert_eq!(m.stability, -128);
        assert_eq!(m.mode, 127);
        assert_eq!(m.scale_factor, -2);
    }

    #[test]
    fn test_decode_short_packet() {
        let err = decode_measurement(&[3, 2, 1]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::IncompleteMeasurement {
                expected: 6,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_decode_empty_packet() {
        assert!(decode_measurement(&[]).is_err());
    }

    #[test]
    fn test_read_short_stream() {
        let mut stream = Cursor::new(vec![3u8, 2, 1]);
        let err = read_measurement(&mut stream).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::IncompleteMeasurement {
                expected: 6,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_read_does_not_consume_past_report() {
        let mut stream = Cursor::new(vec![3u8, 2, 1, 0, 200, 1, 3, 2, 1, 0, 7, 0]);
        let first = read_measurement(&mut stream).unwrap();
        assert_eq!(stream.position(), 6);
        let second = read_measurement(&mut stream).unwrap();
        assert_eq!(first.raw_weight(), 456);
        assert_eq!(second.raw_weight(), 7);
    }

    #[test]
    fn test_read_accumulates_partial_reads() {
        let mut source = Trickle {
            data: vec![3, 2, 1, 0, 200, 1],
            chunk: 4,
            pos: 0,
        };
        let m = read_measurement(&mut source).unwrap();
        assert_eq!(m.raw_weight(), 456);
    }

    #[test]
    fn test_read_retries_interrupted() {
        let mut source = InterruptedOnce {
            inner: Cursor::new(vec![3, 2, 1, 0, 200, 1]),
            interrupted: false,
        };
        assert!(read_measurement(&mut source).is_ok());
    }

    #[test]
    fn test_read_surfaces_source_error() {
        let err = read_measurement(&mut Broken).unwrap_err();
        match err {
            ProtocolError::Io(e) => assert_eq!(e.kind(), ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
