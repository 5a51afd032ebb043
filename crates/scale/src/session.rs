//! Scale session lifecycle
//!
//! A [`ScaleSession`] owns a USB context, the one Dymo device found through
//! it, and the opened endpoint of that device. Opening either yields all
//! three or releases everything it acquired along the way; closing always
//! attempts to release both the device and the context.

use crate::error::{Result, ScaleError};
use crate::usb::RusbBackend;
use common::{DeviceListing, DeviceSummary, EndpointInfo, ScaleDevice, UsbBackend};
use protocol::{Measurement, ProtocolError};
use std::io;
use tracing::{debug, warn};

/// Raw packet read from the scale endpoint
///
/// `buffer` is always sized to the endpoint's max packet size; only the first
/// `bytes_read` bytes were written by the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub buffer: Vec<u8>,
    pub bytes_read: usize,
}

impl RawPacket {
    /// The populated part of the buffer
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.bytes_read.min(self.buffer.len())]
    }
}

/// An open connection to a Dymo scale
///
/// Call [`close`](Self::close) to release the device and context and learn
/// whether that succeeded. A session that is dropped without being closed
/// releases them too, logging any failure.
///
/// A session is meant for a single reader; it is not synchronised.
pub struct ScaleSession<B: UsbBackend = RusbBackend> {
    // Declared before `backend` so the device is dropped first.
    device: B::Device,
    endpoint: EndpointInfo,
    backend: B,
    released: bool,
}

impl ScaleSession<RusbBackend> {
    /// Open the Dymo scale attached to this host through libusb
    pub fn open() -> Result<Self> {
        let backend = RusbBackend::new().map_err(ScaleError::ContextInit)?;
        Self::open_with(backend)
    }
}

impl<B: UsbBackend> ScaleSession<B> {
    /// Open the Dymo scale visible through `backend`
    ///
    /// Exactly one device with the Dymo vendor ID must be present; zero or
    /// several is a [`ScaleError::DeviceCount`] error. The first endpoint of
    /// the first alternate setting of the first interface of the first
    /// configuration is opened.
    ///
    /// On any failure every device handle obtained so far is closed, then the
    /// context, before the error is returned.
    pub fn open_with(mut backend: B) -> Result<Self> {
        let listing = backend.list_devices(&DeviceSummary::is_dymo);

        match select_device(listing) {
            Ok((device, endpoint)) => {
                debug!(
                    "Opened scale {:04x}:{:04x} endpoint {:#04x} (max packet {})",
                    device.summary().vendor_id,
                    device.summary().product_id,
                    endpoint.path.address,
                    endpoint.max_packet_size
                );
                Ok(Self {
                    device,
                    endpoint,
                    backend,
                    released: false,
                })
            }
            Err((devices, error)) => {
                debug!("Opening scale failed: {}", error);
                abandon(&mut backend, devices);
                Err(error)
            }
        }
    }

    /// Endpoint the session reads from
    pub fn endpoint(&self) -> &EndpointInfo {
        &self.endpoint
    }

    /// Descriptor summary of the opened scale
    pub fn device_summary(&self) -> DeviceSummary {
        self.device.summary()
    }

    /// Perform one blocking read into a max-packet-size buffer
    ///
    /// No retry and no accumulation: a short read is returned as is.
    pub fn read_raw(&mut self) -> Result<RawPacket> {
        let mut buffer = vec![0u8; usize::from(self.endpoint.max_packet_size)];
        let bytes_read = self
            .device
            .read(&self.endpoint, &mut buffer)
            .map_err(ScaleError::Read)?;

        debug!("Read {} raw bytes from scale", bytes_read);
        Ok(RawPacket { buffer, bytes_read })
    }

    /// Read and decode one weight report straight from the endpoint
    pub fn read_measurement(&mut self) -> Result<Measurement> {
        protocol::read_measurement(&mut self.reader()).map_err(measurement_error)
    }

    /// The endpoint as a byte stream
    pub fn reader(&mut self) -> EndpointReader<'_, B::Device> {
        EndpointReader {
            device: &mut self.device,
            endpoint: &self.endpoint,
        }
    }

    /// Close the device, then the context
    ///
    /// Both are always attempted. A device close failure is the error
    /// returned, with any context close failure attached to it.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let device = self.device.close();
        let context = self.backend.close();

        match (device, context) {
            (Err(source), context) => Err(ScaleError::DeviceClose {
                source,
                context: context.err(),
            }),
            (Ok(()), Err(e)) => Err(ScaleError::ContextClose(e)),
            (Ok(()), Ok(())) => {
                debug!("Closed scale session");
                Ok(())
            }
        }
    }
}

impl<B: UsbBackend> Drop for ScaleSession<B> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release scale session: {}", e);
        }
    }
}

/// Byte stream over a session's endpoint
///
/// Each `read` call is exactly one blocking endpoint read.
pub struct EndpointReader<'a, D: ScaleDevice> {
    device: &'a mut D,
    endpoint: &'a EndpointInfo,
}

impl<D: ScaleDevice> io::Read for EndpointReader<'_, D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.device.read(self.endpoint, buf).map_err(io::Error::other)
    }
}

type Rejected<D> = (Vec<D>, ScaleError);

/// Pick the single device out of a listing and open its endpoint
///
/// Every failure hands back all device handles so the caller can close them.
fn select_device<D: ScaleDevice>(
    listing: DeviceListing<D>,
) -> std::result::Result<(D, EndpointInfo), Rejected<D>> {
    let DeviceListing { devices, error } = listing;

    if let Some(e) = error {
        return Err((devices, ScaleError::Enumeration(e)));
    }

    debug!("Found {} Dymo device(s)", devices.len());

    let [mut device] = <[D; 1]>::try_from(devices).map_err(|devices| {
        let found = devices.len();
        (devices, ScaleError::DeviceCount { found })
    })?;

    match device
        .first_endpoint()
        .and_then(|path| device.open_endpoint(path))
    {
        Ok(endpoint) => Ok((device, endpoint)),
        Err(e) => Err((vec![device], ScaleError::EndpointOpen(e))),
    }
}

/// Close every device, then the context, logging failures
fn abandon<B: UsbBackend>(backend: &mut B, devices: Vec<B::Device>) {
    for mut device in devices {
        if let Err(e) = device.close() {
            warn!(
                "Failed to close device {:04x}:{:04x}: {}",
                device.summary().vendor_id,
                device.summary().product_id,
                e
            );
        }
    }
    if let Err(e) = backend.close() {
        warn!("Failed to close USB context: {}", e);
    }
}

/// Surface endpoint failures as read errors rather than decode errors
fn measurement_error(err: ProtocolError) -> ScaleError {
    match err {
        ProtocolError::Io(e) => match e.downcast::<rusb::Error>() {
            Ok(usb) => ScaleError::Read(usb),
            Err(e) => ScaleError::Decode(ProtocolError::Io(e)),
        },
        other => ScaleError::Decode(other),
    }
}
