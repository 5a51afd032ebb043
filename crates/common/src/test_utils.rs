//! Test utilities for dymo-scale
//!
//! Provides a mock USB collaborator that records every call it receives in a
//! shared, ordered [`CallLog`], plus helpers for building weight reports.
//!
//! # Example
//!
//! ```
//! use common::test_utils::{Call, MockBackend, MockDevice};
//! use common::UsbBackend;
//!
//! let mut backend = MockBackend::new().with_device(MockDevice::dymo());
//! let log = backend.log();
//!
//! let listing = backend.list_devices(&|d| d.is_dymo());
//! assert_eq!(listing.devices.len(), 1);
//! assert_eq!(log.calls(), vec![Call::ListDevices]);
//! ```

use crate::usb_types::{
    DYMO_VENDOR_ID, DeviceListing, DeviceSummary, EndpointInfo, EndpointPath, ScaleDevice,
    UsbBackend,
};
use protocol::Measurement;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Product ID used by [`MockDevice::dymo`] (M10 postal scale)
pub const MOCK_DYMO_PRODUCT_ID: u16 = 0x8003;

/// Max packet size of the endpoint exposed by a default mock device
pub const MOCK_MAX_PACKET_SIZE: u16 = 8;

/// Endpoint chain exposed by a default mock device
pub const MOCK_ENDPOINT: EndpointPath = EndpointPath {
    config: 1,
    interface: 0,
    setting: 0,
    address: 0x82,
};

/// A collaborator call, tagged with the index of the device it targeted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListDevices,
    OpenEndpoint { device: usize, path: EndpointPath },
    Read { device: usize, len: usize },
    CloseDevice { device: usize },
    CloseContext,
}

/// Ordered record of collaborator calls, shared by a backend and its devices
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        // A panicking test thread must not hide the calls made before it.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, call: Call) {
        self.lock().push(call);
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Indexes of devices that were closed, in close order
    pub fn closed_devices(&self) -> Vec<usize> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::CloseDevice { device } => Some(*device),
                _ => None,
            })
            .collect()
    }

    pub fn context_close_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|call| **call == Call::CloseContext)
            .count()
    }

    pub fn read_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|call| matches!(call, Call::Read { .. }))
            .count()
    }
}

/// Scripted outcome of one endpoint read
#[derive(Debug, Clone)]
enum ScriptedRead {
    Data(Vec<u8>),
    Fail(rusb::Error),
}

/// Mock opened device
///
/// Reads are served from a queue of scripted payloads. A payload longer than
/// the read buffer is truncated to fit; an exhausted queue yields zero-byte
/// reads.
#[derive(Debug, Clone)]
pub struct MockDevice {
    index: usize,
    log: CallLog,
    summary: DeviceSummary,
    endpoint: Option<EndpointPath>,
    max_packet_size: u16,
    open_error: Option<rusb::Error>,
    close_error: Option<rusb::Error>,
    reads: VecDeque<ScriptedRead>,
}

impl MockDevice {
    /// Device with the given IDs exposing [`MOCK_ENDPOINT`]
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            index: 0,
            log: CallLog::new(),
            summary: DeviceSummary {
                vendor_id,
                product_id,
                bus_number: 1,
                address: 1,
            },
            endpoint: Some(MOCK_ENDPOINT),
            max_packet_size: MOCK_MAX_PACKET_SIZE,
            open_error: None,
            close_error: None,
            reads: VecDeque::new(),
        }
    }

    /// A Dymo scale
    pub fn dymo() -> Self {
        Self::new(DYMO_VENDOR_ID, MOCK_DYMO_PRODUCT_ID)
    }

    pub fn with_max_packet_size(mut self, size: u16) -> Self {
        self.max_packet_size = size;
        self
    }

    /// Device whose descriptors expose no endpoint at all
    pub fn without_endpoints(mut self) -> Self {
        self.endpoint = None;
        self
    }

    pub fn failing_open(mut self, error: rusb::Error) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn failing_close(mut self, error: rusb::Error) -> Self {
        self.close_error = Some(error);
        self
    }

    /// Queue a payload for the next read
    pub fn with_read(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.reads.push_back(ScriptedRead::Data(data.into()));
        self
    }

    /// Queue a weight report for the next read
    pub fn with_measurement(self, measurement: Measurement) -> Self {
        self.with_read(measurement.to_bytes())
    }

    /// Queue a failure for the next read
    pub fn with_read_error(mut self, error: rusb::Error) -> Self {
        self.reads.push_back(ScriptedRead::Fail(error));
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl ScaleDevice for MockDevice {
    fn summary(&self) -> DeviceSummary {
        self.summary
    }

    fn first_endpoint(&self) -> rusb::Result<EndpointPath> {
        self.endpoint.ok_or(rusb::Error::NotFound)
    }

    fn open_endpoint(&mut self, path: EndpointPath) -> rusb::Result<EndpointInfo> {
        self.log.record(Call::OpenEndpoint {
            device: self.index,
            path,
        });
        if let Some(error) = self.open_error {
            return Err(error);
        }
        Ok(EndpointInfo {
            path,
            max_packet_size: self.max_packet_size,
        })
    }

    fn read(&mut self, _endpoint: &EndpointInfo, buf: &mut [u8]) -> rusb::Result<usize> {
        self.log.record(Call::Read {
            device: self.index,
            len: buf.len(),
        });
        match self.reads.pop_front() {
            Some(ScriptedRead::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(ScriptedRead::Fail(error)) => Err(error),
            None => Ok(0),
        }
    }

    fn close(&mut self) -> rusb::Result<()> {
        self.log.record(Call::CloseDevice { device: self.index });
        match self.close_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Mock USB context
///
/// Devices are listed in the order they were added. A device's index is its
/// position among all added devices, matching or not.
#[derive(Debug, Default)]
pub struct MockBackend {
    log: CallLog,
    devices: Vec<MockDevice>,
    list_error: Option<(usize, rusb::Error)>,
    close_error: Option<rusb::Error>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, mut device: MockDevice) -> Self {
        device.index = self.devices.len();
        device.log = self.log.clone();
        self.devices.push(device);
        self
    }

    /// Fail the listing after `opened` matching devices have been opened
    pub fn failing_list(mut self, opened: usize, error: rusb::Error) -> Self {
        self.list_error = Some((opened, error));
        self
    }

    pub fn failing_close(mut self, error: rusb::Error) -> Self {
        self.close_error = Some(error);
        self
    }

    /// Handle onto the shared call log
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl UsbBackend for MockBackend {
    type Device = MockDevice;

    fn list_devices(
        &mut self,
        filter: &dyn Fn(&DeviceSummary) -> bool,
    ) -> DeviceListing<MockDevice> {
        self.log.record(Call::ListDevices);

        let mut matching: Vec<MockDevice> = self
            .devices
            .iter()
            .filter(|device| filter(&device.summary))
            .cloned()
            .collect();

        match self.list_error {
            Some((opened, error)) => {
                matching.truncate(opened);
                DeviceListing::failed(matching, error)
            }
            None => DeviceListing::complete(matching),
        }
    }

    fn close(&mut self) -> rusb::Result<()> {
        self.log.record(Call::CloseContext);
        match self.close_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Build a weight report with the given raw weight
pub fn create_measurement(stability: i8, mode: i8, raw_weight: u16) -> Measurement {
    let [weight_minor, weight_major] = raw_weight.to_le_bytes();
    Measurement {
        always_three: 3,
        stability,
        mode,
        scale_factor: 0,
        weight_minor,
        weight_major,
    }
}
