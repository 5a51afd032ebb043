//! USB type abstractions
//!
//! The scale session never talks to libusb directly. It is written against
//! the two traits in this module, which model the small slice of a USB
//! access library it needs: list devices matching a descriptor filter, open
//! one endpoint on a device, read from it, and close things again.
//!
//! All collaborator failures are plain [`rusb::Error`] values so they can be
//! surfaced to callers unchanged.

/// USB vendor ID shared by every Dymo scale model
pub const DYMO_VENDOR_ID: u16 = 0x0922;

/// Descriptor fields a device filter can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub address: u8,
}

impl DeviceSummary {
    /// True if the device was made by Dymo
    pub fn is_dymo(&self) -> bool {
        self.vendor_id == DYMO_VENDOR_ID
    }
}

/// Configuration / interface / alternate setting / endpoint chain to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointPath {
    /// Configuration value (`bConfigurationValue`)
    pub config: u8,
    /// Interface number
    pub interface: u8,
    /// Alternate setting number
    pub setting: u8,
    /// Endpoint address, direction bit included
    pub address: u8,
}

/// An endpoint that has been opened for reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub path: EndpointPath,
    pub max_packet_size: u16,
}

/// Result of a device listing
///
/// Enumeration may fail after some matching devices were already opened.
/// Those handles are always handed back alongside the error so the caller
/// can close them.
#[derive(Debug)]
pub struct DeviceListing<D> {
    pub devices: Vec<D>,
    pub error: Option<rusb::Error>,
}

impl<D> DeviceListing<D> {
    /// Listing that finished without error
    pub fn complete(devices: Vec<D>) -> Self {
        Self {
            devices,
            error: None,
        }
    }

    /// Listing that failed, carrying whatever was opened before the failure
    pub fn failed(devices: Vec<D>, error: rusb::Error) -> Self {
        Self {
            devices,
            error: Some(error),
        }
    }
}

/// An opened USB device
pub trait ScaleDevice {
    /// Descriptor summary the device was selected by
    fn summary(&self) -> DeviceSummary;

    /// First configuration's first interface's first alternate setting's first endpoint
    fn first_endpoint(&self) -> rusb::Result<EndpointPath>;

    /// Select the configuration, claim the interface and select the setting
    fn open_endpoint(&mut self, path: EndpointPath) -> rusb::Result<EndpointInfo>;

    /// One blocking read from an opened endpoint, with no timeout
    fn read(&mut self, endpoint: &EndpointInfo, buf: &mut [u8]) -> rusb::Result<usize>;

    /// Release the device
    fn close(&mut self) -> rusb::Result<()>;
}

/// A USB context: the process-wide enumeration and session handle
pub trait UsbBackend {
    type Device: ScaleDevice;

    /// Open every device whose descriptor passes `filter`
    fn list_devices(
        &mut self,
        filter: &dyn Fn(&DeviceSummary) -> bool,
    ) -> DeviceListing<Self::Device>;

    /// Release the context
    fn close(&mut self) -> rusb::Result<()>;
}
