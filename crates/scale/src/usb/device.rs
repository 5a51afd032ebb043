//! libusb device wrapper
//!
//! Wraps an opened rusb device handle and maps the endpoint chain of its
//! descriptors onto [`EndpointPath`] / [`EndpointInfo`].

use common::{DeviceSummary, EndpointInfo, EndpointPath, ScaleDevice};
use rusb::{Context, Device, DeviceHandle, TransferType};
use std::time::Duration;
use tracing::{debug, warn};

/// libusb treats a zero timeout as "wait forever"
const NO_TIMEOUT: Duration = Duration::ZERO;

/// Direction bit of an endpoint address
const ENDPOINT_DIR_IN: u8 = 0x80;

/// Opened USB device
pub struct RusbDevice {
    /// Underlying rusb device
    device: Device<Context>,
    /// Device handle; taken on close
    handle: Option<DeviceHandle<Context>>,
    /// Cached descriptor summary
    summary: DeviceSummary,
    /// Interface claimed by `open_endpoint`
    claimed_interface: Option<u8>,
    /// Transfer type of the opened endpoint
    transfer_type: Option<TransferType>,
}

impl RusbDevice {
    pub(crate) fn new(
        device: Device<Context>,
        handle: DeviceHandle<Context>,
        summary: DeviceSummary,
    ) -> Self {
        Self {
            device,
            handle: Some(handle),
            summary,
            claimed_interface: None,
            transfer_type: None,
        }
    }

    /// Look up max packet size and transfer type of the endpoint at `path`
    fn endpoint_descriptor(&self, path: EndpointPath) -> rusb::Result<(u16, TransferType)> {
        let descriptor = self.device.device_descriptor()?;

        for index in 0..descriptor.num_configurations() {
            let config = self.device.config_descriptor(index)?;
            if config.number() != path.config {
                continue;
            }

            for interface in config.interfaces() {
                if interface.number() != path.interface {
                    continue;
                }
                for setting in interface.descriptors() {
                    if setting.setting_number() != path.setting {
                        continue;
                    }
                    for endpoint in setting.endpoint_descriptors() {
                        if endpoint.address() == path.address {
                            return Ok((endpoint.max_packet_size(), endpoint.transfer_type()));
                        }
                    }
                }
            }
        }

        Err(rusb::Error::NotFound)
    }
}

impl ScaleDevice for RusbDevice {
    fn summary(&self) -> DeviceSummary {
        self.summary
    }

    fn first_endpoint(&self) -> rusb::Result<EndpointPath> {
        let config = self.device.config_descriptor(0)?;
        let interface = config.interfaces().next().ok_or(rusb::Error::NotFound)?;
        let setting = interface.descriptors().next().ok_or(rusb::Error::NotFound)?;
        let endpoint = setting
            .endpoint_descriptors()
            .next()
            .ok_or(rusb::Error::NotFound)?;

        Ok(EndpointPath {
            config: config.number(),
            interface: interface.number(),
            setting: setting.setting_number(),
            address: endpoint.address(),
        })
    }

    /// Open the endpoint at `path`
    ///
    /// Kernel drivers (usbhid, for a scale) are detached automatically where
    /// the platform supports it, and reattached when the interface is
    /// released on close.
    fn open_endpoint(&mut self, path: EndpointPath) -> rusb::Result<EndpointInfo> {
        let (max_packet_size, transfer_type) = self.endpoint_descriptor(path)?;
        let handle = self.handle.as_mut().ok_or(rusb::Error::NoDevice)?;

        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", e);
        }

        if handle.active_configuration()? != path.config {
            handle.set_active_configuration(path.config)?;
        }

        handle.claim_interface(path.interface)?;
        self.claimed_interface = Some(path.interface);
        debug!(
            "Claimed interface {} on device {:04x}:{:04x}",
            path.interface, self.summary.vendor_id, self.summary.product_id
        );

        handle.set_alternate_setting(path.interface, path.setting)?;
        self.transfer_type = Some(transfer_type);

        Ok(EndpointInfo {
            path,
            max_packet_size,
        })
    }

    fn read(&mut self, endpoint: &EndpointInfo, buf: &mut [u8]) -> rusb::Result<usize> {
        let handle = self.handle.as_ref().ok_or(rusb::Error::NoDevice)?;
        let address = endpoint.path.address;

        if address & ENDPOINT_DIR_IN == 0 {
            warn!("Endpoint {:#04x} is not an IN endpoint", address);
            return Err(rusb::Error::InvalidParam);
        }

        match self.transfer_type {
            Some(TransferType::Bulk) => handle.read_bulk(address, buf, NO_TIMEOUT),
            _ => handle.read_interrupt(address, buf, NO_TIMEOUT),
        }
    }

    /// Release the claimed interface and drop the handle
    ///
    /// The handle is dropped even when releasing the interface fails.
    fn close(&mut self) -> rusb::Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let result = match self.claimed_interface.take() {
            Some(interface) => handle.release_interface(interface),
            None => Ok(()),
        };
        drop(handle);

        debug!(
            "Closed device {:04x}:{:04x}",
            self.summary.vendor_id, self.summary.product_id
        );
        result
    }
}
