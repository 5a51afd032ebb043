//! libusb context and device enumeration

use crate::usb::device::RusbDevice;
use common::{DeviceListing, DeviceSummary, UsbBackend};
use rusb::{Context, Device, UsbContext};
use tracing::{debug, warn};

/// libusb-backed USB context
pub struct RusbBackend {
    /// Taken on close; dropping it exits libusb once no handle refers to it
    context: Option<Context>,
}

impl RusbBackend {
    /// Create a new libusb context
    pub fn new() -> Result<Self, rusb::Error> {
        let context = Context::new()?;
        debug!("Created libusb context");
        Ok(Self {
            context: Some(context),
        })
    }
}

impl UsbBackend for RusbBackend {
    type Device = RusbDevice;

    /// Open every device whose descriptor passes `filter`
    ///
    /// Devices whose descriptor cannot be read or that cannot be opened are
    /// skipped, but the last such error is reported alongside the devices
    /// that did open.
    fn list_devices(
        &mut self,
        filter: &dyn Fn(&DeviceSummary) -> bool,
    ) -> DeviceListing<RusbDevice> {
        let Some(context) = self.context.as_ref() else {
            return DeviceListing::failed(Vec::new(), rusb::Error::NoDevice);
        };

        let devices = match context.devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Failed to list USB devices: {}", e);
                return DeviceListing::failed(Vec::new(), e);
            }
        };

        let mut opened = Vec::new();
        let mut last_error = None;

        for device in devices.iter() {
            let summary = match summarize(&device) {
                Ok(summary) => summary,
                Err(e) => {
                    debug!(
                        "Could not read descriptor: bus={}, addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            if !filter(&summary) {
                continue;
            }

            match device.open() {
                Ok(handle) => {
                    debug!(
                        "Opened device: bus={}, addr={}, vid={:#06x}, pid={:#06x}",
                        summary.bus_number, summary.address, summary.vendor_id, summary.product_id
                    );
                    opened.push(RusbDevice::new(device, handle, summary));
                }
                Err(e) => {
                    warn!(
                        "Failed to open device {:04x}:{:04x}: {}",
                        summary.vendor_id, summary.product_id, e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => DeviceListing::failed(opened, e),
            None => DeviceListing::complete(opened),
        }
    }

    fn close(&mut self) -> rusb::Result<()> {
        if self.context.take().is_some() {
            debug!("Released libusb context");
        }
        Ok(())
    }
}

fn summarize(device: &Device<Context>) -> rusb::Result<DeviceSummary> {
    let descriptor = device.device_descriptor()?;
    Ok(DeviceSummary {
        vendor_id: descriptor.vendor_id(),
        product_id: descriptor.product_id(),
        bus_number: device.bus_number(),
        address: device.address(),
    })
}
