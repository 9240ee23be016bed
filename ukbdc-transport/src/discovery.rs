//! Device discovery for ukbdc controllers

use std::ffi::CString;

use hidapi::HidApi;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::hid_wired::HidTransport;
use crate::types::{DeviceMatch, DiscoveredDevice, TransportDeviceInfo};

/// HID device discovery
#[derive(Debug, Clone, Default)]
pub struct HidDiscovery {
    matcher: DeviceMatch,
}

impl HidDiscovery {
    pub fn new(matcher: DeviceMatch) -> Self {
        Self { matcher }
    }

    /// The filter used to recognise controllers
    pub fn matcher(&self) -> &DeviceMatch {
        &self.matcher
    }

    /// List currently attached controllers
    pub fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        let api = HidApi::new()?;
        let mut devices = Vec::new();

        for device_info in api.device_list() {
            let (vid, pid) = (device_info.vendor_id(), device_info.product_id());
            if !self
                .matcher
                .matches(vid, pid, device_info.usage_page())
            {
                continue;
            }

            let info = TransportDeviceInfo {
                vid,
                pid,
                device_path: device_info.path().to_string_lossy().to_string(),
                serial: device_info.serial_number().map(|s| s.to_string()),
                product_name: device_info.product_string().map(|s| s.to_string()),
            };
            debug!("Found device: {}", info.describe());
            devices.push(DiscoveredDevice { info });
        }

        Ok(devices)
    }

    /// Open a specific device
    pub fn open_device(&self, device: &DiscoveredDevice) -> Result<HidTransport, TransportError> {
        let api = HidApi::new()?;
        let path = CString::new(device.info.device_path.clone())
            .map_err(|e| TransportError::DeviceNotFound(e.to_string()))?;
        let hid = api.open_path(path.as_c_str())?;
        info!("Opened {}", device.info.describe());
        Ok(HidTransport::new(hid, device.info.clone()))
    }

    /// Open the first matching controller
    pub fn open_first(&self) -> Result<HidTransport, TransportError> {
        let devices = self.list_devices()?;
        let first = devices.first().ok_or_else(|| {
            TransportError::DeviceNotFound(format!(
                "No controller with id {:04x}:{:04x}",
                self.matcher.vid, self.matcher.pid
            ))
        })?;
        self.open_device(first)
    }
}
