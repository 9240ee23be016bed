//! Common types for transport layer

use crate::protocol::device;

/// Device identification information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Device path or identifier (transport-specific)
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

impl TransportDeviceInfo {
    /// Short `vid:pid path` description for logs and listings
    pub fn describe(&self) -> String {
        format!(
            "{:04x}:{:04x} {}{}",
            self.vid,
            self.pid,
            self.device_path,
            self.product_name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default()
        )
    }
}

/// Which HID interfaces count as a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMatch {
    pub vid: u16,
    pub pid: u16,
    /// Restrict to one usage page (the configuration interface)
    pub usage_page: Option<u16>,
}

impl Default for DeviceMatch {
    fn default() -> Self {
        Self {
            vid: device::VENDOR_ID,
            pid: device::PRODUCT_ID,
            usage_page: Some(device::USAGE_PAGE),
        }
    }
}

impl DeviceMatch {
    /// Check a HID interface against this filter
    pub fn matches(&self, vid: u16, pid: u16, usage_page: u16) -> bool {
        vid == self.vid
            && pid == self.pid
            && self.usage_page.map_or(true, |page| page == usage_page)
    }
}

/// A controller found during discovery
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub info: TransportDeviceInfo,
}
