//! Transport layer for ukbdc keyboard controllers
//!
//! The controller exposes a vendor HID interface. Layouts are uploaded as a
//! sequence of feature reports (see [`protocol`]). Backends implement
//! [`Transport`]; [`HidTransport`] is the USB one.

pub mod error;
pub mod protocol;
pub mod types;

mod discovery;
mod hid_wired;

pub use discovery::HidDiscovery;
pub use error::TransportError;
pub use hid_wired::HidTransport;
pub use types::{DeviceMatch, DiscoveredDevice, TransportDeviceInfo};

/// The core transport trait - all backends implement this
///
/// Calls block until the report has been handed to the device. No call
/// retries on failure.
pub trait Transport: Send + Sync {
    /// Send a command without expecting a response
    ///
    /// # Arguments
    /// * `cmd` - Command byte (e.g., `protocol::cmd::LAYOUT_DATA`)
    /// * `data` - Command data (without command byte)
    fn send_command(&self, cmd: u8, data: &[u8]) -> Result<(), TransportError>;

    /// Send a command and read the device's reply
    ///
    /// # Returns
    /// Reply payload, report ID stripped: `[cmd echo, status, ...]`
    fn query_command(&self, cmd: u8, data: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Close the transport gracefully
    fn close(&self) -> Result<(), TransportError>;
}

/// Type alias for a boxed transport
pub type BoxedTransport = Box<dyn Transport>;

/// List all attached controllers matching `matcher`
pub fn list_devices(matcher: DeviceMatch) -> Result<Vec<DiscoveredDevice>, TransportError> {
    HidDiscovery::new(matcher).list_devices()
}
