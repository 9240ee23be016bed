//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("HID permission denied: {0}")]
    PermissionDenied(String),

    #[error("HID error: {0}")]
    HidError(String),

    #[error("Communication timeout")]
    Timeout,

    #[error("Invalid response: expected cmd 0x{expected:02X}, got 0x{actual:02X}")]
    InvalidResponse { expected: u8, actual: u8 },

    #[error("Device rejected cmd 0x{cmd:02X} with status 0x{status:02X}")]
    Rejected { cmd: u8, status: u8 },

    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// The device handle was already released
    #[error("Device closed")]
    Closed,
}

impl TransportError {
    /// Whether this error came from the OS refusing access to the device node
    pub fn is_permission(&self) -> bool {
        matches!(self, TransportError::PermissionDenied(_))
    }
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") || msg.contains("EACCES") {
            TransportError::PermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_command_bytes() {
        let e = TransportError::Rejected {
            cmd: 0x12,
            status: 0x55,
        };
        assert_eq!(e.to_string(), "Device rejected cmd 0x12 with status 0x55");

        let e = TransportError::InvalidResponse {
            expected: 0x10,
            actual: 0x00,
        };
        assert_eq!(
            e.to_string(),
            "Invalid response: expected cmd 0x10, got 0x00"
        );
    }

    #[test]
    fn permission_classification() {
        assert!(TransportError::PermissionDenied("x".into()).is_permission());
        assert!(!TransportError::Timeout.is_permission());
    }
}
