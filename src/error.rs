//! Layout and session error types

use thiserror::Error;
use ukbdc_transport::TransportError;

use crate::action::ActionKind;

/// Errors from building, resolving and (de)serializing layouts
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Action argument outside the range legal for its kind
    #[error("Invalid action: {kind} does not accept argument {arg}")]
    InvalidAction { kind: ActionKind, arg: i32 },

    /// Action text that is not `none`, `rel:N` or `abs:N`
    #[error("Cannot parse action: {0:?}")]
    ParseAction(String),

    /// Action byte with the reserved kind bits
    #[error("Malformed action byte 0x{0:02X}")]
    MalformedAction(u8),

    /// Scancode text or number that is not a byte / known mnemonic
    #[error("Invalid scancode: {0}")]
    InvalidScancode(String),

    /// Parent pointer that would break the inheritance invariants
    #[error("Invalid parent {parent} for layer {layer}: {reason}")]
    InvalidParent {
        layer: usize,
        parent: usize,
        reason: &'static str,
    },

    /// Parent chain revisits a layer
    #[error("Cyclic inheritance starting at layer {0}")]
    CyclicInheritance(usize),

    #[error("Layer {layer} out of range (layout has {count} layers)")]
    LayerOutOfRange { layer: usize, count: usize },

    #[error("Button {button} out of range (layout has {count} buttons)")]
    ButtonOutOfRange { button: usize, count: usize },

    /// Layer or button count that is zero or above the supported maximum
    #[error("Invalid layout dimensions: {layers} layers x {buttons} buttons")]
    InvalidDimensions { layers: usize, buttons: usize },

    /// Blob length does not match `layer_count * button_count * 3`
    #[error("Truncated layout data: expected {expected} bytes, got {actual}")]
    TruncatedData { expected: usize, actual: usize },

    /// Layout document could not be parsed or does not fit the device
    #[error("Layout document error: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        LayoutError::Document(e.to_string())
    }
}

/// Errors from a device programming session
#[derive(Error, Debug)]
pub enum SessionError {
    /// No controller is attached
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The controller exists but the device node is not accessible
    #[error("Permission denied opening device: {0}")]
    DevicePermission(String),

    /// I/O failure while talking to the controller
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session was closed before or during the operation
    #[error("Session closed")]
    Closed,
}

impl SessionError {
    /// Map errors raised while acquiring the device
    pub(crate) fn from_open(e: TransportError) -> Self {
        match e {
            TransportError::DeviceNotFound(msg) => SessionError::DeviceNotFound(msg),
            TransportError::PermissionDenied(msg) => SessionError::DevicePermission(msg),
            other => SessionError::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_errors_are_classified() {
        assert!(matches!(
            SessionError::from_open(TransportError::DeviceNotFound("none".into())),
            SessionError::DeviceNotFound(_)
        ));
        assert!(matches!(
            SessionError::from_open(TransportError::PermissionDenied("/dev/hidraw0".into())),
            SessionError::DevicePermission(_)
        ));
        assert!(matches!(
            SessionError::from_open(TransportError::Timeout),
            SessionError::Transport(TransportError::Timeout)
        ));
    }

    #[test]
    fn messages() {
        let e = LayoutError::InvalidAction {
            kind: ActionKind::Rel,
            arg: 17,
        };
        assert_eq!(
            e.to_string(),
            "Invalid action: rel does not accept argument 17"
        );
        let e = LayoutError::TruncatedData {
            expected: 2928,
            actual: 2927,
        };
        assert_eq!(
            e.to_string(),
            "Truncated layout data: expected 2928 bytes, got 2927"
        );
    }
}
