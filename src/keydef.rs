//! Per-key definition: scancode plus press/release actions.

use crate::action::Action;
use crate::error::LayoutError;

/// What one button does on one layer.
///
/// `inherited` marks a value that was looked up through a parent layer (or
/// the all-zero default) rather than stored on the layer itself. Equality
/// ignores it.
#[derive(Debug, Clone, Copy)]
pub struct KeyDef {
    /// HID usage code; 0 means the key reports nothing
    pub scancode: u8,
    pub press: Action,
    pub release: Action,
    pub inherited: bool,
}

impl KeyDef {
    pub fn new(scancode: u8, press: Action, release: Action) -> Self {
        Self {
            scancode,
            press,
            release,
            inherited: false,
        }
    }

    /// Build from an unchecked scancode, e.g. one read from user input
    pub fn from_parts(scancode: u32, press: Action, release: Action) -> Result<Self, LayoutError> {
        let scancode = u8::try_from(scancode)
            .map_err(|_| LayoutError::InvalidScancode(format!("{scancode} (max 255)")))?;
        Ok(Self::new(scancode, press, release))
    }

    /// The "inherit from parent" marker: zero payload, `inherited = true`
    pub const fn inherited() -> Self {
        Self {
            scancode: 0,
            press: Action::NoAct,
            release: Action::NoAct,
            inherited: true,
        }
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Same payload, tagged as coming from a parent layer
    pub fn as_inherited(self) -> Self {
        Self {
            inherited: true,
            ..self
        }
    }

    /// Same payload, tagged as defined on its own layer
    pub fn as_defined(self) -> Self {
        Self {
            inherited: false,
            ..self
        }
    }

    /// No scancode and no actions
    pub fn is_empty(&self) -> bool {
        self.scancode == 0 && self.press == Action::NoAct && self.release == Action::NoAct
    }

    /// Three-byte wire record: `[scancode, press, release]`
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.scancode, self.press.to_byte(), self.release.to_byte()]
    }

    /// Decode a three-byte wire record; the result is not inherited
    pub fn from_bytes(bytes: [u8; 3]) -> Result<Self, LayoutError> {
        Ok(Self::new(
            bytes[0],
            Action::from_byte(bytes[1])?,
            Action::from_byte(bytes[2])?,
        ))
    }
}

impl Default for KeyDef {
    fn default() -> Self {
        Self::inherited()
    }
}

impl PartialEq for KeyDef {
    fn eq(&self, other: &Self) -> bool {
        self.scancode == other.scancode
            && self.press == other.press
            && self.release == other.release
    }
}

impl Eq for KeyDef {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_not_inherited() {
        let k = KeyDef::new(0x04, Action::NoAct, Action::NoAct);
        assert!(!k.is_inherited());
        assert!(!k.is_empty());
    }

    #[test]
    fn default_is_the_inherit_marker() {
        let k = KeyDef::default();
        assert!(k.is_inherited());
        assert!(k.is_empty());
        assert_eq!(k.to_bytes(), [0, 0, 0]);
    }

    #[test]
    fn equality_ignores_inherited_flag() {
        let k = KeyDef::new(0x2C, Action::Rel(1), Action::Rel(-1));
        assert_eq!(k, k.as_inherited());
        assert_ne!(k, KeyDef::new(0x2C, Action::Rel(1), Action::NoAct));
    }

    #[test]
    fn from_parts_checks_scancode() {
        assert!(KeyDef::from_parts(255, Action::NoAct, Action::NoAct).is_ok());
        assert!(matches!(
            KeyDef::from_parts(256, Action::NoAct, Action::NoAct),
            Err(LayoutError::InvalidScancode(_))
        ));
    }

    #[test]
    fn wire_record() {
        let k = KeyDef::new(0xE1, Action::Abs(2), Action::Abs(0));
        assert_eq!(k.to_bytes(), [0xE1, 0x82, 0x80]);
        let back = KeyDef::from_bytes(k.to_bytes()).unwrap();
        assert_eq!(back, k);
        assert!(!back.is_inherited());
        assert!(KeyDef::from_bytes([0x04, 0xC0, 0x00]).is_err());
    }
}
