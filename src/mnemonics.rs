//! Scancode <-> mnemonic lookup.
//!
//! A [`Mnemonics`] table is an immutable value handed to whatever renders or
//! parses key names; nothing in the core consults a global table.

use std::collections::{BTreeMap, HashMap};

use crate::error::LayoutError;

/// USB HID usage codes with the names users type for them
const STANDARD: &[(u8, &str)] = &[
    // Letters
    (0x04, "a"),
    (0x05, "b"),
    (0x06, "c"),
    (0x07, "d"),
    (0x08, "e"),
    (0x09, "f"),
    (0x0A, "g"),
    (0x0B, "h"),
    (0x0C, "i"),
    (0x0D, "j"),
    (0x0E, "k"),
    (0x0F, "l"),
    (0x10, "m"),
    (0x11, "n"),
    (0x12, "o"),
    (0x13, "p"),
    (0x14, "q"),
    (0x15, "r"),
    (0x16, "s"),
    (0x17, "t"),
    (0x18, "u"),
    (0x19, "v"),
    (0x1A, "w"),
    (0x1B, "x"),
    (0x1C, "y"),
    (0x1D, "z"),
    // Numbers
    (0x1E, "1"),
    (0x1F, "2"),
    (0x20, "3"),
    (0x21, "4"),
    (0x22, "5"),
    (0x23, "6"),
    (0x24, "7"),
    (0x25, "8"),
    (0x26, "9"),
    (0x27, "0"),
    // Editing
    (0x28, "enter"),
    (0x29, "esc"),
    (0x2A, "backspace"),
    (0x2B, "tab"),
    (0x2C, "space"),
    // Punctuation
    (0x2D, "-"),
    (0x2E, "="),
    (0x2F, "["),
    (0x30, "]"),
    (0x31, "\\"),
    (0x32, "number"),
    (0x33, ";"),
    (0x34, "'"),
    (0x35, "`"),
    (0x36, ","),
    (0x37, "."),
    (0x38, "/"),
    (0x39, "caps_lock"),
    (0x3A, "f1"),
    // Function keys
    (0x3B, "f2"),
    (0x3C, "f3"),
    (0x3D, "f4"),
    (0x3E, "f5"),
    (0x3F, "f6"),
    (0x40, "f7"),
    (0x41, "f8"),
    (0x42, "f9"),
    (0x43, "f10"),
    (0x44, "f11"),
    (0x45, "f12"),
    // Navigation
    (0x46, "printscreen"),
    (0x47, "scroll_lock"),
    (0x48, "pause"),
    (0x49, "insert"),
    (0x4A, "home"),
    (0x4B, "page_up"),
    (0x4C, "delete"),
    (0x4D, "end"),
    (0x4E, "page_down"),
    (0x4F, "right"),
    (0x50, "left"),
    (0x51, "down"),
    (0x52, "up"),
    (0x53, "num_lock"),
    // Keypad
    (0x54, "kp_/"),
    (0x55, "kp_*"),
    (0x56, "kp_-"),
    (0x57, "kp_+"),
    (0x58, "kp_enter"),
    (0x59, "kp_1"),
    (0x5A, "kp_2"),
    (0x5B, "kp_3"),
    (0x5C, "kp_4"),
    (0x5D, "kp_5"),
    (0x5E, "kp_6"),
    (0x5F, "kp_7"),
    (0x60, "kp_8"),
    (0x61, "kp_9"),
    (0x62, "kp_0"),
    (0x63, "kp_."),
    (0x65, "application"),
    (0x68, "f13"),
    (0x69, "f14"),
    (0x6A, "f15"),
    (0x6B, "f16"),
    (0x6C, "f17"),
    (0x6D, "f18"),
    (0x6E, "f19"),
    (0x6F, "f20"),
    (0x70, "f21"),
    (0x71, "f22"),
    (0x72, "f23"),
    (0x73, "f24"),
    // Media / editing
    (0x74, "execute"),
    (0x75, "help"),
    (0x76, "menu"),
    (0x77, "select"),
    (0x78, "stop"),
    (0x79, "again"),
    (0x7A, "undo"),
    (0x7B, "cut"),
    (0x7C, "copy"),
    (0x7D, "paste"),
    (0x7E, "find"),
    (0x7F, "mute"),
    (0x80, "volume_up"),
    (0x81, "volume_down"),
    // Modifiers
    (0xE0, "lctrl"),
    (0xE1, "lshift"),
    (0xE2, "lalt"),
    (0xE3, "lgui"),
    (0xE4, "rctrl"),
    (0xE5, "rshift"),
    (0xE6, "ralt"),
    (0xE7, "rgui"),
];

/// Bidirectional scancode/name table
#[derive(Debug, Clone)]
pub struct Mnemonics {
    by_code: BTreeMap<u8, String>,
    by_name: HashMap<String, u8>,
}

impl Default for Mnemonics {
    fn default() -> Self {
        Self::standard()
    }
}

impl Mnemonics {
    /// The built-in table of common HID keyboard usages
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD.iter().map(|&(code, name)| (code, name.to_string())))
    }

    /// Build a table from `(scancode, name)` pairs; later pairs win
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u8, String)>,
    {
        let mut by_code = BTreeMap::new();
        let mut by_name = HashMap::new();
        for (code, name) in pairs {
            by_name.insert(name.clone(), code);
            by_code.insert(code, name);
        }
        Self { by_code, by_name }
    }

    pub fn name(&self, scancode: u8) -> Option<&str> {
        self.by_code.get(&scancode).map(String::as_str)
    }

    pub fn scancode(&self, name: &str) -> Option<u8> {
        self.by_name.get(name).copied()
    }

    /// Parse user input into a scancode.
    ///
    /// Accepts an empty string (no scancode), a `0x`-prefixed hex byte, or a
    /// mnemonic from this table.
    pub fn parse(&self, text: &str) -> Result<u8, LayoutError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        if let Some(hex) = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| LayoutError::InvalidScancode(text.to_string()));
        }
        self.scancode(text)
            .ok_or_else(|| LayoutError::InvalidScancode(text.to_string()))
    }

    /// Render a scancode: empty for 0, the mnemonic if known, hex otherwise
    pub fn format(&self, scancode: u8) -> String {
        if scancode == 0 {
            return String::new();
        }
        match self.name(scancode) {
            Some(name) => name.to_string(),
            None => format!("0x{scancode:02x}"),
        }
    }

    /// Mnemonics starting with `prefix`, in scancode order
    pub fn completions(&self, prefix: &str) -> Vec<&str> {
        if prefix.is_empty() {
            return Vec::new();
        }
        self.by_code
            .values()
            .filter(|name| name.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }
}
