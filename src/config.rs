//! Device description file
//!
//! Stored as TOML. Everything has a default matching the reference GH60
//! controller, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ukbdc_transport::protocol::device;
use ukbdc_transport::DeviceMatch;

use crate::firmware::DEFAULT_BASE_ADDRESS;
use crate::layout::{Layout, DEFAULT_BUTTON_COUNT, DEFAULT_LAYER_COUNT};

/// USB identity of the controller's configuration interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbConfig {
    #[serde(default = "default_vid")]
    pub vid: u16,
    #[serde(default = "default_pid")]
    pub pid: u16,
    /// `None` accepts any interface of the device; written as `usage_page = 0`
    #[serde(default = "default_usage_page", with = "any_usage_page")]
    pub usage_page: Option<u16>,
}

/// TOML has no null, so usage page 0 (undefined in HID) stands for "any"
mod any_usage_page {
    use super::*;

    pub fn serialize<S: Serializer>(page: &Option<u16>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u16(page.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u16>, D::Error> {
        let page = u16::deserialize(d)?;
        Ok((page != 0).then_some(page))
    }
}

fn default_vid() -> u16 {
    device::VENDOR_ID
}

fn default_pid() -> u16 {
    device::PRODUCT_ID
}

fn default_usage_page() -> Option<u16> {
    Some(device::USAGE_PAGE)
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vid: default_vid(),
            pid: default_pid(),
            usage_page: default_usage_page(),
        }
    }
}

impl UsbConfig {
    pub fn matcher(&self) -> DeviceMatch {
        DeviceMatch {
            vid: self.vid,
            pid: self.pid,
            usage_page: self.usage_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_layer_count")]
    pub layer_count: usize,
    #[serde(default = "default_button_count")]
    pub button_count: usize,
    /// Flash address the firmware reads the layout from
    #[serde(default = "default_base_address")]
    pub layout_base_address: u16,
    /// Intel HEX image the layout is embedded into
    #[serde(default = "default_base_firmware")]
    pub base_firmware: PathBuf,
    #[serde(default)]
    pub usb: UsbConfig,
}

fn default_name() -> String {
    "GH60".to_string()
}

fn default_layer_count() -> usize {
    DEFAULT_LAYER_COUNT
}

fn default_button_count() -> usize {
    DEFAULT_BUTTON_COUNT
}

fn default_base_address() -> u16 {
    DEFAULT_BASE_ADDRESS
}

fn default_base_firmware() -> PathBuf {
    PathBuf::from("base_firmware.hex")
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            layer_count: default_layer_count(),
            button_count: default_button_count(),
            layout_base_address: default_base_address(),
            base_firmware: default_base_firmware(),
            usb: UsbConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// `$XDG_CONFIG_HOME/ukbdc/device.toml` (or platform equivalent)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ukbdc")
            .join("device.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Layout::check_dimensions(self.layer_count, self.button_count)
            .with_context(|| format!("device {}", self.name))?;
        Ok(())
    }

    /// An empty layout sized for this device
    pub fn new_layout(&self) -> Layout {
        Layout::new(self.layer_count, self.button_count)
    }
}
