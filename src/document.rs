//! JSON layout documents.
//!
//! Unlike the `.lay` blob, a document keeps the editing structure: only
//! defined entries are stored and parent pointers survive the round trip.
//!
//! ```json
//! {
//!   "layer_count": 16,
//!   "button_count": 61,
//!   "parents": [null, 0, null, ...],
//!   "keys": [
//!     { "layer": 0, "button": 10, "scancode": 4, "press": "none", "release": "none" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::error::LayoutError;
use crate::keydef::KeyDef;
use crate::layout::Layout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub layer: usize,
    pub button: usize,
    pub scancode: u8,
    #[serde(default)]
    pub press: Action,
    #[serde(default)]
    pub release: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub layer_count: usize,
    pub button_count: usize,
    #[serde(default)]
    pub parents: Vec<Option<usize>>,
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
}

impl LayoutDocument {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            layer_count: layout.layer_count(),
            button_count: layout.button_count(),
            parents: layout.parents().to_vec(),
            keys: layout
                .defined_entries()
                .map(|(layer, button, key)| KeyEntry {
                    layer,
                    button,
                    scancode: key.scancode,
                    press: key.press,
                    release: key.release,
                })
                .collect(),
        }
    }

    /// Rebuild the layout, checking every parent and coordinate.
    ///
    /// Parents are applied through [`Layout::set_parent`], so a document
    /// describing a cycle is rejected.
    pub fn to_layout(&self) -> Result<Layout, LayoutError> {
        Layout::check_dimensions(self.layer_count, self.button_count)?;
        if !self.parents.is_empty() && self.parents.len() != self.layer_count {
            return Err(LayoutError::Document(format!(
                "{} parent entries for {} layers",
                self.parents.len(),
                self.layer_count
            )));
        }

        let mut layout = Layout::new(self.layer_count, self.button_count);
        for entry in &self.keys {
            layout.set(
                entry.layer,
                entry.button,
                Some(KeyDef::new(entry.scancode, entry.press, entry.release)),
            )?;
        }
        for (layer, parent) in self.parents.iter().enumerate() {
            layout.set_parent(layer, *parent)?;
        }
        Ok(layout)
    }
}

pub fn read_document(path: impl AsRef<Path>) -> Result<Layout, LayoutError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let doc: LayoutDocument = serde_json::from_str(&text)?;
    debug!(path = %path.display(), keys = doc.keys.len(), "Read layout document");
    doc.to_layout()
}

pub fn write_document(path: impl AsRef<Path>, layout: &Layout) -> Result<(), LayoutError> {
    let path = path.as_ref();
    let doc = LayoutDocument::from_layout(layout);
    let mut text = serde_json::to_string_pretty(&doc)?;
    text.push('\n');
    fs::write(path, text)?;
    debug!(path = %path.display(), keys = doc.keys.len(), "Wrote layout document");
    Ok(())
}
