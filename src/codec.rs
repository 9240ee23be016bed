//! Flat binary form of a layout and `.lay` file I/O.
//!
//! The blob is every slot resolved, layer-major then button-minor, three
//! bytes each (`[scancode, press, release]`). It carries no header, so the
//! reader must know the dimensions.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::LayoutError;
use crate::keydef::KeyDef;
use crate::layout::{Layout, RECORD_SIZE};

/// Serialize the resolved layout
pub fn to_binary(layout: &Layout) -> Result<Vec<u8>, LayoutError> {
    let mut blob = Vec::with_capacity(layout.blob_len());
    for layer in 0..layout.layer_count() {
        for button in 0..layout.button_count() {
            blob.extend_from_slice(&layout.resolve(layer, button)?.to_bytes());
        }
    }
    Ok(blob)
}

/// Rebuild a layout from a blob.
///
/// Every slot of the result is defined and every parent is `None`.
pub fn from_binary(
    bytes: &[u8],
    layer_count: usize,
    button_count: usize,
) -> Result<Layout, LayoutError> {
    Layout::check_dimensions(layer_count, button_count)?;
    let mut layout = Layout::new(layer_count, button_count);
    let expected = layout.blob_len();
    if bytes.len() != expected {
        return Err(LayoutError::TruncatedData {
            expected,
            actual: bytes.len(),
        });
    }

    for (index, record) in bytes.chunks_exact(RECORD_SIZE).enumerate() {
        let key = KeyDef::from_bytes([record[0], record[1], record[2]])?;
        layout.set(index / button_count, index % button_count, Some(key))?;
    }
    Ok(layout)
}

/// Write the blob to a `.lay` file
pub fn write_lay_file(path: impl AsRef<Path>, layout: &Layout) -> Result<(), LayoutError> {
    let path = path.as_ref();
    let blob = to_binary(layout)?;
    fs::write(path, &blob)?;
    debug!(path = %path.display(), bytes = blob.len(), "Wrote layout file");
    Ok(())
}

pub fn read_lay_file(
    path: impl AsRef<Path>,
    layer_count: usize,
    button_count: usize,
) -> Result<Layout, LayoutError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read layout file");
    from_binary(&bytes, layer_count, button_count)
}
