//! Command handlers for the CLI application.
//!
//! - `layout`: editing commands (new, show, set, inherit, set-parent, ...)
//! - `firmware`: conversion and firmware generation (export, import, generate)
//! - `device`: talking to a controller (program, list)

pub mod device;
pub mod firmware;
pub mod layout;

use std::path::Path;

use anyhow::{bail, Context};
use ukbdc::{DeviceConfig, Layout};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

fn is_blob(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lay"))
}

/// Load a layout file, `.lay` blob or JSON document
pub fn load_layout(path: &Path, config: &DeviceConfig) -> anyhow::Result<Layout> {
    let layout = if is_blob(path) {
        ukbdc::read_lay_file(path, config.layer_count, config.button_count)?
    } else {
        ukbdc::read_document(path)?
    };
    if layout.layer_count() != config.layer_count || layout.button_count() != config.button_count
    {
        bail!(
            "{} is {}x{}, device {} expects {}x{}",
            path.display(),
            layout.layer_count(),
            layout.button_count(),
            config.name,
            config.layer_count,
            config.button_count
        );
    }
    Ok(layout)
}

/// Save a layout file, `.lay` blob or JSON document
pub fn save_layout(path: &Path, layout: &Layout) -> CommandResult {
    if is_blob(path) {
        ukbdc::write_lay_file(path, layout)?;
    } else {
        ukbdc::write_document(path, layout)?;
    }
    Ok(())
}

/// Inheritance only survives in a JSON document; a `.lay` blob is flattened
pub fn require_document(path: &Path) -> CommandResult {
    if is_blob(path) {
        bail!(
            "layer inheritance cannot be stored in {} (a .lay blob is flattened); \
             use a .json document",
            path.display()
        );
    }
    Ok(())
}

/// Load, change and save a layout file
pub fn edit_layout<F>(path: &Path, config: &DeviceConfig, f: F) -> CommandResult
where
    F: FnOnce(&mut Layout) -> anyhow::Result<()>,
{
    let mut layout =
        load_layout(path, config).with_context(|| format!("loading {}", path.display()))?;
    f(&mut layout)?;
    save_layout(path, &layout).with_context(|| format!("saving {}", path.display()))
}
