//! Conversion and firmware generation command handlers.

use std::path::Path;

use anyhow::Context;
use ukbdc::{firmware, DeviceConfig};

use super::{load_layout, CommandResult};

/// Write the resolved layout as a `.lay` blob
pub fn export(file: &Path, output: &Path, config: &DeviceConfig) -> CommandResult {
    let layout = load_layout(file, config)?;
    ukbdc::write_lay_file(output, &layout)?;
    println!("Wrote {} ({} bytes)", output.display(), layout.blob_len());
    Ok(())
}

/// Read a `.lay` blob into a JSON document
pub fn import(input: &Path, output: &Path, config: &DeviceConfig) -> CommandResult {
    let layout = ukbdc::read_lay_file(input, config.layer_count, config.button_count)
        .with_context(|| format!("reading {}", input.display()))?;
    ukbdc::write_document(output, &layout)?;
    println!(
        "Imported {} -> {} ({} keys)",
        input.display(),
        output.display(),
        layout.defined_entries().count()
    );
    Ok(())
}

/// Embed the layout into the base firmware and write the new image
pub fn generate(
    file: &Path,
    output: &Path,
    base: Option<&Path>,
    address: Option<u16>,
    config: &DeviceConfig,
) -> CommandResult {
    let layout = load_layout(file, config)?;
    let blob = ukbdc::to_binary(&layout)?;
    let base = base.unwrap_or(config.base_firmware.as_path());
    let address = address.unwrap_or(config.layout_base_address);

    let image = firmware::embed_firmware_file(base, &blob, address)?;
    std::fs::write(output, image).with_context(|| format!("writing {}", output.display()))?;

    println!("Firmware Image");
    println!("==============");
    println!("Base:       {}", base.display());
    println!("Address:    0x{address:04X}");
    println!("Layout:     {} bytes", blob.len());
    println!(
        "Records:    {}",
        blob.len().div_ceil(firmware::RECORD_DATA_LEN)
    );
    println!("Output:     {}", output.display());
    Ok(())
}
