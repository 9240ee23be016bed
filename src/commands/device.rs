//! Device command handlers.

use std::io::Write;
use std::path::Path;

use ukbdc::session::{self, ProgramPhase, ProgramProgress};
use ukbdc::{DeviceConfig, SessionError};
use ukbdc_transport::protocol;

use super::{load_layout, CommandResult};

/// Prints phases and a percentage line to the terminal
struct CliProgress {
    last_percent: usize,
}

impl ProgramProgress for CliProgress {
    fn on_phase(&mut self, phase: &ProgramPhase) {
        println!("{phase}...");
    }

    fn on_chunk(&mut self, sent: usize, total: usize) {
        let percent = if total == 0 { 100 } else { sent * 100 / total };
        if percent != self.last_percent {
            self.last_percent = percent;
            print!("\r  {percent:>3}% ({sent}/{total} bytes)");
            let _ = std::io::stdout().flush();
        }
        if sent == total {
            println!();
        }
    }

    fn on_error(&mut self, error: &SessionError) {
        eprintln!("\nError: {error}");
        if matches!(error, SessionError::DevicePermission(_)) {
            eprintln!("Check the udev rules for the controller's hidraw node.");
        }
    }

    fn on_complete(&mut self) {
        println!("Layout programmed successfully.");
    }
}

/// Upload a layout to the attached controller
pub fn program(file: &Path, dry_run: bool, config: &DeviceConfig) -> CommandResult {
    let layout = load_layout(file, config)?;
    let blob = ukbdc::to_binary(&layout)?;

    if dry_run {
        println!("Layout:     {} bytes", blob.len());
        println!(
            "Reports:    {} data + begin/end",
            blob.len().div_ceil(protocol::DATA_CHUNK_SIZE)
        );
        println!("Checksum:   0x{:04X}", protocol::layout_checksum(&blob));
        return Ok(());
    }

    let mut progress = CliProgress { last_percent: 0 };
    session::program_device_with_progress(&config.usb, &blob, &mut progress)?;
    Ok(())
}

/// List attached controllers
pub fn list(config: &DeviceConfig) -> CommandResult {
    let devices = ukbdc_transport::list_devices(config.usb.matcher())?;
    if devices.is_empty() {
        println!(
            "No controllers found (looking for {:04x}:{:04x})",
            config.usb.vid, config.usb.pid
        );
        return Ok(());
    }
    for device in devices {
        let serial = device.info.serial.as_deref().unwrap_or("-");
        println!("{}  serial={serial}", device.info.describe());
    }
    Ok(())
}
