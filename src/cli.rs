// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ukbdc")]
#[command(author, version, about = "Layout editor and programmer for ukbdc keyboard controllers")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Device description file (default: $XDG_CONFIG_HOME/ukbdc/device.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Layout files ending in `.lay` are raw blobs; anything else is a JSON
/// document that keeps layer parents.
#[derive(Subcommand)]
pub enum Commands {
    // === Layout Editing ===
    /// Create an empty layout sized for the configured device
    New {
        /// Output layout file
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the resolved keys of one layer or all layers
    #[command(visible_aliases = ["print", "p"])]
    Show {
        file: PathBuf,
        /// Only this layer
        #[arg(short, long)]
        layer: Option<usize>,
        /// Include keys that resolve to nothing
        #[arg(short, long)]
        all: bool,
    },

    /// Define one key on one layer
    Set {
        file: PathBuf,
        layer: usize,
        button: usize,
        /// Mnemonic (e.g. 'a', 'lshift'), hex (0x04) or empty
        scancode: String,
        /// Action on press: none, rel:+N, rel:-N, abs:N
        #[arg(long, default_value = "none", allow_hyphen_values = true)]
        press: String,
        /// Action on release: none, rel:+N, rel:-N, abs:N
        #[arg(long, default_value = "none", allow_hyphen_values = true)]
        release: String,
    },

    /// Make one key inherit from the parent layer again
    Inherit {
        file: PathBuf,
        layer: usize,
        button: usize,
    },

    /// Set or clear the parent of a layer
    #[command(visible_alias = "parent")]
    SetParent {
        file: PathBuf,
        layer: usize,
        /// Parent layer, or 'none'
        parent: String,
    },

    /// Clear every key defined on a layer
    InheritAll { file: PathBuf, layer: usize },

    /// List mnemonics, optionally only those starting with a prefix
    #[command(visible_alias = "keys")]
    Mnemonics { prefix: Option<String> },

    // === Conversion ===
    /// Write the resolved layout as a .lay blob
    Export {
        file: PathBuf,
        /// Output .lay file
        output: PathBuf,
    },

    /// Read a .lay blob into a JSON layout document
    Import {
        /// Input .lay file
        input: PathBuf,
        /// Output layout document
        output: PathBuf,
    },

    // === Firmware / Device ===
    /// Embed the layout into the base firmware image (Intel HEX)
    #[command(visible_alias = "gen")]
    Generate {
        file: PathBuf,
        /// Output .hex file
        #[arg(short, long)]
        output: PathBuf,
        /// Base firmware image (overrides the device config)
        #[arg(short, long)]
        base: Option<PathBuf>,
        /// Layout flash address, e.g. 0x2700 (overrides the device config)
        #[arg(long, value_parser = parse_u16)]
        address: Option<u16>,
    },

    /// Upload the layout to an attached controller
    #[command(visible_alias = "flash")]
    Program {
        file: PathBuf,
        /// Only print what would be sent
        #[arg(long)]
        dry_run: bool,
    },

    /// List attached controllers
    #[command(visible_alias = "ls")]
    List,
}

/// Parse a decimal or `0x`-prefixed hex number
pub fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}
