//! ukbdc CLI
//!
//! Edits keyboard layouts, builds firmware images with an embedded layout and
//! programs layouts into attached controllers.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use ukbdc::{DeviceConfig, Mnemonics};

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ukbdc=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(DeviceConfig::default_path);
    let config = DeviceConfig::load(&config_path)?;
    debug!(path = %config_path.display(), device = %config.name, "Loaded device config");

    match cli.command {
        // === Layout Editing ===
        Commands::New { file, force } => {
            commands::layout::new(&file, force, &config)?;
        }
        Commands::Show { file, layer, all } => {
            commands::layout::show(&file, layer, all, &config)?;
        }
        Commands::Set {
            file,
            layer,
            button,
            scancode,
            press,
            release,
        } => {
            let key =
                commands::layout::parse_key(&Mnemonics::standard(), &scancode, &press, &release)?;
            commands::layout::set(&file, layer, button, &key, &config)?;
        }
        Commands::Inherit {
            file,
            layer,
            button,
        } => {
            commands::layout::inherit(&file, layer, button, &config)?;
        }
        Commands::SetParent {
            file,
            layer,
            parent,
        } => {
            let parent = commands::layout::parse_parent(&parent)?;
            commands::layout::set_parent(&file, layer, parent, &config)?;
        }
        Commands::InheritAll { file, layer } => {
            commands::layout::inherit_all(&file, layer, &config)?;
        }
        Commands::Mnemonics { prefix } => {
            commands::layout::mnemonics(prefix.as_deref())?;
        }

        // === Conversion ===
        Commands::Export { file, output } => {
            commands::firmware::export(&file, &output, &config)?;
        }
        Commands::Import { input, output } => {
            commands::firmware::import(&input, &output, &config)?;
        }

        // === Firmware / Device ===
        Commands::Generate {
            file,
            output,
            base,
            address,
        } => {
            commands::firmware::generate(&file, &output, base.as_deref(), address, &config)?;
        }
        Commands::Program { file, dry_run } => {
            commands::device::program(&file, dry_run, &config)?;
        }
        Commands::List => {
            commands::device::list(&config)?;
        }
    }

    Ok(())
}
