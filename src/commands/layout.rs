//! Layout editing command handlers.

use std::path::Path;

use anyhow::bail;
use ukbdc::{Action, DeviceConfig, KeyDef, Layout, Mnemonics};

use super::{edit_layout, load_layout, require_document, save_layout, CommandResult};

/// Create an empty layout
pub fn new(file: &Path, force: bool, config: &DeviceConfig) -> CommandResult {
    if file.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", file.display());
    }
    let layout = config.new_layout();
    save_layout(file, &layout)?;
    println!(
        "Created {} ({} layers x {} buttons for {})",
        file.display(),
        layout.layer_count(),
        layout.button_count(),
        config.name
    );
    Ok(())
}

fn print_layer(layout: &Layout, layer: usize, all: bool, mnemonics: &Mnemonics) -> CommandResult {
    let parent = match layout.get_parent(layer)? {
        Some(p) => format!("inherits from {p}"),
        None => "no parent".to_string(),
    };
    println!("Layer {layer} ({parent})");

    let mut shown = 0;
    for button in 0..layout.button_count() {
        let key = layout.resolve(layer, button)?;
        if key.is_empty() && !all {
            continue;
        }
        let name = mnemonics.format(key.scancode);
        let marker = if key.is_inherited() { "*" } else { " " };
        println!(
            "  {button:>3}{marker} {:<12} press={:<7} release={}",
            if name.is_empty() { "-" } else { name.as_str() },
            key.press,
            key.release
        );
        shown += 1;
    }
    if shown == 0 {
        println!("  (empty)");
    }
    Ok(())
}

/// Print resolved keys, `*` marking inherited ones
pub fn show(file: &Path, layer: Option<usize>, all: bool, config: &DeviceConfig) -> CommandResult {
    let layout = load_layout(file, config)?;
    let mnemonics = Mnemonics::standard();
    match layer {
        Some(layer) => print_layer(&layout, layer, all, &mnemonics)?,
        None => {
            for layer in 0..layout.layer_count() {
                print_layer(&layout, layer, all, &mnemonics)?;
            }
        }
    }
    Ok(())
}

/// Parse the text fields of a key definition
pub fn parse_key(
    mnemonics: &Mnemonics,
    scancode: &str,
    press: &str,
    release: &str,
) -> anyhow::Result<KeyDef> {
    let scancode = mnemonics.parse(scancode).map_err(|e| {
        let hints = mnemonics.completions(scancode.trim());
        if hints.is_empty() {
            anyhow::Error::new(e)
        } else {
            anyhow::Error::new(e).context(format!("did you mean one of: {}", hints.join(", ")))
        }
    })?;
    let press: Action = press.parse()?;
    let release: Action = release.parse()?;
    Ok(KeyDef::new(scancode, press, release))
}

pub fn set(
    file: &Path,
    layer: usize,
    button: usize,
    key: &KeyDef,
    config: &DeviceConfig,
) -> CommandResult {
    edit_layout(file, config, |layout| {
        layout.set(layer, button, Some(*key))?;
        Ok(())
    })?;
    println!(
        "Layer {layer} button {button}: {} press={} release={}",
        Mnemonics::standard().format(key.scancode),
        key.press,
        key.release
    );
    Ok(())
}

pub fn inherit(file: &Path, layer: usize, button: usize, config: &DeviceConfig) -> CommandResult {
    require_document(file)?;
    edit_layout(file, config, |layout| {
        layout.set(layer, button, None)?;
        Ok(())
    })?;
    println!("Layer {layer} button {button} now inherits");
    Ok(())
}

/// Parse a parent argument: a layer number or `none`
pub fn parse_parent(text: &str) -> anyhow::Result<Option<usize>> {
    match text.trim().to_ascii_lowercase().as_str() {
        "none" | "-" | "" => Ok(None),
        n => Ok(Some(n.parse()?)),
    }
}

pub fn set_parent(
    file: &Path,
    layer: usize,
    parent: Option<usize>,
    config: &DeviceConfig,
) -> CommandResult {
    require_document(file)?;
    edit_layout(file, config, |layout| {
        layout.set_parent(layer, parent)?;
        Ok(())
    })?;
    match parent {
        Some(p) => println!("Layer {layer} inherits from layer {p}"),
        None => println!("Layer {layer} has no parent"),
    }
    Ok(())
}

pub fn inherit_all(file: &Path, layer: usize, config: &DeviceConfig) -> CommandResult {
    require_document(file)?;
    edit_layout(file, config, |layout| {
        layout.inherit_all(layer)?;
        Ok(())
    })?;
    println!("Cleared every key on layer {layer}");
    Ok(())
}

/// List mnemonics with their scancodes
pub fn mnemonics(prefix: Option<&str>) -> CommandResult {
    let table = Mnemonics::standard();
    let names: Vec<&str> = match prefix {
        Some(prefix) => table.completions(prefix),
        None => (0..=u8::MAX).filter_map(|code| table.name(code)).collect(),
    };
    for name in names {
        if let Some(code) = table.scancode(name) {
            println!("0x{code:02x}  {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_fields() {
        let m = Mnemonics::standard();
        let key = parse_key(&m, "lshift", "abs:1", "abs:0").unwrap();
        assert_eq!(key, KeyDef::new(0xE1, Action::Abs(1), Action::Abs(0)));
        assert!(parse_key(&m, "lshif", "none", "none").is_err());
        assert!(parse_key(&m, "a", "rel:+99", "none").is_err());
    }

    #[test]
    fn parent_argument() {
        assert_eq!(parse_parent("none").unwrap(), None);
        assert_eq!(parse_parent("3").unwrap(), Some(3));
        assert!(parse_parent("x").is_err());
    }

    #[test]
    fn inheritance_edits_refuse_lay_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeviceConfig::default();
        let blob = dir.path().join("gh60.lay");
        new(&blob, false, &config).unwrap();
        let before = std::fs::read(&blob).unwrap();

        assert!(set_parent(&blob, 1, Some(0), &config).is_err());
        assert!(inherit(&blob, 1, 0, &config).is_err());
        assert!(inherit_all(&blob, 1, &config).is_err());
        assert_eq!(std::fs::read(&blob).unwrap(), before);

        // Plain key edits still work on a blob
        let key = KeyDef::new(0x04, Action::NoAct, Action::NoAct);
        set(&blob, 0, 0, &key, &config).unwrap();
        assert_eq!(load_layout(&blob, &config).unwrap().resolve(0, 0).unwrap(), key);
    }

    #[test]
    fn inheritance_edits_persist_in_documents() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeviceConfig::default();
        let doc = dir.path().join("gh60.json");
        new(&doc, false, &config).unwrap();

        set_parent(&doc, 1, Some(0), &config).unwrap();
        assert_eq!(load_layout(&doc, &config).unwrap().get_parent(1).unwrap(), Some(0));
    }
}
