// ukbdc - keyboard controller layout library
// Layout model, binary codec, firmware embedding and device programming

pub mod action;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod firmware;
pub mod keydef;
pub mod layout;
pub mod mnemonics;
pub mod session;

pub use action::{Action, ActionKind};
pub use codec::{from_binary, read_lay_file, to_binary, write_lay_file};
pub use config::{DeviceConfig, UsbConfig};
pub use document::{read_document, write_document, LayoutDocument};
pub use error::{LayoutError, SessionError};
pub use firmware::{embed_firmware, embed_firmware_file, FirmwareError, HexRecord};
pub use keydef::KeyDef;
pub use layout::Layout;
pub use mnemonics::Mnemonics;
pub use session::{
    program_device, program_device_with_progress, DeviceSession, ProgramPhase, ProgramProgress,
    SessionCloser,
};
