//! Programming a layout into a live controller.
//!
//! A [`DeviceSession`] owns the transport to one controller between `open`
//! and `close`. The upload is
//!
//! ```text
//! LAYOUT_BEGIN(len)            -> status
//! LAYOUT_DATA(offset, chunk)   (repeated, 60 bytes each)
//! LAYOUT_END(sum16)            -> status
//! ```
//!
//! Each report re-checks that the session is still open, so closing from
//! another thread (see [`SessionCloser`]) stops a transfer at the next
//! report boundary.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use ukbdc_transport::protocol::{self, cmd};
use ukbdc_transport::{HidDiscovery, Transport, TransportDeviceInfo};

use crate::config::UsbConfig;
use crate::error::SessionError;

/// Phases of a programming run (reported to progress callback)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramPhase {
    Opening,
    Starting { size: usize },
    Transferring,
    Verifying,
    Done,
}

impl fmt::Display for ProgramPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opening => write!(f, "Opening device"),
            Self::Starting { size } => write!(f, "Starting upload: {size} bytes"),
            Self::Transferring => write!(f, "Transferring layout"),
            Self::Verifying => write!(f, "Verifying checksum"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Progress callback trait, implemented by the CLI and by tests
pub trait ProgramProgress: Send {
    fn on_phase(&mut self, phase: &ProgramPhase);
    fn on_chunk(&mut self, sent: usize, total: usize);
    fn on_error(&mut self, error: &SessionError);
    fn on_complete(&mut self);
}

/// Progress sink that ignores everything
pub struct NoProgress;

impl ProgramProgress for NoProgress {
    fn on_phase(&mut self, _phase: &ProgramPhase) {}
    fn on_chunk(&mut self, _sent: usize, _total: usize) {}
    fn on_error(&mut self, _error: &SessionError) {}
    fn on_complete(&mut self) {}
}

type TransportSlot = Arc<Mutex<Option<Arc<dyn Transport>>>>;

fn close_slot(slot: &TransportSlot) -> Result<(), SessionError> {
    // Take the transport out first so no later report can reach it.
    let taken = slot.lock().take();
    match taken {
        Some(transport) => {
            debug!("Closing {}", transport.device_info().describe());
            transport.close()?;
            Ok(())
        }
        None => Ok(()),
    }
}

/// Exclusive access to one controller
pub struct DeviceSession {
    transport: TransportSlot,
    info: TransportDeviceInfo,
}

/// Handle that closes a [`DeviceSession`] from elsewhere
#[derive(Clone)]
pub struct SessionCloser {
    transport: TransportSlot,
}

impl SessionCloser {
    pub fn close(&self) -> Result<(), SessionError> {
        close_slot(&self.transport)
    }
}

impl DeviceSession {
    /// Open the first controller matching `usb`
    pub fn open(usb: &UsbConfig) -> Result<Self, SessionError> {
        let transport = HidDiscovery::new(usb.matcher())
            .open_first()
            .map_err(SessionError::from_open)?;
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Wrap an already-open transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        let transport: Arc<dyn Transport> = Arc::from(transport);
        let info = transport.device_info().clone();
        Self {
            transport: Arc::new(Mutex::new(Some(transport))),
            info,
        }
    }

    pub fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    pub fn is_open(&self) -> bool {
        self.transport.lock().is_some()
    }

    pub fn closer(&self) -> SessionCloser {
        SessionCloser {
            transport: Arc::clone(&self.transport),
        }
    }

    /// Release the device. Safe to call more than once.
    pub fn close(&self) -> Result<(), SessionError> {
        close_slot(&self.transport)
    }

    fn current(&self) -> Result<Arc<dyn Transport>, SessionError> {
        self.transport.lock().clone().ok_or(SessionError::Closed)
    }

    fn query(&self, command: u8, data: &[u8]) -> Result<(), SessionError> {
        let resp = self.current()?.query_command(command, data)?;
        protocol::check_status(command, &resp)?;
        Ok(())
    }

    /// Upload `blob` as the device's layout
    pub fn program(&self, blob: &[u8]) -> Result<(), SessionError> {
        self.program_with_progress(blob, &mut NoProgress)
    }

    /// Upload `blob`, reporting progress. Makes exactly one attempt.
    pub fn program_with_progress(
        &self,
        blob: &[u8],
        progress: &mut dyn ProgramProgress,
    ) -> Result<(), SessionError> {
        match self.upload(blob, progress) {
            Ok(()) => {
                progress.on_phase(&ProgramPhase::Done);
                progress.on_complete();
                info!(bytes = blob.len(), "Layout programmed");
                Ok(())
            }
            Err(e) => {
                warn!("Programming failed: {e}");
                progress.on_error(&e);
                Err(e)
            }
        }
    }

    fn upload(&self, blob: &[u8], progress: &mut dyn ProgramProgress) -> Result<(), SessionError> {
        let total = blob.len();
        progress.on_phase(&ProgramPhase::Starting { size: total });
        let begin = protocol::begin_payload(total)?;
        self.query(cmd::LAYOUT_BEGIN, &begin)?;

        progress.on_phase(&ProgramPhase::Transferring);
        let mut sent = 0;
        for chunk in blob.chunks(protocol::DATA_CHUNK_SIZE) {
            let payload = protocol::data_payload(sent, chunk)?;
            self.current()?.send_command(cmd::LAYOUT_DATA, &payload)?;
            sent += chunk.len();
            progress.on_chunk(sent, total);
        }

        progress.on_phase(&ProgramPhase::Verifying);
        debug!("Layout checksum {:#06x}", protocol::layout_checksum(blob));
        self.query(cmd::LAYOUT_END, &protocol::end_payload(blob))
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if let Err(e) = close_slot(&self.transport) {
            warn!("Error closing device session: {e}");
        }
    }
}

/// Open the controller, upload `blob` and close again
pub fn program_device(usb: &UsbConfig, blob: &[u8]) -> Result<(), SessionError> {
    program_device_with_progress(usb, blob, &mut NoProgress)
}

pub fn program_device_with_progress(
    usb: &UsbConfig,
    blob: &[u8],
    progress: &mut dyn ProgramProgress,
) -> Result<(), SessionError> {
    progress.on_phase(&ProgramPhase::Opening);
    let session = match DeviceSession::open(usb) {
        Ok(session) => session,
        Err(e) => {
            progress.on_error(&e);
            return Err(e);
        }
    };
    let result = session.program_with_progress(blob, progress);
    let closed = session.close();
    result.and(closed)
}
