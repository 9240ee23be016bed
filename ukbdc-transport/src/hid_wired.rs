//! HID transport implementation for direct USB connection

use std::time::Duration;

use hidapi::HidDevice;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::{self, cmd, timing, REPORT_SIZE};
use crate::types::TransportDeviceInfo;
use crate::Transport;

/// Device handle that can be released while other threads still hold the
/// transport. A report in flight keeps the lock, so `release` waits for it.
pub(crate) struct DeviceSlot<D> {
    inner: Mutex<Option<D>>,
}

impl<D> DeviceSlot<D> {
    pub(crate) fn new(device: D) -> Self {
        Self {
            inner: Mutex::new(Some(device)),
        }
    }

    pub(crate) fn with<R>(
        &self,
        f: impl FnOnce(&D) -> Result<R, TransportError>,
    ) -> Result<R, TransportError> {
        let guard = self.inner.lock();
        let device = guard.as_ref().ok_or(TransportError::Closed)?;
        f(device)
    }

    /// Drop the handle; returns false if it was already gone
    pub(crate) fn release(&self) -> bool {
        let device = self.inner.lock().take();
        let released = device.is_some();
        drop(device);
        released
    }
}

/// HID transport for a controller connected via USB cable
///
/// Commands and replies travel as feature reports on the vendor
/// configuration interface.
pub struct HidTransport {
    device: DeviceSlot<HidDevice>,
    info: TransportDeviceInfo,
    /// Delay after commands (ms)
    command_delay_ms: u64,
}

impl HidTransport {
    pub fn new(device: HidDevice, info: TransportDeviceInfo) -> Self {
        Self {
            device: DeviceSlot::new(device),
            info,
            command_delay_ms: timing::COMMAND_DELAY_MS,
        }
    }

    /// Set delay after commands
    pub fn set_command_delay(&mut self, ms: u64) {
        self.command_delay_ms = ms;
    }

    /// Send feature report and wait
    fn send_and_wait(&self, buf: &[u8]) -> Result<(), TransportError> {
        self.device.with(|device| {
            device.send_feature_report(buf)?;
            if self.command_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.command_delay_ms));
            }
            Ok(())
        })
    }

    /// Read feature report, returning the payload without the report ID
    fn read_response(&self) -> Result<Vec<u8>, TransportError> {
        self.device.with(|device| {
            let mut buf = vec![0u8; REPORT_SIZE];
            let n = device.get_feature_report(&mut buf)?;
            if n <= 1 {
                return Err(TransportError::Timeout);
            }
            buf.truncate(n);
            Ok(buf.split_off(1))
        })
    }
}

impl Transport for HidTransport {
    fn send_command(&self, cmd: u8, data: &[u8]) -> Result<(), TransportError> {
        let buf = protocol::build_command(cmd, data)?;
        debug!(
            "Sending {} (0x{:02X}): {:02X?}",
            cmd::name(cmd),
            cmd,
            &buf[..8]
        );
        self.send_and_wait(&buf)
    }

    fn query_command(&self, cmd: u8, data: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.send_command(cmd, data)?;
        let resp = self.read_response()?;
        debug!(
            "Got response for 0x{:02X}: {:02X?}",
            cmd,
            &resp[..resp.len().min(8)]
        );
        Ok(resp)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.device.release() {
            debug!("Closed {}", self.info.describe());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Stand-in handle that records when it is dropped
    struct Handle(Arc<AtomicBool>);

    impl Drop for Handle {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn release_drops_handle_immediately() {
        let dropped = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(DeviceSlot::new(Handle(dropped.clone())));
        let other = slot.clone();

        assert!(slot.release());
        // Gone even though another owner of the slot is still alive
        assert!(dropped.load(Ordering::SeqCst));
        assert!(matches!(
            other.with(|_| Ok(())),
            Err(TransportError::Closed)
        ));
        assert!(!other.release());
    }

    #[test]
    fn release_waits_for_report_in_flight() {
        let dropped = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(DeviceSlot::new(Handle(dropped.clone())));
        let (started_tx, started_rx) = std::sync::mpsc::channel();

        let worker = {
            let slot = slot.clone();
            let dropped = dropped.clone();
            std::thread::spawn(move || {
                slot.with(|_| {
                    started_tx.send(()).unwrap();
                    std::thread::sleep(Duration::from_millis(50));
                    Ok(dropped.load(Ordering::SeqCst))
                })
            })
        };

        started_rx.recv().unwrap();
        assert!(slot.release());
        assert!(dropped.load(Ordering::SeqCst));
        // The report saw a live handle the whole time
        assert!(!worker.join().unwrap().unwrap());
    }
}
