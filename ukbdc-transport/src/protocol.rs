//! Protocol constants and report framing for the layout programming interface

use crate::error::TransportError;

/// Feature report commands understood by the controller
pub mod cmd {
    /// Start a layout upload: `len: u16 LE`
    pub const LAYOUT_BEGIN: u8 = 0x10;
    /// Layout bytes: `offset: u16 LE, n: u8, data[n]`
    pub const LAYOUT_DATA: u8 = 0x11;
    /// Finish the upload: `sum: u16 LE` over every layout byte
    pub const LAYOUT_END: u8 = 0x12;

    // Response status
    pub const STATUS_OK: u8 = 0xAA;

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            LAYOUT_BEGIN => "LAYOUT_BEGIN",
            LAYOUT_DATA => "LAYOUT_DATA",
            LAYOUT_END => "LAYOUT_END",
            _ => "UNKNOWN",
        }
    }
}

/// Default device identification
pub mod device {
    /// Default USB vendor ID of the controller
    pub const VENDOR_ID: u16 = 0x16C0;
    /// Default USB product ID of the controller
    pub const PRODUCT_ID: u16 = 0x05DF;
    /// Vendor-defined usage page of the configuration interface
    pub const USAGE_PAGE: u16 = 0xFF00;
}

/// Timing constants
pub mod timing {
    /// Delay after each report so the controller can write its EEPROM page
    pub const COMMAND_DELAY_MS: u64 = 5;
}

/// Full feature report buffer: report ID + 64 payload bytes
pub const REPORT_SIZE: usize = 65;

/// Payload bytes per report
pub const PAYLOAD_SIZE: usize = REPORT_SIZE - 1;

/// Layout bytes carried by one LAYOUT_DATA report (cmd + offset + len header)
pub const DATA_CHUNK_SIZE: usize = PAYLOAD_SIZE - 4;

/// Largest layout the 16-bit length field can describe
pub const MAX_LAYOUT_SIZE: usize = u16::MAX as usize;

/// Build a feature report buffer
///
/// Format: `[report_id=0] [cmd] [data...] [zero padding]`
pub fn build_command(cmd: u8, data: &[u8]) -> Result<Vec<u8>, TransportError> {
    if data.len() > PAYLOAD_SIZE - 1 {
        return Err(TransportError::PayloadTooLarge {
            len: data.len(),
            max: PAYLOAD_SIZE - 1,
        });
    }
    let mut buf = vec![0u8; REPORT_SIZE];
    buf[1] = cmd;
    buf[2..2 + data.len()].copy_from_slice(data);
    Ok(buf)
}

/// Wrapping 16-bit sum of the layout, verified by the controller on LAYOUT_END
pub fn layout_checksum(blob: &[u8]) -> u16 {
    blob.iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// LAYOUT_BEGIN payload
pub fn begin_payload(len: usize) -> Result<[u8; 2], TransportError> {
    let len = u16::try_from(len).map_err(|_| TransportError::PayloadTooLarge {
        len,
        max: MAX_LAYOUT_SIZE,
    })?;
    Ok(len.to_le_bytes())
}

/// LAYOUT_DATA payload for one chunk starting at `offset`
pub fn data_payload(offset: usize, chunk: &[u8]) -> Result<Vec<u8>, TransportError> {
    if chunk.len() > DATA_CHUNK_SIZE {
        return Err(TransportError::PayloadTooLarge {
            len: chunk.len(),
            max: DATA_CHUNK_SIZE,
        });
    }
    let offset = u16::try_from(offset).map_err(|_| TransportError::PayloadTooLarge {
        len: offset,
        max: MAX_LAYOUT_SIZE,
    })?;
    let mut payload = Vec::with_capacity(3 + chunk.len());
    payload.extend_from_slice(&offset.to_le_bytes());
    payload.push(chunk.len() as u8);
    payload.extend_from_slice(chunk);
    Ok(payload)
}

/// LAYOUT_END payload
pub fn end_payload(blob: &[u8]) -> [u8; 2] {
    layout_checksum(blob).to_le_bytes()
}

/// Check a reply payload (`[cmd, status, ...]`, report ID stripped)
pub fn check_status(cmd: u8, resp: &[u8]) -> Result<(), TransportError> {
    match resp {
        [] | [_] => Err(TransportError::Timeout),
        [echo, _, ..] if *echo != cmd => Err(TransportError::InvalidResponse {
            expected: cmd,
            actual: *echo,
        }),
        [_, cmd::STATUS_OK, ..] => Ok(()),
        [_, status, ..] => Err(TransportError::Rejected {
            cmd,
            status: *status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_command_pads_to_report_size() {
        let buf = build_command(cmd::LAYOUT_BEGIN, &[0xB7, 0x0B]).unwrap();
        assert_eq!(buf.len(), REPORT_SIZE);
        assert_eq!(&buf[..4], &[0x00, 0x10, 0xB7, 0x0B]);
        assert!(buf[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn build_command_rejects_oversized_payload() {
        let data = [0u8; PAYLOAD_SIZE];
        assert!(matches!(
            build_command(cmd::LAYOUT_DATA, &data),
            Err(TransportError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn data_payload_layout() {
        let p = data_payload(0x0123, &[1, 2, 3]).unwrap();
        assert_eq!(p, vec![0x23, 0x01, 3, 1, 2, 3]);
        let full = data_payload(0, &[0; DATA_CHUNK_SIZE]).unwrap();
        assert!(build_command(cmd::LAYOUT_DATA, &full).is_ok());
    }

    #[test]
    fn checksum_wraps() {
        // 0xFF * 0x102 = 0x100FE
        assert_eq!(layout_checksum(&[0xFF; 0x102]), 0x00FE);
        assert_eq!(end_payload(&[1, 2, 3]), [6, 0]);
    }

    #[test]
    fn begin_payload_rejects_huge_layout() {
        assert_eq!(begin_payload(2928).unwrap(), [0x70, 0x0B]);
        assert!(begin_payload(MAX_LAYOUT_SIZE + 1).is_err());
    }

    #[test]
    fn status_checks() {
        assert!(check_status(cmd::LAYOUT_END, &[0x12, 0xAA]).is_ok());
        assert!(matches!(
            check_status(cmd::LAYOUT_END, &[0x12, 0x01]),
            Err(TransportError::Rejected { cmd: 0x12, status: 0x01 })
        ));
        assert!(matches!(
            check_status(cmd::LAYOUT_END, &[0x10, 0xAA]),
            Err(TransportError::InvalidResponse { .. })
        ));
        assert!(matches!(
            check_status(cmd::LAYOUT_END, &[]),
            Err(TransportError::Timeout)
        ));
    }
}
