//! Intel HEX handling for embedding a layout into a firmware image.
//!
//! The controller firmware reads its layout from a fixed flash region. To
//! ship a layout with the firmware, the blob is turned into data records at
//! that region and spliced into the base image just before its end-of-file
//! record. Records from an earlier embed that fall in the region are dropped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

/// Flash address of the layout region on the reference controller
pub const DEFAULT_BASE_ADDRESS: u16 = 0x2700;

/// Data bytes per generated record
pub const RECORD_DATA_LEN: usize = 16;

/// End of the 16-bit address space a data record can reach
const ADDRESS_SPACE: usize = 0x1_0000;

/// Intel HEX record types
pub mod record_type {
    pub const DATA: u8 = 0x00;
    pub const EOF: u8 = 0x01;
    pub const EXT_SEGMENT: u8 = 0x02;
    pub const START_SEGMENT: u8 = 0x03;
    pub const EXT_LINEAR: u8 = 0x04;
    pub const START_LINEAR: u8 = 0x05;
}

#[derive(Error, Debug)]
pub enum FirmwareError {
    /// Base firmware image could not be read
    #[error("Base firmware image {path} not readable: {source}")]
    MissingBaseImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Layout does not fit below the end of the 16-bit address space
    #[error("Layout of {len} bytes at 0x{base:04X} runs past 0xFFFF")]
    RecordOverflow { base: u16, len: usize },

    #[error("Malformed HEX record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn malformed(line: usize, reason: impl Into<String>) -> FirmwareError {
    FirmwareError::MalformedRecord {
        line,
        reason: reason.into(),
    }
}

/// Two's complement of the byte sum of a record, truncated to one byte
pub fn record_checksum(byte_count: u8, address: u16, record_type: u8, data: &[u8]) -> u8 {
    let [hi, lo] = address.to_be_bytes();
    let header = byte_count
        .wrapping_add(hi)
        .wrapping_add(lo)
        .wrapping_add(record_type);
    data.iter()
        .fold(header, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

/// One Intel HEX record (`:LLAAAATT<data>CC`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRecord {
    pub address: u16,
    pub record_type: u8,
    pub data: Vec<u8>,
}

impl HexRecord {
    pub fn data(address: u16, data: &[u8]) -> Self {
        Self {
            address,
            record_type: record_type::DATA,
            data: data.to_vec(),
        }
    }

    pub fn eof() -> Self {
        Self {
            address: 0,
            record_type: record_type::EOF,
            data: Vec::new(),
        }
    }

    /// Extended linear address record setting the upper 16 address bits
    pub fn ext_linear(upper: u16) -> Self {
        Self {
            address: 0,
            record_type: record_type::EXT_LINEAR,
            data: upper.to_be_bytes().to_vec(),
        }
    }

    pub fn byte_count(&self) -> u8 {
        self.data.len() as u8
    }

    pub fn checksum(&self) -> u8 {
        record_checksum(self.byte_count(), self.address, self.record_type, &self.data)
    }

    /// Parse one line, verifying length and checksum
    pub fn parse(line: &str) -> Result<Self, FirmwareError> {
        Self::parse_line(line, 0)
    }

    fn parse_line(text: &str, line: usize) -> Result<Self, FirmwareError> {
        let hex = text
            .trim()
            .strip_prefix(':')
            .ok_or_else(|| malformed(line, "missing ':' start code"))?;
        if hex.len() % 2 != 0 {
            return Err(malformed(line, "odd number of hex digits"));
        }
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| malformed(line, format!("invalid hex at column {}", i + 2)))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        if bytes.len() < 5 {
            return Err(malformed(line, "record too short"));
        }
        let count = usize::from(bytes[0]);
        if bytes.len() != count + 5 {
            return Err(malformed(
                line,
                format!("byte count {count} does not match {} data bytes", bytes.len() - 5),
            ));
        }
        let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if sum != 0 {
            return Err(malformed(line, "checksum mismatch"));
        }

        Ok(Self {
            address: u16::from_be_bytes([bytes[1], bytes[2]]),
            record_type: bytes[3],
            data: bytes[4..4 + count].to_vec(),
        })
    }

    /// Upper address bits set by an extended address record
    fn upper_address(&self) -> Option<usize> {
        let value = match self.data.as_slice() {
            [hi, lo] => usize::from(u16::from_be_bytes([*hi, *lo])),
            _ => return None,
        };
        match self.record_type {
            record_type::EXT_SEGMENT => Some(value << 4),
            record_type::EXT_LINEAR => Some(value << 16),
            _ => None,
        }
    }
}

impl FromStr for HexRecord {
    type Err = FirmwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{:02X}{:04X}{:02X}",
            self.byte_count(),
            self.address,
            self.record_type
        )?;
        for b in &self.data {
            write!(f, "{b:02X}")?;
        }
        write!(f, "{:02X}", self.checksum())
    }
}

/// Split a blob into contiguous data records starting at `base_address`
pub fn layout_records(blob: &[u8], base_address: u16) -> Result<Vec<HexRecord>, FirmwareError> {
    if usize::from(base_address) + blob.len() > ADDRESS_SPACE {
        return Err(FirmwareError::RecordOverflow {
            base: base_address,
            len: blob.len(),
        });
    }
    Ok(blob
        .chunks(RECORD_DATA_LEN)
        .enumerate()
        .map(|(i, chunk)| HexRecord::data(base_address + (i * RECORD_DATA_LEN) as u16, chunk))
        .collect())
}

/// Splice a layout blob into a base firmware image.
///
/// Returns the new image text. Every record of the base image is kept in
/// order except data records overlapping `[base_address, base_address + len)`.
/// The generated records go right before the end-of-file record, and the
/// output uses the base image's line terminator.
pub fn embed_firmware(
    base_image: &str,
    blob: &[u8],
    base_address: u16,
) -> Result<String, FirmwareError> {
    let records = layout_records(blob, base_address)?;
    let region = usize::from(base_address)..usize::from(base_address) + blob.len();
    let newline = if base_image.contains("\r\n") { "\r\n" } else { "\n" };

    let mut out: Vec<String> = Vec::new();
    let mut upper = 0usize;
    let mut dropped = 0usize;
    let mut seen_eof = false;

    for (index, text) in base_image.lines().enumerate() {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let record = HexRecord::parse_line(text, index + 1)?;

        match record.record_type {
            record_type::EXT_SEGMENT | record_type::EXT_LINEAR => {
                upper = record
                    .upper_address()
                    .ok_or_else(|| malformed(index + 1, "address record needs 2 data bytes"))?;
            }
            record_type::DATA if !seen_eof => {
                let start = upper + usize::from(record.address);
                let end = start + record.data.len();
                if start < region.end && region.start < end {
                    dropped += 1;
                    continue;
                }
            }
            record_type::EOF if !seen_eof => {
                seen_eof = true;
                if upper != 0 && !records.is_empty() {
                    // Layout lives in the first 64K; reset the upper address
                    out.push(HexRecord::ext_linear(0).to_string());
                }
                out.extend(records.iter().map(HexRecord::to_string));
            }
            _ => {}
        }
        out.push(text.to_string());
    }

    if !seen_eof {
        // Point one past the last line, where the record should have been
        let line = base_image.lines().count() + 1;
        return Err(malformed(line, "base image has no end-of-file record"));
    }
    if dropped > 0 {
        debug!(dropped, "Dropped records overlapping the layout region");
    }
    info!(
        records = records.len(),
        base = %format!("0x{base_address:04X}"),
        "Embedded layout into firmware image"
    );

    let mut image = out.join(newline);
    image.push_str(newline);
    Ok(image)
}

/// Read a base image from disk and embed `blob` into it
pub fn embed_firmware_file(
    base_path: impl AsRef<Path>,
    blob: &[u8],
    base_address: u16,
) -> Result<String, FirmwareError> {
    let path = base_path.as_ref();
    let base_image =
        fs::read_to_string(path).map_err(|source| FirmwareError::MissingBaseImage {
            path: path.to_path_buf(),
            source,
        })?;
    embed_firmware(&base_image, blob, base_address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = ":100000000C9434000C9446000C9446000C9446006A\n\
                        :00000001FF\n";

    #[test]
    fn checksum_of_single_byte_record() {
        assert_eq!(record_checksum(1, 0x2700, 0, &[0x04]), 0xD4);
        assert_eq!(HexRecord::data(0x2700, &[0x04]).to_string(), ":0127000004D4");
    }

    #[test]
    fn eof_record_text() {
        assert_eq!(HexRecord::eof().to_string(), ":00000001FF");
    }

    #[test]
    fn parse_verifies_checksum() {
        let rec = HexRecord::parse(":0127000004D4").unwrap();
        assert_eq!(rec.address, 0x2700);
        assert_eq!(rec.data, vec![0x04]);

        assert!(matches!(
            HexRecord::parse(":0127000004D5"),
            Err(FirmwareError::MalformedRecord { .. })
        ));
        assert!(HexRecord::parse("0127000004D4").is_err());
        assert!(HexRecord::parse(":0227000004D4").is_err());
        assert!(HexRecord::parse(":01270000G4D4").is_err());
    }

    #[test]
    fn records_are_16_byte_chunks() {
        let blob: Vec<u8> = (0..40).collect();
        let records = layout_records(&blob, 0x2700).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].address, 0x2700);
        assert_eq!(records[1].address, 0x2710);
        assert_eq!(records[2].address, 0x2720);
        assert_eq!(records[2].data.len(), 8);
        let joined: Vec<u8> = records.iter().flat_map(|r| r.data.clone()).collect();
        assert_eq!(joined, blob);
    }

    #[test]
    fn full_layout_record_count() {
        let blob = vec![0u8; 2928];
        assert_eq!(layout_records(&blob, DEFAULT_BASE_ADDRESS).unwrap().len(), 183);
    }

    #[test]
    fn overflow_past_address_space() {
        assert!(layout_records(&[0u8; 16], 0xFFF0).is_ok());
        assert!(matches!(
            layout_records(&[0u8; 17], 0xFFF0),
            Err(FirmwareError::RecordOverflow { base: 0xFFF0, len: 17 })
        ));
    }

    #[test]
    fn embed_inserts_before_eof() {
        let out = embed_firmware(BASE, &[0x04], 0x2700).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                ":100000000C9434000C9446000C9446000C9446006A",
                ":0127000004D4",
                ":00000001FF",
            ]
        );
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn embed_replaces_previous_layout() {
        let once = embed_firmware(BASE, &[0x04, 0x05], 0x2700).unwrap();
        let twice = embed_firmware(&once, &[0x06, 0x07], 0x2700).unwrap();
        assert_eq!(twice.lines().count(), 3);
        assert!(twice.contains(&HexRecord::data(0x2700, &[0x06, 0x07]).to_string()));
        assert!(!twice.contains(&HexRecord::data(0x2700, &[0x04, 0x05]).to_string()));
    }

    #[test]
    fn embed_honours_extended_address() {
        // Same low address but in the next 64K segment: not part of the layout
        let high = HexRecord::data(0x2700, &[0xAA]).to_string();
        let ext = HexRecord::ext_linear(1);
        assert_eq!(ext.to_string(), ":020000040001F9");
        let base = format!("{ext}\n{high}\n:00000001FF\n");
        let out = embed_firmware(&base, &[0x04], 0x2700).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                ":020000040001F9",
                high.as_str(),
                ":020000040000FA",
                ":0127000004D4",
                ":00000001FF",
            ]
        );
    }

    #[test]
    fn embed_keeps_crlf() {
        let base = BASE.replace('\n', "\r\n");
        let out = embed_firmware(&base, &[0x04], 0x2700).unwrap();
        assert_eq!(out.matches("\r\n").count(), 3);
    }

    #[test]
    fn embed_requires_eof() {
        let base = ":100000000C9434000C9446000C9446000C9446006A\n";
        assert!(matches!(
            embed_firmware(base, &[0x04], 0x2700),
            Err(FirmwareError::MalformedRecord { line: 2, .. })
        ));
        assert!(matches!(
            embed_firmware("", &[0x04], 0x2700),
            Err(FirmwareError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn missing_base_image() {
        assert!(matches!(
            embed_firmware_file("/nonexistent/base_firmware.hex", &[0x04], 0x2700),
            Err(FirmwareError::MissingBaseImage { .. })
        ));
    }
}
