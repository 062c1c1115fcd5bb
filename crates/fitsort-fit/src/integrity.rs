//! Structural and checksum validation of FIT files.
//!
//! A FIT file is one or more chained segments, each made of a 12 or 14 byte
//! header, `data_size` bytes of records and a trailing CRC-16 over header and
//! data. Validation walks the chain without interpreting any record.

use thiserror::Error;

/// The `.FIT` marker at bytes 8..12 of every segment header.
pub const SIGNATURE: &[u8; 4] = b".FIT";

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("file is empty")]
    Empty,
    #[error("truncated header at offset {offset}")]
    TruncatedHeader { offset: usize },
    #[error("invalid header size {size} at offset {offset}")]
    HeaderSize { offset: usize, size: u8 },
    #[error("missing .FIT signature at offset {offset}")]
    Signature { offset: usize },
    #[error(
        "header crc mismatch at offset {offset}: stored {stored:#06x}, computed {computed:#06x}"
    )]
    HeaderCrc {
        offset: usize,
        stored: u16,
        computed: u16,
    },
    #[error("segment at offset {offset} needs {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error(
        "file crc mismatch at offset {offset}: stored {stored:#06x}, computed {computed:#06x}"
    )]
    FileCrc {
        offset: usize,
        stored: u16,
        computed: u16,
    },
}

/// Updates a FIT CRC-16 with `bytes`.
pub fn crc16(mut crc: u16, bytes: &[u8]) -> u16 {
    for &byte in bytes {
        let mut tmp = CRC_TABLE[usize::from(crc & 0xF)];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ CRC_TABLE[usize::from(byte & 0xF)];

        tmp = CRC_TABLE[usize::from(crc & 0xF)];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ CRC_TABLE[usize::from(byte >> 4)];
    }
    crc
}

fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Validates every chained segment and returns how many there are.
pub fn check_integrity(bytes: &[u8]) -> Result<usize, IntegrityError> {
    if bytes.is_empty() {
        return Err(IntegrityError::Empty);
    }

    let mut offset = 0;
    let mut segments = 0;
    while offset < bytes.len() {
        offset = check_segment(bytes, offset)?;
        segments += 1;
    }
    Ok(segments)
}

/// Validates the segment starting at `offset`, returning where the next one starts.
fn check_segment(bytes: &[u8], offset: usize) -> Result<usize, IntegrityError> {
    let rest = &bytes[offset..];
    if rest.len() < 12 {
        return Err(IntegrityError::TruncatedHeader { offset });
    }

    let header_size = rest[0];
    if header_size < 12 {
        return Err(IntegrityError::HeaderSize {
            offset,
            size: header_size,
        });
    }
    let header_len = usize::from(header_size);
    if rest.len() < header_len {
        return Err(IntegrityError::TruncatedHeader { offset });
    }
    if &rest[8..12] != SIGNATURE {
        return Err(IntegrityError::Signature { offset });
    }
    if header_len >= 14 {
        let stored = le_u16(&rest[12..14]);
        let computed = crc16(0, &rest[..12]);
        if stored != 0 && stored != computed {
            return Err(IntegrityError::HeaderCrc {
                offset,
                stored,
                computed,
            });
        }
    }

    let data_size = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
    let needed = usize::try_from(data_size)
        .ok()
        .and_then(|d| d.checked_add(header_len + 2))
        .unwrap_or(usize::MAX);
    if rest.len() < needed {
        return Err(IntegrityError::Truncated {
            offset,
            needed,
            available: rest.len(),
        });
    }

    let stored = le_u16(&rest[needed - 2..needed]);
    let computed = crc16(0, &rest[..needed - 2]);
    if stored != computed {
        return Err(IntegrityError::FileCrc {
            offset,
            stored,
            computed,
        });
    }

    Ok(offset + needed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FitBuilder, codes};

    use chrono::{DateTime, Utc};

    fn sample() -> Vec<u8> {
        let start = DateTime::parse_from_rfc3339("2023-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        FitBuilder::new()
            .file_id(codes::FILE_ACTIVITY)
            .activity(codes::ACTIVITY_MANUAL, start, 5_400_000)
            .sport(codes::SPORT_RUNNING)
            .build()
    }

    #[test]
    fn crc_of_check_string() {
        // CRC-16/ARC check value.
        assert_eq!(crc16(0, b"123456789"), 0xBB3D);
    }

    #[test]
    fn crc_over_data_and_crc_is_zero() {
        let data = b"some record bytes";
        let crc = crc16(0, data);
        let mut with_crc = data.to_vec();
        with_crc.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(crc16(0, &with_crc), 0);
    }

    #[test]
    fn well_formed_file_passes() {
        assert_eq!(check_integrity(&sample()), Ok(1));
    }

    #[test]
    fn chained_segments_are_counted() {
        let mut bytes = sample();
        bytes.extend(sample());
        assert_eq!(check_integrity(&bytes), Ok(2));
    }

    #[test]
    fn empty_file_fails() {
        assert_eq!(check_integrity(&[]), Err(IntegrityError::Empty));
    }

    #[test]
    fn flipped_data_byte_fails_file_crc() {
        let mut bytes = sample();
        let last_data = bytes.len() - 3;
        bytes[last_data] ^= 0xFF;
        assert!(matches!(
            check_integrity(&bytes),
            Err(IntegrityError::FileCrc { offset: 0, .. })
        ));
    }

    #[test]
    fn flipped_header_byte_fails_header_crc() {
        let mut bytes = sample();
        bytes[1] ^= 0xFF;
        assert!(matches!(
            check_integrity(&bytes),
            Err(IntegrityError::HeaderCrc { offset: 0, .. })
        ));
    }

    #[test]
    fn truncated_file_fails() {
        let bytes = sample();
        assert!(matches!(
            check_integrity(&bytes[..bytes.len() - 1]),
            Err(IntegrityError::Truncated { .. })
        ));
        assert!(matches!(
            check_integrity(&bytes[..10]),
            Err(IntegrityError::TruncatedHeader { offset: 0 })
        ));
    }

    #[test]
    fn trailing_garbage_fails() {
        let mut bytes = sample();
        let len = bytes.len();
        bytes.extend_from_slice(b"junk");
        assert_eq!(
            check_integrity(&bytes),
            Err(IntegrityError::TruncatedHeader { offset: len })
        );
    }

    #[test]
    fn text_file_fails_signature() {
        let bytes = b"\x0eThis is not a FIT file at all".to_vec();
        assert_eq!(
            check_integrity(&bytes),
            Err(IntegrityError::Signature { offset: 0 })
        );
    }
}
