//! Minimal FIT encoder for building test inputs.
//!
//! Only writes the handful of messages and fields the sorter reads. Every
//! message is preceded by its own definition record.

use chrono::{DateTime, Utc};

use crate::integrity::crc16;

/// Raw FIT profile values used by the builders.
pub mod codes {
    pub const FILE_SETTINGS: u8 = 2;
    pub const FILE_ACTIVITY: u8 = 4;

    pub const ACTIVITY_MANUAL: u8 = 0;
    pub const ACTIVITY_AUTO_MULTI_SPORT: u8 = 1;

    pub const SPORT_RUNNING: u8 = 1;
    pub const SPORT_CYCLING: u8 = 2;
    pub const SPORT_SWIMMING: u8 = 5;
    pub const SPORT_WALKING: u8 = 11;
}

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;

const MESG_FILE_ID: u16 = 0;
const MESG_SPORT: u16 = 12;
const MESG_ACTIVITY: u16 = 34;

const BASE_ENUM: u8 = 0x00;
const BASE_UINT16: u8 = 0x84;
const BASE_UINT32: u8 = 0x86;

const PROTOCOL_VERSION: u8 = 0x20;
const PROFILE_VERSION: u16 = 2132;

/// Builds one FIT segment.
#[derive(Debug, Default)]
pub struct FitBuilder {
    records: Vec<u8>,
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `file_id` message with the given file type.
    #[must_use]
    pub fn file_id(self, file_type: u8) -> Self {
        self.message(0, MESG_FILE_ID, &[(0, BASE_ENUM, vec![file_type])])
    }

    /// Appends an `activity` summary message.
    #[must_use]
    pub fn activity(
        self,
        activity_type: u8,
        timestamp: DateTime<Utc>,
        total_timer_time_ms: u32,
    ) -> Self {
        let fit_seconds = u32::try_from(timestamp.timestamp() - FIT_EPOCH_OFFSET).unwrap_or(0);
        self.message(
            1,
            MESG_ACTIVITY,
            &[
                (253, BASE_UINT32, fit_seconds.to_le_bytes().to_vec()),
                (0, BASE_UINT32, total_timer_time_ms.to_le_bytes().to_vec()),
                (1, BASE_UINT16, 1u16.to_le_bytes().to_vec()),
                (2, BASE_ENUM, vec![activity_type]),
            ],
        )
    }

    /// Appends a `sport` message.
    #[must_use]
    pub fn sport(self, sport: u8) -> Self {
        self.message(2, MESG_SPORT, &[(0, BASE_ENUM, vec![sport])])
    }

    fn message(mut self, local: u8, global: u16, fields: &[(u8, u8, Vec<u8>)]) -> Self {
        // Definition record: little-endian architecture.
        self.records.push(0x40 | local);
        self.records.push(0);
        self.records.push(0);
        self.records.extend_from_slice(&global.to_le_bytes());
        self.records.push(u8::try_from(fields.len()).unwrap_or(u8::MAX));
        for (number, base_type, value) in fields {
            self.records.push(*number);
            self.records.push(u8::try_from(value.len()).unwrap_or(u8::MAX));
            self.records.push(*base_type);
        }

        self.records.push(local);
        for (_, _, value) in fields {
            self.records.extend_from_slice(value);
        }
        self
    }

    /// Wraps the records in a 14 byte header and appends the file CRC.
    pub fn build(self) -> Vec<u8> {
        let data_size = u32::try_from(self.records.len()).unwrap_or(u32::MAX);

        let mut bytes = Vec::with_capacity(self.records.len() + 16);
        bytes.push(14);
        bytes.push(PROTOCOL_VERSION);
        bytes.extend_from_slice(&PROFILE_VERSION.to_le_bytes());
        bytes.extend_from_slice(&data_size.to_le_bytes());
        bytes.extend_from_slice(crate::integrity::SIGNATURE);
        let header_crc = crc16(0, &bytes);
        bytes.extend_from_slice(&header_crc.to_le_bytes());

        bytes.extend_from_slice(&self.records);
        let file_crc = crc16(0, &bytes);
        bytes.extend_from_slice(&file_crc.to_le_bytes());
        bytes
    }
}

/// A complete manual single-sport activity file.
pub fn manual_activity(sport: u8, start: DateTime<Utc>, total_timer_time_ms: u32) -> Vec<u8> {
    FitBuilder::new()
        .file_id(codes::FILE_ACTIVITY)
        .activity(codes::ACTIVITY_MANUAL, start, total_timer_time_ms)
        .sport(sport)
        .build()
}
