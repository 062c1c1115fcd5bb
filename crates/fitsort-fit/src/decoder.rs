//! [`RecordDecoder`] implementation backed by `fitparser`.

use std::io::Read;

use chrono::Utc;
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

use fitsort_core::{ActivityType, DecodeError, DecodedActivity, RecordDecoder, Sport};

use crate::integrity::check_integrity;

/// Decodes FIT activity files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitDecoder;

impl FitDecoder {
    pub const fn new() -> Self {
        Self
    }
}

fn read_all(reader: &mut dyn Read) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(DecodeError::Read)?;
    Ok(bytes)
}

impl RecordDecoder for FitDecoder {
    fn validate(&self, reader: &mut dyn Read) -> Result<(), DecodeError> {
        let bytes = read_all(reader)?;
        let segments =
            check_integrity(&bytes).map_err(|e| DecodeError::Integrity(e.to_string()))?;
        tracing::trace!(segments, "integrity check passed");
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<DecodedActivity, DecodeError> {
        let bytes = read_all(reader)?;
        // Each chained segment is its own record group.
        let segments =
            check_integrity(&bytes).map_err(|e| DecodeError::Integrity(e.to_string()))?;
        if segments > 1 {
            return Err(DecodeError::MultipleRecordGroups { count: segments });
        }
        let records =
            fitparser::from_bytes(&bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        interpret(&records)
    }
}

/// Extracts the activity summary from decoded records.
fn interpret(records: &[FitDataRecord]) -> Result<DecodedActivity, DecodeError> {
    let file_ids: Vec<&FitDataRecord> = records
        .iter()
        .filter(|r| matches!(r.kind(), MesgNum::FileId))
        .collect();
    if file_ids.len() > 1 {
        return Err(DecodeError::MultipleRecordGroups {
            count: file_ids.len(),
        });
    }

    let file_type = file_ids
        .first()
        .and_then(|r| field(r, "type"))
        .map_or_else(|| "unknown".to_string(), file_type_name);
    if file_type != "activity" {
        return Err(DecodeError::NotAnActivity { file_type });
    }

    let activity = records
        .iter()
        .find(|r| matches!(r.kind(), MesgNum::Activity))
        .ok_or(DecodeError::MissingMessage("activity"))?;

    let activity_type = match field(activity, "type") {
        Some(Value::String(name)) => ActivityType::from_profile_name(name),
        Some(Value::Enum(code)) => ActivityType::from_code(*code),
        _ => return Err(missing("type")),
    };

    let timestamp = match field(activity, "timestamp") {
        Some(Value::Timestamp(ts)) => ts.with_timezone(&Utc),
        _ => return Err(missing("timestamp")),
    };

    let total_timer_time_ms = field(activity, "total_timer_time")
        .and_then(duration_millis)
        .ok_or_else(|| missing("total_timer_time"))?;

    let sports = records
        .iter()
        .filter(|r| matches!(r.kind(), MesgNum::Sport))
        .map(|r| match field(r, "sport") {
            Some(Value::String(name)) => Sport::from_profile_name(name),
            Some(Value::Enum(code)) => Sport::from_code(*code),
            _ => Sport::Other("invalid".to_string()),
        })
        .collect();

    Ok(DecodedActivity {
        activity_type,
        timestamp,
        total_timer_time_ms,
        sports,
    })
}

const fn missing(field: &'static str) -> DecodeError {
    DecodeError::MissingField {
        message: "activity",
        field,
    }
}

fn field<'a>(record: &'a FitDataRecord, name: &str) -> Option<&'a Value> {
    record
        .fields()
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.value())
}

fn file_type_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Enum(code) => match *code {
            1 => "device".to_string(),
            2 => "settings".to_string(),
            3 => "sport".to_string(),
            4 => "activity".to_string(),
            n => format!("file_{n}"),
        },
        other => format!("{other:?}"),
    }
}

/// Total timer time is scaled to seconds by the profile; unscaled values are
/// raw milliseconds.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "checked non-negative and finite; durations fit in u64 milliseconds"
)]
fn duration_millis(value: &Value) -> Option<u64> {
    let seconds = match value {
        Value::Float64(s) => *s,
        Value::Float32(s) => f64::from(*s),
        Value::UInt32(ms) => return Some(u64::from(*ms)),
        Value::UInt16(ms) => return Some(u64::from(*ms)),
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then(|| (seconds * 1000.0).round() as u64)
}
