//! Decoded activity records and the decoder seam.

use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// How the device determined the sport of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    /// The user explicitly picked a single sport.
    Manual,
    /// The device split the session into several sports on its own.
    AutoMultiSport,
    Other(String),
}

impl ActivityType {
    /// Parses a FIT profile name (`manual`, `auto_multi_sport`).
    #[must_use]
    pub fn from_profile_name(name: &str) -> Self {
        match name {
            "manual" => Self::Manual,
            "auto_multi_sport" => Self::AutoMultiSport,
            other => Self::Other(other.to_string()),
        }
    }

    /// Maps a raw FIT `activity` enum value.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Manual,
            1 => Self::AutoMultiSport,
            n => Self::Other(format!("activity_{n}")),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::AutoMultiSport => f.write_str("auto_multi_sport"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Sport of a single sport-summary entry.
///
/// The display form is the FIT profile name and ends up verbatim in the
/// destination file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sport {
    Generic,
    Running,
    Cycling,
    Transition,
    FitnessEquipment,
    Swimming,
    Basketball,
    Soccer,
    Tennis,
    AmericanFootball,
    Training,
    Walking,
    CrossCountrySkiing,
    AlpineSkiing,
    Snowboarding,
    Rowing,
    Mountaineering,
    Hiking,
    Multisport,
    Paddling,
    /// Any sport without a dedicated variant, kept by its profile name.
    Other(String),
}

/// Named sports in FIT code order.
static NAMED_SPORTS: [(Sport, &str); 20] = [
    (Sport::Generic, "generic"),
    (Sport::Running, "running"),
    (Sport::Cycling, "cycling"),
    (Sport::Transition, "transition"),
    (Sport::FitnessEquipment, "fitness_equipment"),
    (Sport::Swimming, "swimming"),
    (Sport::Basketball, "basketball"),
    (Sport::Soccer, "soccer"),
    (Sport::Tennis, "tennis"),
    (Sport::AmericanFootball, "american_football"),
    (Sport::Training, "training"),
    (Sport::Walking, "walking"),
    (Sport::CrossCountrySkiing, "cross_country_skiing"),
    (Sport::AlpineSkiing, "alpine_skiing"),
    (Sport::Snowboarding, "snowboarding"),
    (Sport::Rowing, "rowing"),
    (Sport::Mountaineering, "mountaineering"),
    (Sport::Hiking, "hiking"),
    (Sport::Multisport, "multisport"),
    (Sport::Paddling, "paddling"),
];

impl Sport {
    #[must_use]
    pub fn from_profile_name(name: &str) -> Self {
        NAMED_SPORTS
            .iter()
            .find(|(_, n)| *n == name)
            .map_or_else(|| Self::Other(name.to_string()), |(s, _)| s.clone())
    }

    /// Maps a raw FIT `sport` enum value.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        NAMED_SPORTS
            .get(usize::from(code))
            .map_or_else(|| Self::Other(format!("sport_{code}")), |(s, _)| s.clone())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Other(name) => name,
            named => NAMED_SPORTS
                .iter()
                .find(|(s, _)| s == named)
                .map_or("generic", |(_, n)| *n),
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of a decoded activity file the sorter cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedActivity {
    pub activity_type: ActivityType,
    /// Timestamp of the activity summary.
    pub timestamp: DateTime<Utc>,
    /// Total timer time in whole milliseconds.
    pub total_timer_time_ms: u64,
    /// One entry per sport-summary message, in file order.
    pub sports: Vec<Sport>,
}

/// Why a file could not be turned into a [`DecodedActivity`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to rewind {path}: {source}")]
    Rewind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read: {0}")]
    Read(#[source] io::Error),
    #[error("integrity check failed: {0}")]
    Integrity(String),
    #[error("failed to decode: {0}")]
    Malformed(String),
    #[error("not an activity file (file type: {file_type})")]
    NotAnActivity { file_type: String },
    #[error("expected a single record group, found {count}")]
    MultipleRecordGroups { count: usize },
    #[error("no {0} message found")]
    MissingMessage(&'static str),
    #[error("{message} message has no usable {field} field")]
    MissingField {
        message: &'static str,
        field: &'static str,
    },
}

/// Validates and decodes one activity file.
///
/// [`validate`](Self::validate) is called on a first pass over the file, the
/// stream is rewound, then [`decode`](Self::decode) is called on a second pass.
pub trait RecordDecoder: Send + Sync {
    /// Structural and checksum validation without a full parse.
    fn validate(&self, reader: &mut dyn Read) -> Result<(), DecodeError>;

    /// Full parse into a [`DecodedActivity`].
    ///
    /// Must fail with [`DecodeError::NotAnActivity`] for other record kinds and
    /// with [`DecodeError::MultipleRecordGroups`] when more than one record
    /// group is present.
    fn decode(&self, reader: &mut dyn Read) -> Result<DecodedActivity, DecodeError>;
}
