//! Per-file outcomes and the end-of-run summary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::activity::DecodeError;
use crate::classify::NotQualifying;
use crate::place::{PlaceError, same_contents};
use crate::scan::SkipReason;

/// What happened to one visited entry.
#[derive(Debug)]
pub enum Outcome {
    Skipped {
        path: PathBuf,
        reason: SkipReason,
    },
    DecodeFailed {
        path: PathBuf,
        error: DecodeError,
    },
    NotQualifying {
        path: PathBuf,
        reason: NotQualifying,
    },
    CopyFailed {
        path: PathBuf,
        error: PlaceError,
    },
    Copied {
        path: PathBuf,
        destination: PathBuf,
    },
}

impl Outcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Skipped { path, .. }
            | Self::DecodeFailed { path, .. }
            | Self::NotQualifying { path, .. }
            | Self::CopyFailed { path, .. }
            | Self::Copied { path, .. } => path,
        }
    }

    /// Human-readable reason for anything other than a copy or a skip.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::DecodeFailed { error, .. } => Some(error.to_string()),
            Self::NotQualifying { reason, .. } => Some(reason.to_string()),
            Self::CopyFailed { error, .. } => Some(error.to_string()),
            Self::Skipped { .. } | Self::Copied { .. } => None,
        }
    }
}

/// Two sources that were copied to the same destination in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub destination: PathBuf,
    pub first: PathBuf,
    pub second: PathBuf,
    /// Whether the sources were byte-identical, making the overwrite harmless.
    pub identical: bool,
}

/// All outcomes of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    pub collisions: Vec<Collision>,
    /// The run was interrupted before every entry was visited.
    pub cancelled: bool,
}

impl RunReport {
    /// Builds a report, detecting destination collisions among the outcomes.
    pub fn collect(outcomes: Vec<Outcome>, cancelled: bool) -> Self {
        let mut claimed: HashMap<&Path, &Path> = HashMap::new();
        let mut collisions = Vec::new();

        for outcome in &outcomes {
            let Outcome::Copied { path, destination } = outcome else {
                continue;
            };
            let Some(first) = claimed.insert(destination, path) else {
                continue;
            };
            let identical = same_contents(first, path).unwrap_or(false);
            if identical {
                tracing::info!(
                    destination = %destination.display(),
                    first = %first.display(),
                    second = %path.display(),
                    "identical sources share a destination"
                );
            } else {
                tracing::warn!(
                    destination = %destination.display(),
                    first = %first.display(),
                    second = %path.display(),
                    "destination written by more than one source, only one copy kept"
                );
            }
            collisions.push(Collision {
                destination: destination.clone(),
                first: first.to_path_buf(),
                second: path.clone(),
                identical,
            });
        }

        Self {
            outcomes,
            collisions,
            cancelled,
        }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            cancelled: self.cancelled,
            collisions: self.collisions.len(),
            ..Summary::default()
        };

        for outcome in &self.outcomes {
            match outcome {
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::DecodeFailed { .. } => summary.decode_failed += 1,
                Outcome::NotQualifying { .. } => summary.not_qualifying += 1,
                Outcome::CopyFailed { .. } => summary.copy_failed += 1,
                Outcome::Copied { .. } => summary.copied += 1,
            }
            if let Some(reason) = outcome.failure_reason() {
                summary.failures.push(Failure {
                    path: outcome.path().to_path_buf(),
                    reason,
                });
            }
        }

        summary.failures.sort_by(|a, b| a.path.cmp(&b.path));
        summary
    }
}

/// Counts per outcome kind plus the reason for every failed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub copied: usize,
    pub skipped: usize,
    pub decode_failed: usize,
    pub not_qualifying: usize,
    pub copy_failed: usize,
    pub collisions: usize,
    pub cancelled: bool,
    pub failures: Vec<Failure>,
}

impl Summary {
    pub const fn total(&self) -> usize {
        self.copied + self.skipped + self.decode_failed + self.not_qualifying + self.copy_failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}
