//! Drives files from discovery to placement.
//!
//! [`Pipeline::process`] is the per-file task: decode, classify, name, place,
//! stopping at the first failure and turning it into an [`Outcome`]. Nothing a
//! single file does can abort the run. The only fatal conditions are failing
//! to create the output root and failing to list part of the input tree.
//!
//! [`Pipeline::run`] feeds the task either sequentially or from a bounded
//! `rayon` pool; the task is the same in both cases.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{FixedOffset, Local};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::{DecodeError, DecodedActivity, RecordDecoder};
use crate::classify::{ActivitySession, NotQualifying, classify_in};
use crate::naming::session_name;
use crate::outcome::{Outcome, RunReport};
use crate::place::{Placer, create_dir_all};
use crate::scan::{ScanItem, Scanner};

/// Default file extension, used both for matching and for naming.
pub const DEFAULT_EXTENSION: &str = "fit";

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extension without the leading dot.
    pub extension: String,
    /// Worker count. `None` or `1` processes files one at a time.
    pub jobs: Option<usize>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            extension: DEFAULT_EXTENSION.to_string(),
            jobs: None,
        }
    }
}

/// Conditions that stop the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Shared flag checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Time zone used for the timestamp in destination names.
#[derive(Debug, Clone, Copy, Default)]
enum NamingZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

/// The sorting pipeline for one configuration.
pub struct Pipeline<D> {
    config: SortConfig,
    decoder: D,
    placer: Placer,
    zone: NamingZone,
}

impl<D: RecordDecoder> Pipeline<D> {
    pub fn new(config: SortConfig, decoder: D) -> Self {
        let placer = Placer::new(&config.output_dir);
        Self {
            config,
            decoder,
            placer,
            zone: NamingZone::Local,
        }
    }

    /// Names files using `offset` instead of the system time zone.
    #[must_use]
    pub fn with_fixed_offset(mut self, offset: FixedOffset) -> Self {
        self.zone = NamingZone::Fixed(offset);
        self
    }

    pub const fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Creates the output root.
    pub fn prepare(&self) -> Result<(), RunError> {
        let root = self.placer.output_root();
        create_dir_all(root).map_err(|source| RunError::CreateOutputRoot {
            path: root.to_path_buf(),
            source,
        })
    }

    /// Processes one candidate file.
    pub fn process(&self, path: &Path) -> Outcome {
        let activity = match self.decode(path) {
            Ok(activity) => activity,
            Err(error) => {
                tracing::info!(path = %path.display(), error = %error, "not an activity file");
                return Outcome::DecodeFailed {
                    path: path.to_path_buf(),
                    error,
                };
            }
        };

        let session = match self.classify(&activity) {
            Ok(session) => session,
            Err(reason) => {
                tracing::info!(path = %path.display(), reason = %reason, "failed to name");
                return Outcome::NotQualifying {
                    path: path.to_path_buf(),
                    reason,
                };
            }
        };

        let relative = session_name(&session, &self.config.extension);
        match self.placer.place(path, &relative) {
            Ok(destination) => {
                tracing::info!(
                    path = %path.display(),
                    destination = %destination.display(),
                    "copied"
                );
                Outcome::Copied {
                    path: path.to_path_buf(),
                    destination,
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "copy failed");
                Outcome::CopyFailed {
                    path: path.to_path_buf(),
                    error,
                }
            }
        }
    }

    fn decode(&self, path: &Path) -> Result<DecodedActivity, DecodeError> {
        let mut file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        self.decoder.validate(&mut file)?;
        file.seek(SeekFrom::Start(0))
            .map_err(|source| DecodeError::Rewind {
                path: path.to_path_buf(),
                source,
            })?;
        self.decoder.decode(&mut file)
    }

    fn classify(&self, activity: &DecodedActivity) -> Result<ActivitySession, NotQualifying> {
        match self.zone {
            NamingZone::Local => classify_in(activity, &Local),
            NamingZone::Fixed(offset) => classify_in(activity, &offset),
        }
    }

    /// Handles one scanner item.
    fn handle(&self, item: ScanItem) -> Outcome {
        match item {
            ScanItem::Candidate(path) => self.process(&path),
            ScanItem::Skipped { path, reason } => {
                tracing::debug!(path = %path.display(), reason = %reason, "skipping");
                Outcome::Skipped { path, reason }
            }
        }
    }

    /// Creates the output root and sorts every file under the input root.
    pub fn run(&self, cancel: &CancelFlag) -> Result<RunReport, RunError> {
        self.prepare()?;

        let scanner = Scanner::new(&self.config.input_dir, &self.config.extension);
        let outcomes = match self.config.jobs {
            Some(jobs) if jobs > 1 => self.run_parallel(&scanner, jobs, cancel)?,
            _ => self.run_sequential(&scanner, cancel)?,
        };

        let cancelled = cancel.is_cancelled();
        if cancelled {
            tracing::warn!(processed = outcomes.len(), "run cancelled");
        }
        Ok(RunReport::collect(outcomes, cancelled))
    }

    fn run_sequential(
        &self,
        scanner: &Scanner,
        cancel: &CancelFlag,
    ) -> Result<Vec<Outcome>, RunError> {
        let mut outcomes = Vec::new();
        for item in scanner.iter() {
            if cancel.is_cancelled() {
                break;
            }
            outcomes.push(self.handle(item?));
        }
        Ok(outcomes)
    }

    fn run_parallel(
        &self,
        scanner: &Scanner,
        jobs: usize,
        cancel: &CancelFlag,
    ) -> Result<Vec<Outcome>, RunError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        tracing::debug!(jobs, "processing files in parallel");

        let outcomes = pool.install(|| {
            scanner
                .iter()
                .take_while(|_| !cancel.is_cancelled())
                .par_bridge()
                .map(|item| item.map(|item| self.handle(item)))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(outcomes)
    }
}
