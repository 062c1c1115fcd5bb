//! Core logic for sorting exported activity files.
//!
//! This crate contains:
//! - Scanning: finding candidate files under an input tree
//! - Classification: deciding whether a decoded activity is a manual single-sport session
//! - Naming: the canonical `<year>/<timestamp> <sport> <duration>.<ext>` destination
//! - Placement: copying into the archive
//! - The pipeline tying these together with per-file failure containment
//!
//! Decoding itself sits behind the [`RecordDecoder`] trait.

pub mod activity;
pub mod classify;
pub mod naming;
pub mod outcome;
pub mod pipeline;
pub mod place;
pub mod scan;

pub use activity::{ActivityType, DecodeError, DecodedActivity, RecordDecoder, Sport};
pub use classify::{ActivitySession, NotQualifying, classify_in};
pub use naming::{canonical_name, session_name};
pub use outcome::{Collision, Failure, Outcome, RunReport, Summary};
pub use pipeline::{CancelFlag, DEFAULT_EXTENSION, Pipeline, RunError, SortConfig};
pub use place::{PlaceError, Placer};
pub use scan::{ScanItem, Scanner, SkipReason};
