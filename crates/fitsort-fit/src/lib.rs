//! FIT file support for fitsort.
//!
//! Provides [`FitDecoder`], the [`fitsort_core::RecordDecoder`] used by the
//! CLI. Validation is done here (header and CRC of every chained segment);
//! record parsing is delegated to `fitparser`.
//!
//! With the `fixtures` feature, [`fixture`] exposes a tiny encoder for
//! building test files.

mod decoder;
pub mod integrity;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use decoder::FitDecoder;
pub use integrity::{IntegrityError, check_integrity};
