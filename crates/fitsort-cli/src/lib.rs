//! fitsort CLI library.
//!
//! Argument parsing, layered configuration and the sort command used by the
//! `fitsort` binary.

mod cli;
pub mod commands;
mod config;

pub use cli::Cli;
pub use config::Config;
