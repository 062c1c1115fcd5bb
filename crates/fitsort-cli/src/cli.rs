//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Sorts exported FIT activity files.
///
/// Walks the input directory, and copies every manually tagged single-sport
/// activity to `<out>/<year>/<timestamp> <sport> <duration>.fit`. Source
/// files are left in place.
#[derive(Debug, Parser)]
#[command(name = "fitsort", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input directory [default: .]
    #[arg(long = "in", value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Output directory [default: out]
    #[arg(long = "out", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// File extension to look for, without the dot [default: fit]
    #[arg(long = "ext", value_name = "EXT")]
    pub extension: Option<String>,

    /// Number of files to process in parallel.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}
