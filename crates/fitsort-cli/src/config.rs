//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use fitsort_core::{DEFAULT_EXTENSION, SortConfig};

use crate::Cli;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory walked for activity files.
    pub input_dir: PathBuf,
    /// Root of the year-sharded archive.
    pub output_dir: PathBuf,
    /// Extension matched and written, without the dot.
    pub extension: String,
    /// Worker count; unset means one file at a time.
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            extension: DEFAULT_EXTENSION.to_string(),
            jobs: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (FITSORT_*)
        figment = figment.merge(Env::prefixed("FITSORT_"));

        figment.extract()
    }

    /// Applies command-line flags on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(input) = &cli.input {
            self.input_dir.clone_from(input);
        }
        if let Some(output) = &cli.output {
            self.output_dir.clone_from(output);
        }
        if let Some(extension) = &cli.extension {
            self.extension.clone_from(extension);
        }
        if let Some(jobs) = cli.jobs {
            self.jobs = Some(usize::from(jobs));
        }
        self
    }

    /// The configuration handed to the sorting pipeline.
    pub fn sort_config(&self) -> SortConfig {
        SortConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            extension: self.extension.trim_start_matches('.').to_string(),
            jobs: self.jobs,
        }
    }
}

/// Returns the platform-specific config directory for fitsort.
///
/// On Linux: `~/.config/fitsort`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("fitsort"))
}
