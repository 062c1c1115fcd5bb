//! Sort command: copy qualifying activity files into the archive.

use std::io::Write;

use anyhow::{Context, Result};

use fitsort_core::{CancelFlag, Pipeline, RecordDecoder, Summary};

use crate::Config;

/// Runs the pipeline and writes the summary to `writer`.
///
/// Only run-fatal conditions are returned as errors.
pub fn run<W: Write, D: RecordDecoder>(
    writer: &mut W,
    config: &Config,
    decoder: D,
    cancel: &CancelFlag,
    json: bool,
) -> Result<Summary> {
    let sort_config = config.sort_config();
    tracing::info!(input = %sort_config.input_dir.display(), "input directory");
    tracing::info!(output = %sort_config.output_dir.display(), "output directory");

    let pipeline = Pipeline::new(sort_config, decoder);
    let report = pipeline
        .run(cancel)
        .with_context(|| format!("failed to sort {}", pipeline.config().input_dir.display()))?;
    let summary = report.summary();

    if json {
        serde_json::to_writer_pretty(&mut *writer, &summary)
            .context("failed to serialize summary")?;
        writeln!(writer)?;
    } else {
        render(writer, &summary)?;
    }

    Ok(summary)
}

/// Writes a human-readable summary.
pub fn render<W: Write>(writer: &mut W, summary: &Summary) -> Result<()> {
    if summary.cancelled {
        writeln!(writer, "Interrupted before all files were processed.")?;
    }
    writeln!(writer, "Copied:         {}", summary.copied)?;
    writeln!(writer, "Not qualifying: {}", summary.not_qualifying)?;
    writeln!(writer, "Decode failed:  {}", summary.decode_failed)?;
    writeln!(writer, "Copy failed:    {}", summary.copy_failed)?;
    writeln!(writer, "Skipped:        {}", summary.skipped)?;
    if summary.collisions > 0 {
        writeln!(writer, "Collisions:     {}", summary.collisions)?;
    }

    if !summary.failures.is_empty() {
        writeln!(writer, "Failures:")?;
        for failure in &summary.failures {
            writeln!(writer, "- {}: {}", failure.path.display(), failure.reason)?;
        }
    }

    Ok(())
}
