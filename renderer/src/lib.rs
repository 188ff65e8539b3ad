use anyhow::Context;
use std::path::{Path, PathBuf};

pub mod chart;
pub mod cli;
pub mod config;
pub mod frame;

pub use config::RenderConfig;
pub use load_test_summary_model::{SummaryColumn, TrialSummary, TrialTable};

/// Render the load test charts for a results directory.
///
/// Reads `<results_dir>/<input_file_name>`, draws the four charts and writes them to
/// `<results_dir>/<output_file_name>`, replacing any previous image. Returns the path of the
/// written image.
pub fn render_report(results_dir: &Path, config: &RenderConfig) -> anyhow::Result<PathBuf> {
    let input_path = results_dir.join(&config.input_file_name);
    log::info!("Loading load test summary from {}", input_path.display());

    let table = frame::load_trial_table(&input_path)
        .with_context(|| format!("Failed to load {}", input_path.display()))?;
    log::info!("Loaded {} trials", table.len());

    let output_path = results_dir.join(&config.output_file_name);
    chart::draw_report(&table, &output_path, config)
        .with_context(|| format!("Failed to render {}", output_path.display()))?;
    log::info!("Wrote charts to {}", output_path.display());

    Ok(output_path)
}
