use load_test_summary_model::{SummaryColumn, TableError, TrialTable};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read summary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse summary file: {0}")]
    Parse(#[from] PolarsError),
    #[error("Summary file is missing required column `{column}`")]
    MissingColumn { column: SummaryColumn },
    #[error("Column `{column}` has an empty or non-numeric value in row {row}")]
    InvalidValue { column: SummaryColumn, row: usize },
    #[error(transparent)]
    Table(#[from] TableError),
}

impl LoadError {
    /// Whether the summary file, or the directory holding it, does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Read a summary CSV file into a [`TrialTable`].
///
/// The file must have a header row naming all of [`SummaryColumn::ALL`]. Other columns are
/// ignored. Rows keep the order they have in the file.
pub fn load_trial_table(path: &Path) -> Result<TrialTable, LoadError> {
    // Open the file ourselves so a missing file keeps its `io::ErrorKind`
    let file = File::open(path)?;

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(file)
        .finish()?;
    log::debug!(
        "Loaded frame with {} rows and columns {:?}",
        frame.height(),
        frame.get_column_names()
    );

    table_from_frame(&frame)
}

pub(crate) fn table_from_frame(frame: &DataFrame) -> Result<TrialTable, LoadError> {
    for column in SummaryColumn::ALL {
        if frame.column(column.header()).is_err() {
            return Err(LoadError::MissingColumn { column });
        }
    }

    let table = TrialTable::from_columns(
        numeric_column(frame, SummaryColumn::ConcurrentUsers)?,
        numeric_column(frame, SummaryColumn::SuccessRate)?,
        numeric_column(frame, SummaryColumn::AvgResponseTime)?,
        numeric_column(frame, SummaryColumn::P95ResponseTime)?,
        numeric_column(frame, SummaryColumn::Rps)?,
        numeric_column(frame, SummaryColumn::ErrorCount)?,
    )?;

    Ok(table)
}

fn numeric_column(frame: &DataFrame, column: SummaryColumn) -> Result<Vec<f64>, LoadError> {
    let values = frame
        .column(column.header())
        .map_err(|_| LoadError::MissingColumn { column })?
        // Non-strict: values that do not parse as numbers become null
        .cast(&DataType::Float64)?;

    values
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .filter(|v| v.is_finite())
                .ok_or(LoadError::InvalidValue { column, row: i + 1 })
        })
        .collect()
}
