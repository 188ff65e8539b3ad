use std::{fmt, str::FromStr};

/// A column of the load test summary table.
///
/// Each variant maps to exactly one header in `test_summary.csv`. All six are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryColumn {
    ConcurrentUsers,
    SuccessRate,
    AvgResponseTime,
    P95ResponseTime,
    Rps,
    ErrorCount,
}

impl SummaryColumn {
    /// The required columns, in the order the summary file lists them.
    pub const ALL: [SummaryColumn; 6] = [
        SummaryColumn::ConcurrentUsers,
        SummaryColumn::SuccessRate,
        SummaryColumn::AvgResponseTime,
        SummaryColumn::P95ResponseTime,
        SummaryColumn::Rps,
        SummaryColumn::ErrorCount,
    ];

    /// The exact header used for this column in the summary file.
    pub fn header(&self) -> &'static str {
        match self {
            SummaryColumn::ConcurrentUsers => "Concurrent Users",
            SummaryColumn::SuccessRate => "Success Rate",
            SummaryColumn::AvgResponseTime => "Avg Response Time(ms)",
            SummaryColumn::P95ResponseTime => "P95 Response Time(ms)",
            SummaryColumn::Rps => "RPS",
            SummaryColumn::ErrorCount => "Error Count",
        }
    }
}

impl FromStr for SummaryColumn {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SummaryColumn::ALL
            .into_iter()
            .find(|column| column.header() == s)
            .ok_or("Unknown summary column")
    }
}

impl fmt::Display for SummaryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Summary of a single trial
///
/// A trial is one load test run at a fixed concurrency level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSummary {
    /// Number of simulated clients running at the same time
    pub concurrent_users: f64,
    /// Percentage of requests that succeeded, 0 to 100
    pub success_rate: f64,
    /// Mean response time, in milliseconds
    pub avg_response_time_ms: f64,
    /// 95th percentile response time, in milliseconds
    pub p95_response_time_ms: f64,
    /// Requests completed per second
    pub rps: f64,
    /// Number of failed requests
    pub error_count: f64,
}

impl TrialSummary {
    /// The value this trial holds for `column`.
    pub fn value(&self, column: SummaryColumn) -> f64 {
        match column {
            SummaryColumn::ConcurrentUsers => self.concurrent_users,
            SummaryColumn::SuccessRate => self.success_rate,
            SummaryColumn::AvgResponseTime => self.avg_response_time_ms,
            SummaryColumn::P95ResponseTime => self.p95_response_time_ms,
            SummaryColumn::Rps => self.rps,
            SummaryColumn::ErrorCount => self.error_count,
        }
    }
}

/// Error building a [`TrialTable`] from columns.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TableError {
    #[error("Column `{column}` has {found} values, expected {expected}")]
    LengthMismatch {
        column: SummaryColumn,
        expected: usize,
        found: usize,
    },
}

/// All trials of a load test, in the order they were executed.
///
/// The order is kept as read. It is not necessarily sorted by concurrent users.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialTable {
    trials: Vec<TrialSummary>,
}

impl TrialTable {
    pub fn new(trials: Vec<TrialSummary>) -> Self {
        Self { trials }
    }

    /// Build a table from one vector per column.
    ///
    /// Every column must have as many values as `concurrent_users`.
    pub fn from_columns(
        concurrent_users: Vec<f64>,
        success_rate: Vec<f64>,
        avg_response_time_ms: Vec<f64>,
        p95_response_time_ms: Vec<f64>,
        rps: Vec<f64>,
        error_count: Vec<f64>,
    ) -> Result<Self, TableError> {
        let expected = concurrent_users.len();
        for (column, values) in [
            (SummaryColumn::SuccessRate, &success_rate),
            (SummaryColumn::AvgResponseTime, &avg_response_time_ms),
            (SummaryColumn::P95ResponseTime, &p95_response_time_ms),
            (SummaryColumn::Rps, &rps),
            (SummaryColumn::ErrorCount, &error_count),
        ] {
            if values.len() != expected {
                return Err(TableError::LengthMismatch {
                    column,
                    expected,
                    found: values.len(),
                });
            }
        }

        let trials = (0..expected)
            .map(|i| TrialSummary {
                concurrent_users: concurrent_users[i],
                success_rate: success_rate[i],
                avg_response_time_ms: avg_response_time_ms[i],
                p95_response_time_ms: p95_response_time_ms[i],
                rps: rps[i],
                error_count: error_count[i],
            })
            .collect();

        Ok(Self { trials })
    }

    pub fn trials(&self) -> &[TrialSummary] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// All values of `column`, in row order.
    pub fn column(&self, column: SummaryColumn) -> Vec<f64> {
        self.trials.iter().map(|t| t.value(column)).collect()
    }

    /// `(concurrent users, value)` pairs for `column`, in row order.
    pub fn points(&self, column: SummaryColumn) -> Vec<(f64, f64)> {
        self.trials
            .iter()
            .map(|t| (t.concurrent_users, t.value(column)))
            .collect()
    }
}
