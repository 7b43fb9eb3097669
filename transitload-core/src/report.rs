//! Per-job results and the aggregated report for a whole run.

use std::fmt;

use crate::{LoadError, LoadJob};

/// Why a row did not reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The record had a different number of fields than the job has columns.
    FieldCountMismatch {
        /// Columns declared by the job.
        expected: usize,
        /// Fields found on the line.
        found: usize,
    },
    /// The store refused the insert, for example on a constraint violation.
    Rejected,
    /// The line was not valid UTF-8.
    InvalidEncoding,
}

/// Diagnostic for a single line that was skipped or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    line_number: u64,
    kind: WarningKind,
    message: String,
}

impl RowWarning {
    pub(crate) fn field_count_mismatch(line_number: u64, expected: usize, found: usize) -> Self {
        Self {
            line_number,
            kind: WarningKind::FieldCountMismatch { expected, found },
            message: format!("field count mismatch: expected {expected} fields, found {found}"),
        }
    }

    pub(crate) fn rejected(line_number: u64, message: impl Into<String>) -> Self {
        Self {
            line_number,
            kind: WarningKind::Rejected,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_encoding(line_number: u64) -> Self {
        Self {
            line_number,
            kind: WarningKind::InvalidEncoding,
            message: "line is not valid UTF-8".to_owned(),
        }
    }

    /// One-based line number within the source file; the header is line 1.
    #[must_use]
    pub const fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Category of the problem.
    #[must_use]
    pub const fn kind(&self) -> WarningKind {
        self.kind
    }

    /// Human-readable description, including the store's message for
    /// rejected rows.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.message)
    }
}

/// Overall state of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Every data line was inserted.
    Complete,
    /// The job committed but some lines were skipped or rejected.
    Partial,
    /// The job stopped on a fatal error and nothing was committed.
    Failed,
}

/// Outcome of a single committed job.
///
/// Rows skipped for a field-count mismatch or bad encoding are not counted as
/// attempted. Every row handed to the store is attempted, whether or not the
/// store accepted it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
    rows_attempted: u64,
    rows_failed: u64,
    rows_skipped: u64,
    warnings: Vec<RowWarning>,
}

impl LoadResult {
    pub(crate) const fn record_attempt(&mut self) {
        self.rows_attempted += 1;
    }

    pub(crate) fn record_failure(&mut self, warning: RowWarning) {
        self.rows_failed += 1;
        self.warnings.push(warning);
    }

    pub(crate) fn record_skip(&mut self, warning: RowWarning) {
        self.rows_skipped += 1;
        self.warnings.push(warning);
    }

    fn absorb(&mut self, other: &Self) {
        self.rows_attempted += other.rows_attempted;
        self.rows_failed += other.rows_failed;
        self.rows_skipped += other.rows_skipped;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Rows passed to the store.
    #[must_use]
    pub const fn rows_attempted(&self) -> u64 {
        self.rows_attempted
    }

    /// Attempted rows the store rejected.
    #[must_use]
    pub const fn rows_failed(&self) -> u64 {
        self.rows_failed
    }

    /// Lines skipped before reaching the store.
    #[must_use]
    pub const fn rows_skipped(&self) -> u64 {
        self.rows_skipped
    }

    /// Rows the store accepted.
    #[must_use]
    pub const fn rows_inserted(&self) -> u64 {
        self.rows_attempted.saturating_sub(self.rows_failed)
    }

    /// Row diagnostics in file order.
    #[must_use]
    pub fn warnings(&self) -> &[RowWarning] {
        &self.warnings
    }

    /// [`LoadStatus::Complete`] without warnings, otherwise
    /// [`LoadStatus::Partial`].
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        if self.warnings.is_empty() {
            LoadStatus::Complete
        } else {
            LoadStatus::Partial
        }
    }
}

/// A job paired with what happened when it ran.
#[derive(Debug)]
pub struct JobOutcome {
    job: LoadJob,
    outcome: Result<LoadResult, LoadError>,
}

impl JobOutcome {
    pub(crate) const fn new(job: LoadJob, outcome: Result<LoadResult, LoadError>) -> Self {
        Self { job, outcome }
    }

    /// The job that ran.
    #[must_use]
    pub const fn job(&self) -> &LoadJob {
        &self.job
    }

    /// The committed result or the fatal error.
    #[must_use]
    pub const fn outcome(&self) -> &Result<LoadResult, LoadError> {
        &self.outcome
    }

    /// Status of the job.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.outcome
            .as_ref()
            .map_or(LoadStatus::Failed, LoadResult::status)
    }
}

/// Everything that happened during one run over a list of jobs.
#[derive(Debug, Default)]
pub struct LoadReport {
    outcomes: Vec<JobOutcome>,
    not_attempted: Vec<LoadJob>,
}

impl LoadReport {
    pub(crate) fn push(&mut self, outcome: JobOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn defer(&mut self, job: LoadJob) {
        self.not_attempted.push(job);
    }

    /// Outcomes in the order the jobs ran.
    #[must_use]
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Jobs left unrun after an aborting failure.
    #[must_use]
    pub fn not_attempted(&self) -> &[LoadJob] {
        &self.not_attempted
    }

    /// Jobs that stopped on a fatal error.
    pub fn failures(&self) -> impl Iterator<Item = (&LoadJob, &LoadError)> {
        self.outcomes
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().err().map(|err| (&entry.job, err)))
    }

    /// Row warnings of every committed job, tagged with the table name.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &RowWarning)> {
        self.outcomes.iter().flat_map(|entry| {
            let table = entry.job.table_name();
            entry
                .outcome
                .iter()
                .flat_map(|result| result.warnings.iter())
                .map(move |warning| (table, warning))
        })
    }

    /// Counters and warnings of every committed job combined.
    #[must_use]
    pub fn totals(&self) -> LoadResult {
        let mut totals = LoadResult::default();
        for result in self.outcomes.iter().filter_map(|entry| entry.outcome.as_ref().ok()) {
            totals.absorb(result);
        }
        totals
    }

    /// Rows passed to the store across all jobs.
    #[must_use]
    pub fn rows_attempted(&self) -> u64 {
        self.committed().map(LoadResult::rows_attempted).sum()
    }

    /// Rows rejected by the store across all jobs.
    #[must_use]
    pub fn rows_failed(&self) -> u64 {
        self.committed().map(LoadResult::rows_failed).sum()
    }

    /// Rows accepted by the store across all jobs.
    #[must_use]
    pub fn rows_inserted(&self) -> u64 {
        self.committed().map(LoadResult::rows_inserted).sum()
    }

    /// Whether every job ran and committed.
    ///
    /// Row warnings do not make a run unsuccessful.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.not_attempted.is_empty() && self.outcomes.iter().all(|entry| entry.outcome.is_ok())
    }

    fn committed(&self) -> impl Iterator<Item = &LoadResult> {
        self.outcomes
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn job(table: &str) -> LoadJob {
        LoadJob::new(format!("{table}.txt"), table, ["id"]).expect("valid job")
    }

    fn result_with(attempted: u64, warnings: Vec<RowWarning>, failed: u64) -> LoadResult {
        LoadResult {
            rows_attempted: attempted,
            rows_failed: failed,
            rows_skipped: 0,
            warnings,
        }
    }

    #[rstest]
    fn status_reflects_warnings() {
        assert_eq!(LoadResult::default().status(), LoadStatus::Complete);
        let partial = result_with(2, vec![RowWarning::rejected(3, "UNIQUE")], 1);
        assert_eq!(partial.status(), LoadStatus::Partial);
        assert_eq!(partial.rows_inserted(), 1);
    }

    #[rstest]
    fn warning_display_names_the_line() {
        let warning = RowWarning::field_count_mismatch(4, 3, 2);
        assert_eq!(
            warning.to_string(),
            "line 4: field count mismatch: expected 3 fields, found 2"
        );
        assert_eq!(
            warning.kind(),
            WarningKind::FieldCountMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[rstest]
    fn aggregates_committed_jobs() {
        let mut report = LoadReport::default();
        report.push(JobOutcome::new(
            job("agency"),
            Ok(result_with(1, Vec::new(), 0)),
        ));
        report.push(JobOutcome::new(
            job("route"),
            Ok(result_with(3, vec![RowWarning::rejected(3, "NOT NULL")], 1)),
        ));

        assert_eq!(report.rows_attempted(), 4);
        assert_eq!(report.rows_failed(), 1);
        assert_eq!(report.rows_inserted(), 3);
        assert!(report.is_success());

        let warnings: Vec<_> = report
            .warnings()
            .map(|(table, warning)| (table.to_owned(), warning.line_number()))
            .collect();
        assert_eq!(warnings, vec![("route".to_owned(), 3)]);

        let totals = report.totals();
        assert_eq!(totals.rows_attempted(), 4);
        assert_eq!(totals.warnings().len(), 1);
    }

    #[rstest]
    fn deferred_jobs_mark_the_run_unsuccessful() {
        let mut report = LoadReport::default();
        report.defer(job("stop_time"));
        assert!(!report.is_success());
        assert_eq!(report.not_attempted().len(), 1);
    }
}
