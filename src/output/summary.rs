//! Batch summary, logged at the end of a run and printed with `--json`.

use crate::error::{Error, Result};
use crate::pipeline::RecordingOutcome;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Recording processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Recording was processed.
    Processed,
    /// Recording was skipped (manifest exists).
    Skipped,
    /// Recording was not started because the run was interrupted.
    Interrupted,
    /// Recording processing failed.
    Failed,
}

/// One line of the summary per recording.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    /// Input file.
    pub file: PathBuf,
    /// Outcome.
    pub status: FileStatus,
    /// Accepted events.
    pub events: usize,
    /// Clips written by this run.
    pub written: usize,
    /// Clips kept from an earlier run.
    pub kept_existing: usize,
    /// Clips that failed to write.
    pub write_failures: usize,
    /// Input was silent.
    pub silent: bool,
    /// Directory holding the clips.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordingSummary {
    fn bare(file: PathBuf, status: FileStatus, error: Option<String>) -> Self {
        Self {
            file,
            status,
            events: 0,
            written: 0,
            kept_existing: 0,
            write_failures: 0,
            silent: false,
            output_dir: None,
            error,
        }
    }
}

impl From<&RecordingOutcome> for RecordingSummary {
    fn from(outcome: &RecordingOutcome) -> Self {
        match outcome {
            RecordingOutcome::Processed(report) => Self {
                file: report.input.clone(),
                status: FileStatus::Processed,
                events: report.accepted,
                written: report.written,
                kept_existing: report.kept_existing,
                write_failures: report.write_failures,
                silent: report.silent,
                output_dir: Some(report.output_dir.clone()),
                error: None,
            },
            RecordingOutcome::SkippedComplete(input) => {
                Self::bare(input.clone(), FileStatus::Skipped, None)
            }
            RecordingOutcome::Interrupted(input) => {
                Self::bare(input.clone(), FileStatus::Interrupted, None)
            }
            RecordingOutcome::Failed { input, error } => {
                Self::bare(input.clone(), FileStatus::Failed, Some(error.clone()))
            }
        }
    }
}

/// Totals over a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Recordings considered.
    pub total: usize,
    /// Recordings processed.
    pub processed: usize,
    /// Recordings skipped as complete.
    pub skipped: usize,
    /// Recordings not started due to interrupt.
    pub interrupted: usize,
    /// Recordings that failed.
    pub failed: usize,
    /// Events accepted across processed recordings.
    pub events: usize,
    /// Clips written.
    pub written: usize,
    /// Clips kept from earlier runs.
    pub kept_existing: usize,
    /// Clips that failed to write.
    pub write_failures: usize,
    /// Wall time of the batch.
    pub elapsed_s: f64,
    /// Per-recording details.
    pub recordings: Vec<RecordingSummary>,
}

impl BatchSummary {
    /// Summarize pool outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[RecordingOutcome], elapsed_s: f64) -> Self {
        let recordings: Vec<RecordingSummary> =
            outcomes.iter().map(RecordingSummary::from).collect();
        let count = |status| recordings.iter().filter(|r| r.status == status).count();

        Self {
            total: recordings.len(),
            processed: count(FileStatus::Processed),
            skipped: count(FileStatus::Skipped),
            interrupted: count(FileStatus::Interrupted),
            failed: count(FileStatus::Failed),
            events: recordings.iter().map(|r| r.events).sum(),
            written: recordings.iter().map(|r| r.written).sum(),
            kept_existing: recordings.iter().map(|r| r.kept_existing).sum(),
            write_failures: recordings.iter().map(|r| r.write_failures).sum(),
            elapsed_s,
            recordings,
        }
    }

    /// True when every recording completed without errors.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0 && self.write_failures == 0 && self.interrupted == 0
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SummarySerialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::SummarySerialize { source: e })
    }

    /// Log the totals.
    pub fn log(&self) {
        info!(
            "Complete: {} processed, {} skipped, {} failed, {} events ({} written, {} kept) in {:.2}s",
            self.processed,
            self.skipped,
            self.failed,
            self.events,
            self.written,
            self.kept_existing,
            self.elapsed_s
        );
        if self.interrupted > 0 {
            warn!("Interrupted: {} recording(s) not started", self.interrupted);
        }
        if self.failed > 0 {
            warn!("{} recording(s) had errors", self.failed);
        }
        if self.write_failures > 0 {
            warn!("{} event clip(s) failed to write", self.write_failures);
        }
    }
}
