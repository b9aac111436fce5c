//! Bounded worker pool over recordings.
//!
//! Each recording is one blocking task on a tokio runtime whose blocking
//! pool is capped at the worker count. Tasks share nothing but the
//! interrupt flag; a failure or panic in one never cancels the others.

use crate::constants::DEFAULT_MAX_WORKERS;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, ProcessCheck, Recording, RecordingReport, should_process};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// How one recording ended.
#[derive(Debug)]
pub enum RecordingOutcome {
    /// Processed to completion (possibly with event write failures).
    Processed(RecordingReport),
    /// Already complete from an earlier run.
    SkippedComplete(PathBuf),
    /// Not started because the run was interrupted.
    Interrupted(PathBuf),
    /// Abandoned; siblings were unaffected.
    Failed {
        /// Input file.
        input: PathBuf,
        /// What went wrong.
        error: String,
    },
}

/// Default worker count: `min(4, available CPUs)`.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .min(DEFAULT_MAX_WORKERS)
}

/// Run `pipeline` over `files` with at most `workers` in flight.
///
/// Every file is keyed against the whole batch first, so inputs sharing a
/// stem never share outputs. Outcomes come back in the order of `files`.
/// Once `interrupt` is set,
/// recordings not yet started are reported as interrupted; in-flight ones
/// finish.
///
/// # Errors
///
/// Returns [`Error::Internal`] only if the runtime cannot be created.
pub fn run_pool(
    pipeline: Arc<Pipeline>,
    files: Vec<PathBuf>,
    workers: usize,
    interrupt: Arc<AtomicBool>,
    progress: Option<ProgressBar>,
) -> Result<Vec<RecordingOutcome>> {
    let workers = workers.max(1);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(workers)
        .thread_name("flightcall-worker")
        .build()
        .map_err(|e| Error::Internal {
            message: format!("Failed to create worker runtime: {e}"),
        })?;

    info!("Processing {} recording(s) with {} worker(s)", files.len(), workers);

    let recordings = pipeline.plan(&files);
    Ok(runtime.block_on(schedule(pipeline, recordings, workers, interrupt, progress)))
}

async fn schedule(
    pipeline: Arc<Pipeline>,
    recordings: Vec<Recording>,
    workers: usize,
    interrupt: Arc<AtomicBool>,
    progress: Option<ProgressBar>,
) -> Vec<RecordingOutcome> {
    let permits = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    for (index, recording) in recordings.iter().cloned().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        let permits = Arc::clone(&permits);
        let interrupt = Arc::clone(&interrupt);

        tasks.spawn(async move {
            let input = recording.input.clone();
            // Never closed, so acquire only fails if the pool is gone
            let Ok(_permit) = permits.acquire_owned().await else {
                return (index, RecordingOutcome::Interrupted(input));
            };
            if interrupt.load(Ordering::SeqCst) {
                return (index, RecordingOutcome::Interrupted(input));
            }

            let joined =
                tokio::task::spawn_blocking(move || process_one(&pipeline, recording)).await;
            let outcome = joined.unwrap_or_else(|e| {
                let error = if e.is_panic() {
                    "worker panicked".to_string()
                } else {
                    format!("worker cancelled: {e}")
                };
                error!("Failed to process {}: {error}", input.display());
                RecordingOutcome::Failed { input, error }
            });
            (index, outcome)
        });
    }

    let mut outcomes: Vec<Option<RecordingOutcome>> = recordings.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => warn!("Scheduler task failed: {e}"),
        }
    }

    recordings
        .into_iter()
        .zip(outcomes)
        .map(|(recording, outcome)| {
            outcome.unwrap_or_else(|| RecordingOutcome::Failed {
                input: recording.input,
                error: "task lost".to_string(),
            })
        })
        .collect()
}

fn process_one(pipeline: &Pipeline, recording: Recording) -> RecordingOutcome {
    let output_root = pipeline.output_root_for(&recording.input);
    if let ProcessCheck::SkipComplete(manifest) =
        should_process(&recording, &output_root, pipeline.options().force)
    {
        info!(
            "Skipping (complete): {} ({})",
            recording.input.display(),
            manifest.display()
        );
        return RecordingOutcome::SkippedComplete(recording.input);
    }

    match pipeline.process_recording(&recording) {
        Ok(report) => RecordingOutcome::Processed(report),
        Err(e) => {
            error!("Failed to process {}: {e}", recording.input.display());
            RecordingOutcome::Failed {
                input: recording.input,
                error: e.to_string(),
            }
        }
    }
}
