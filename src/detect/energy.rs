//! Runs of samples above a linear amplitude threshold.

use super::{CandidateSpan, DurationPolicy, EventDetector};
use crate::audio::{WaveformBuffer, secs_to_samples};
use crate::config::EnergyParams;

/// Finds events as contiguous runs of active samples (`|x| > threshold`).
///
/// Runs separated by fewer than `silence_pad_sec` of inactive samples are
/// merged before the duration filter, so short intra-call gaps do not split
/// one call into several events. Run boundaries are the event boundaries.
#[derive(Debug, Clone)]
pub struct EnergyThresholdDetector {
    threshold: f32,
    merge_gap: usize,
}

impl EnergyThresholdDetector {
    /// Detector for buffers at `sample_rate`.
    #[must_use]
    pub fn new(params: &EnergyParams, sample_rate: u32) -> Self {
        Self {
            threshold: params.amplitude_threshold,
            merge_gap: secs_to_samples(params.silence_pad_sec, sample_rate),
        }
    }

    fn push_run(&self, runs: &mut Vec<(usize, usize)>, start: usize, end: usize) {
        if let Some(last) = runs.last_mut()
            && start - last.1 < self.merge_gap
        {
            last.1 = end;
            return;
        }
        runs.push((start, end));
    }
}

impl EventDetector for EnergyThresholdDetector {
    fn name(&self) -> &'static str {
        "energy-threshold"
    }

    fn duration_policy(&self) -> DurationPolicy {
        DurationPolicy::Discard
    }

    fn detect(&self, buffer: &WaveformBuffer) -> Vec<CandidateSpan> {
        let samples = buffer.samples();
        let mut runs = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, &sample) in samples.iter().enumerate() {
            let active = sample.abs() > self.threshold;
            match (active, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    self.push_run(&mut runs, start, i);
                    run_start = None;
                }
                _ => {}
            }
        }

        // Close a run still open at the end of the buffer
        if let Some(start) = run_start {
            self.push_run(&mut runs, start, samples.len());
        }

        runs.into_iter()
            .filter_map(|(start, end)| CandidateSpan::new(start, end))
            .collect()
    }
}
