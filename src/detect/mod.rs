//! Event detection strategies.
//!
//! A detector turns a filtered waveform into candidate spans. The duration
//! filter then applies the strategy's [`DurationPolicy`] to produce the
//! accepted spans that become events.

mod energy;
mod silence_gap;

pub use energy::EnergyThresholdDetector;
pub use silence_gap::SilenceGapDetector;

use crate::audio::{WaveformBuffer, ms_to_samples};
use crate::config::{SegmentationConfig, Strategy};
use serde::Serialize;

/// A half-open `[start_sample, end_sample)` range in the filtered waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CandidateSpan {
    /// First sample of the span.
    pub start_sample: usize,
    /// One past the last sample of the span.
    pub end_sample: usize,
}

impl CandidateSpan {
    /// Build a span; `None` when `end_sample <= start_sample`.
    #[must_use]
    pub const fn new(start_sample: usize, end_sample: usize) -> Option<Self> {
        if end_sample > start_sample {
            Some(Self {
                start_sample,
                end_sample,
            })
        } else {
            None
        }
    }

    /// Length in samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end_sample - self.start_sample
    }

    /// Always false; spans are non-empty by construction.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Start time in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn start_secs(&self, sample_rate: u32) -> f64 {
        self.start_sample as f64 / f64::from(sample_rate)
    }

    /// End time in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn end_secs(&self, sample_rate: u32) -> f64 {
        self.end_sample as f64 / f64::from(sample_rate)
    }

    /// Duration in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_ms(&self, sample_rate: u32) -> f64 {
        self.len() as f64 * 1000.0 / f64::from(sample_rate)
    }

    /// Sample range, for slicing.
    #[must_use]
    pub const fn range(&self) -> std::ops::Range<usize> {
        self.start_sample..self.end_sample
    }
}

/// What happens to a span longer than the maximum event duration.
///
/// Spans shorter than the minimum are dropped under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPolicy {
    /// Keep the first `max` samples, anchored at the original start.
    Truncate,
    /// Drop the span entirely.
    Discard,
}

/// Accepted event length range, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationBounds {
    /// Shortest accepted span.
    pub min_samples: usize,
    /// Longest accepted span.
    pub max_samples: usize,
}

impl DurationBounds {
    /// Bounds from millisecond limits at `sample_rate`.
    #[must_use]
    pub fn from_ms(min_ms: u32, max_ms: u32, sample_rate: u32) -> Self {
        Self {
            min_samples: ms_to_samples(min_ms, sample_rate),
            max_samples: ms_to_samples(max_ms, sample_rate),
        }
    }
}

/// A strategy that finds candidate event spans in a filtered waveform.
pub trait EventDetector: Send + Sync {
    /// Short name for logs and manifests.
    fn name(&self) -> &'static str;

    /// Policy the duration filter applies to this strategy's spans.
    fn duration_policy(&self) -> DurationPolicy;

    /// Candidate spans in ascending start order, pairwise disjoint.
    fn detect(&self, buffer: &WaveformBuffer) -> Vec<CandidateSpan>;
}

/// Apply duration bounds under `policy`.
#[must_use]
pub fn filter_by_duration(
    spans: Vec<CandidateSpan>,
    bounds: DurationBounds,
    policy: DurationPolicy,
) -> Vec<CandidateSpan> {
    spans
        .into_iter()
        .filter(|span| span.len() >= bounds.min_samples)
        .filter_map(|span| {
            if span.len() <= bounds.max_samples {
                return Some(span);
            }
            match policy {
                DurationPolicy::Truncate => {
                    CandidateSpan::new(span.start_sample, span.start_sample + bounds.max_samples)
                }
                DurationPolicy::Discard => None,
            }
        })
        .collect()
}

/// Build the detector selected by `config` for a buffer at `sample_rate`.
#[must_use]
pub fn build_detector(config: &SegmentationConfig, sample_rate: u32) -> Box<dyn EventDetector> {
    match config.strategy {
        Strategy::SilenceGap => Box::new(SilenceGapDetector::new(&config.silence_gap, sample_rate)),
        Strategy::EnergyThreshold => {
            Box::new(EnergyThresholdDetector::new(&config.energy, sample_rate))
        }
    }
}

/// Detect and duration-filter spans in one step.
#[must_use]
pub fn segment(buffer: &WaveformBuffer, config: &SegmentationConfig) -> Segmentation {
    let detector = build_detector(config, buffer.sample_rate());
    let candidates = detector.detect(buffer);
    let candidate_count = candidates.len();
    let bounds = DurationBounds::from_ms(
        config.min_event_ms,
        config.max_event_ms,
        buffer.sample_rate(),
    );
    let accepted = filter_by_duration(candidates, bounds, detector.duration_policy());
    Segmentation {
        strategy: detector.name(),
        policy: detector.duration_policy(),
        candidate_count,
        accepted,
    }
}

/// Result of [`segment`].
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Name of the strategy used.
    pub strategy: &'static str,
    /// Over-long policy that was applied.
    pub policy: DurationPolicy,
    /// Spans found before the duration filter.
    pub candidate_count: usize,
    /// Spans that passed the duration filter.
    pub accepted: Vec<CandidateSpan>,
}
