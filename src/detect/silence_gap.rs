//! Split on silent runs, then pad the surviving material.

use super::{CandidateSpan, DurationPolicy, EventDetector};
use crate::audio::{WaveformBuffer, ms_to_samples};
use crate::config::SilenceGapParams;

/// Finds events as the non-silent material between silent runs.
///
/// Loudness is the RMS of a `min_silence_ms` window, in dBFS relative to
/// full scale. The window slides in `seek_step_ms` steps; windows at or
/// below the threshold are silent, and overlapping silent windows merge
/// into one silent run. Spans between runs are padded by `keep_silence_ms`
/// on each side, never past the midpoint to a neighbour.
#[derive(Debug, Clone)]
pub struct SilenceGapDetector {
    window: usize,
    step: usize,
    keep: usize,
    threshold_rms: f64,
}

impl SilenceGapDetector {
    /// Detector for buffers at `sample_rate`.
    #[must_use]
    pub fn new(params: &SilenceGapParams, sample_rate: u32) -> Self {
        Self {
            window: ms_to_samples(params.min_silence_ms, sample_rate).max(1),
            step: ms_to_samples(params.seek_step_ms, sample_rate).max(1),
            keep: ms_to_samples(params.keep_silence_ms, sample_rate),
            threshold_rms: 10f64.powf(params.silence_thresh_dbfs / 20.0),
        }
    }

    /// Silent runs as `[start, end)` sample ranges, ascending.
    fn silent_runs(&self, samples: &[f32]) -> Vec<(usize, usize)> {
        let n = samples.len();
        let energy = PrefixEnergy::new(samples);

        // Too short for one full window: judge the whole buffer at once
        if n < self.window {
            return if energy.rms(0, n) <= self.threshold_rms {
                vec![(0, n)]
            } else {
                Vec::new()
            };
        }

        let last_start = n - self.window;
        let mut starts: Vec<usize> = (0..=last_start).step_by(self.step).collect();
        if starts.last() != Some(&last_start) {
            starts.push(last_start);
        }

        let mut runs: Vec<(usize, usize)> = Vec::new();
        for start in starts {
            if energy.rms(start, self.window) > self.threshold_rms {
                continue;
            }
            let end = start + self.window;
            match runs.last_mut() {
                Some(run) if start <= run.1 => run.1 = end,
                _ => runs.push((start, end)),
            }
        }
        runs
    }
}

impl EventDetector for SilenceGapDetector {
    fn name(&self) -> &'static str {
        "silence-gap"
    }

    fn duration_policy(&self) -> DurationPolicy {
        DurationPolicy::Truncate
    }

    fn detect(&self, buffer: &WaveformBuffer) -> Vec<CandidateSpan> {
        let samples = buffer.samples();
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let mut nonsilent = Vec::new();
        let mut cursor = 0;
        for (start, end) in self.silent_runs(samples) {
            nonsilent.push((cursor, start));
            cursor = end;
        }
        nonsilent.push((cursor, n));
        nonsilent.retain(|(start, end)| end > start);

        pad_without_overlap(&mut nonsilent, self.keep, n);

        nonsilent
            .into_iter()
            .filter_map(|(start, end)| CandidateSpan::new(start, end))
            .collect()
    }
}

/// Widen each range by `keep` on both sides, clipped to `[0, len)`.
///
/// Where padding makes neighbours overlap, both are cut at the midpoint of
/// the overlap.
fn pad_without_overlap(ranges: &mut [(usize, usize)], keep: usize, len: usize) {
    for range in ranges.iter_mut() {
        range.0 = range.0.saturating_sub(keep);
        range.1 = (range.1 + keep).min(len);
    }
    for i in 1..ranges.len() {
        let prev_end = ranges[i - 1].1;
        let next_start = ranges[i].0;
        if next_start < prev_end {
            let mid = (prev_end + next_start) / 2;
            ranges[i - 1].1 = mid;
            ranges[i].0 = mid;
        }
    }
}

/// Cumulative sum of squares for O(1) window RMS.
struct PrefixEnergy {
    sums: Vec<f64>,
}

impl PrefixEnergy {
    fn new(samples: &[f32]) -> Self {
        let mut sums = Vec::with_capacity(samples.len() + 1);
        let mut acc = 0.0f64;
        sums.push(acc);
        for &s in samples {
            acc += f64::from(s) * f64::from(s);
            sums.push(acc);
        }
        Self { sums }
    }

    #[allow(clippy::cast_precision_loss)]
    fn rms(&self, start: usize, len: usize) -> f64 {
        if len == 0 {
            return 0.0;
        }
        let energy = (self.sums[start + len] - self.sums[start]).max(0.0);
        (energy / len as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8000;

    fn params(min_silence_ms: u32, keep_silence_ms: u32) -> SilenceGapParams {
        SilenceGapParams {
            silence_thresh_dbfs: -50.0,
            min_silence_ms,
            keep_silence_ms,
            seek_step_ms: 1,
        }
    }

    /// Silence with constant-level blocks at the given sample ranges.
    fn blocks(len: usize, bursts: &[(usize, usize)]) -> WaveformBuffer {
        let mut samples = vec![0.0f32; len];
        for &(start, end) in bursts {
            for s in &mut samples[start..end] {
                *s = 0.5;
            }
        }
        WaveformBuffer::new(samples, SR)
    }

    fn spans(detector: &SilenceGapDetector, buf: &WaveformBuffer) -> Vec<(usize, usize)> {
        detector
            .detect(buf)
            .into_iter()
            .map(|s| (s.start_sample, s.end_sample))
            .collect()
    }

    #[test]
    fn test_splits_on_long_silence() {
        let detector = SilenceGapDetector::new(&params(500, 0), SR);
        let buf = blocks(80_000, &[(8000, 10_400), (32_000, 34_400)]);
        assert_eq!(spans(&detector, &buf), vec![(8000, 10_400), (32_000, 34_400)]);
    }

    #[test]
    fn test_short_gap_does_not_split() {
        let detector = SilenceGapDetector::new(&params(500, 0), SR);
        // 100 ms gap between the blocks, shorter than the 500 ms window
        let buf = blocks(40_000, &[(8000, 9600), (10_400, 12_000)]);
        assert_eq!(spans(&detector, &buf), vec![(8000, 12_000)]);
    }

    #[test]
    fn test_padding_is_clipped_to_recording() {
        let detector = SilenceGapDetector::new(&params(500, 200), SR);
        let buf = blocks(40_000, &[(0, 2400), (36_000, 40_000)]);
        assert_eq!(spans(&detector, &buf), vec![(0, 4000), (34_400, 40_000)]);
    }

    #[test]
    fn test_padding_never_invades_neighbour() {
        // 600 ms gap with 400 ms padding each side: overlap is split at the midpoint
        let detector = SilenceGapDetector::new(&params(500, 400), SR);
        let buf = blocks(60_000, &[(8000, 10_000), (14_800, 16_800)]);
        let found = spans(&detector, &buf);
        assert_eq!(found, vec![(4800, 12_400), (12_400, 20_000)]);
    }

    #[test]
    fn test_all_silent_yields_nothing() {
        let detector = SilenceGapDetector::new(&params(500, 200), SR);
        assert!(detector.detect(&blocks(40_000, &[])).is_empty());
    }

    #[test]
    fn test_short_silent_buffer_yields_nothing() {
        let detector = SilenceGapDetector::new(&params(500, 200), SR);
        assert!(detector.detect(&blocks(100, &[])).is_empty());
    }

    #[test]
    fn test_no_silence_is_one_span() {
        let detector = SilenceGapDetector::new(&params(500, 200), SR);
        let buf = blocks(20_000, &[(0, 20_000)]);
        assert_eq!(spans(&detector, &buf), vec![(0, 20_000)]);
    }

    #[test]
    fn test_quiet_noise_below_threshold_is_silence() {
        let detector = SilenceGapDetector::new(&params(500, 0), SR);
        let mut buf = blocks(40_000, &[(16_000, 18_000)]).into_samples();
        // -60 dBFS hiss
        for (i, s) in buf.iter_mut().enumerate() {
            if *s == 0.0 {
                *s = if i % 2 == 0 { 0.001 } else { -0.001 };
            }
        }
        let found = spans(&detector, &WaveformBuffer::new(buf, SR));
        assert_eq!(found, vec![(16_000, 18_000)]);
    }

    #[test]
    fn test_spans_are_sorted_and_disjoint() {
        let detector = SilenceGapDetector::new(&params(300, 250), SR);
        let buf = blocks(
            100_000,
            &[(4000, 5000), (12_000, 13_000), (20_000, 21_000), (40_000, 44_000)],
        );
        let found = detector.detect(&buf);
        assert_eq!(found.len(), 4);
        for pair in found.windows(2) {
            assert!(pair[0].end_sample <= pair[1].start_sample);
        }
    }
}
