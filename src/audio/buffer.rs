//! In-memory mono waveform.

use std::ops::Range;

/// One mono audio signal and its sample rate.
///
/// Multi-channel sources are mixed down before a buffer is constructed, so
/// every buffer that reaches normalization, filtering or detection is mono.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl WaveformBuffer {
    /// Wrap mono samples recorded at `sample_rate` Hz.
    #[must_use]
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Audio samples, nominally in [-1.0, 1.0].
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Always 1.
    #[must_use]
    pub const fn channel_count(&self) -> u16 {
        1
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the buffer holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Copy `range` into a new buffer at the same sample rate.
    ///
    /// The range is clamped to the buffer extent.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.samples.len());
        let start = range.start.min(end);
        Self::new(self.samples[start..end].to_vec(), self.sample_rate)
    }

    /// Take ownership of the samples.
    #[must_use]
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Convert a millisecond duration to a sample count at `sample_rate`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ms_to_samples(ms: u32, sample_rate: u32) -> usize {
    (u64::from(ms) * u64::from(sample_rate) / 1000) as usize
}

/// Convert a duration in seconds to a sample count at `sample_rate`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    (secs.max(0.0) * f64::from(sample_rate)).round() as usize
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_uses_absolute_value() {
        let buf = WaveformBuffer::new(vec![0.1, -0.7, 0.5], 8000);
        assert_eq!(buf.peak(), 0.7);
    }

    #[test]
    fn test_slice_clamps_to_extent() {
        let buf = WaveformBuffer::new(vec![0.0, 1.0, 2.0, 3.0], 8000);
        assert_eq!(buf.slice(1..3).samples(), &[1.0, 2.0]);
        assert_eq!(buf.slice(2..10).samples(), &[2.0, 3.0]);
        assert!(buf.slice(9..12).is_empty());
    }

    #[test]
    fn test_duration_secs() {
        let buf = WaveformBuffer::new(vec![0.0; 22_050], 44_100);
        assert_eq!(buf.duration_secs(), 0.5);
        assert_eq!(buf.channel_count(), 1);
    }

    #[test]
    fn test_ms_to_samples() {
        assert_eq!(ms_to_samples(500, 44_100), 22_050);
        assert_eq!(ms_to_samples(1, 8000), 8);
        assert_eq!(ms_to_samples(0, 48_000), 0);
    }

    #[test]
    fn test_secs_to_samples() {
        assert_eq!(secs_to_samples(0.05, 22_050), 1103);
        assert_eq!(secs_to_samples(-1.0, 22_050), 0);
    }
}
