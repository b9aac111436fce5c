//! Peak normalization.

use super::WaveformBuffer;
use crate::constants::SILENCE_EPSILON;

/// Outcome of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Samples were scaled so the peak absolute amplitude is 1.0.
    Scaled {
        /// The rescaled buffer.
        buffer: WaveformBuffer,
        /// Linear gain that was applied.
        gain: f32,
    },
    /// Peak was at or below [`SILENCE_EPSILON`]; the buffer is unchanged.
    Silent(WaveformBuffer),
}

impl Normalized {
    /// True when the input was silent.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Silent(_))
    }

    /// The resulting buffer, scaled or not.
    #[must_use]
    pub fn into_buffer(self) -> WaveformBuffer {
        match self {
            Self::Scaled { buffer, .. } | Self::Silent(buffer) => buffer,
        }
    }
}

/// Scale `buffer` so its peak absolute amplitude equals 1.0.
///
/// Silent input is not an error. It comes back untouched as
/// [`Normalized::Silent`] and later stages detect zero events in it.
#[must_use]
pub fn normalize(buffer: WaveformBuffer) -> Normalized {
    let peak = buffer.peak();
    if !peak.is_finite() || peak <= SILENCE_EPSILON {
        return Normalized::Silent(buffer);
    }

    let gain = 1.0 / peak;
    let sample_rate = buffer.sample_rate();
    let samples = buffer
        .into_samples()
        .into_iter()
        .map(|s| (s * gain).clamp(-1.0, 1.0))
        .collect();

    Normalized::Scaled {
        buffer: WaveformBuffer::new(samples, sample_rate),
        gain,
    }
}
