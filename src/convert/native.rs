//! In-process conversion: decode, resample, encode.

use super::ConversionBackend;
use crate::audio::{decode_audio_file, resample, write_pcm16};
use crate::error::Result;
use std::path::Path;

/// Converts with the built-in decoder and resampler.
///
/// Input is mixed down to mono on decode; multi-channel output repeats the
/// mono signal on every channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl ConversionBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn convert(&self, src: &Path, dst: &Path, sample_rate: u32, channels: u16) -> Result<()> {
        let decoded = decode_audio_file(src)?;
        let mono = resample(decoded, sample_rate)?;

        let samples = if channels <= 1 {
            mono.into_samples()
        } else {
            let n = usize::from(channels);
            mono.samples()
                .iter()
                .flat_map(|&s| std::iter::repeat_n(s, n))
                .collect()
        };

        write_pcm16(dst, &samples, sample_rate, channels.max(1))
    }
}
