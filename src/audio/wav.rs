//! PCM16 WAV encoding.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write interleaved `samples` as 16-bit PCM.
///
/// Samples outside `[-1, 1]` are clipped.
///
/// # Errors
///
/// Returns [`Error::WriteFailure`] if the file cannot be created or written.
pub fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| Error::write_failure(path, e))?;

    for &sample in samples {
        writer
            .write_sample(to_i16(sample))
            .map_err(|e| Error::write_failure(path, e))?;
    }

    writer.finalize().map_err(|e| Error::write_failure(path, e))
}

#[allow(clippy::cast_possible_truncation)]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}
