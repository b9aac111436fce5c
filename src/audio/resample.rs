//! Audio resampling using rubato.

use super::WaveformBuffer;
use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Resample a waveform to `to_rate` using FFT-based band-limited
/// interpolation.
///
/// Returns the input unchanged if already at the target rate. Must run
/// before peak normalization, since interpolation can create new peaks.
///
/// # Errors
///
/// Returns [`Error::Resample`] if the resampler cannot be constructed or
/// fails while processing.
pub fn resample(buffer: WaveformBuffer, to_rate: u32) -> Result<WaveformBuffer> {
    let from_rate = buffer.sample_rate();
    if from_rate == to_rate {
        return Ok(buffer);
    }
    if to_rate == 0 {
        return Err(Error::Resample {
            reason: "target sample rate must be positive".to_string(),
        });
    }

    let samples = buffer.into_samples();
    let resampled = resample_samples(&samples, from_rate, to_rate)?;
    Ok(WaveformBuffer::new(resampled, to_rate))
}

fn resample_samples(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let chunk_size = 1024;
    let sub_chunks = 1;
    let channels = 1;

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        chunk_size,
        sub_chunks,
        channels,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let input_frames_needed = resampler.input_frames_next();
    let mut output = Vec::with_capacity(estimate_output_len(samples.len(), from_rate, to_rate));

    let mut pos = 0;
    while pos + input_frames_needed <= samples.len() {
        let chunk = &samples[pos..pos + input_frames_needed];
        output.extend_from_slice(&process_chunk(&mut resampler, chunk, input_frames_needed)?);
        pos += input_frames_needed;
    }

    // Pad the tail and keep only its proportional share of output
    if pos < samples.len() {
        let remaining = samples.len() - pos;
        let mut padded = samples[pos..].to_vec();
        padded.resize(input_frames_needed, 0.0);

        let output_data = process_chunk(&mut resampler, &padded, input_frames_needed)?;

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let output_frames =
            (remaining as f64 * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize;

        let take_count = output_frames.min(output_data.len());
        output.extend_from_slice(&output_data[..take_count]);
    }

    Ok(output)
}

fn process_chunk(
    resampler: &mut Fft<f32>,
    chunk: &[f32],
    frames: usize,
) -> Result<Vec<f32>> {
    let input_adapter = SequentialSlice::new(chunk, 1, frames).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;

    let resampled = resampler
        .process(&input_adapter, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;

    Ok(resampled.take_data())
}

/// Estimate output length after resampling.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn estimate_output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    ((input_len as f64) * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize + 1024
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate_returns_input() {
        let buf = WaveformBuffer::new(vec![0.1, 0.2, 0.3, 0.4, 0.5], 44_100);
        let result = resample(buf.clone(), 44_100).unwrap();
        assert_eq!(result, buf);
    }

    #[test]
    fn test_resample_downsample() {
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..48_000).map(|i| (i as f32 * 0.001).sin()).collect();
        let output = resample(WaveformBuffer::new(samples, 48_000), 22_050).unwrap();
        assert_eq!(output.sample_rate(), 22_050);
        assert!(output.len() > 19_000);
        assert!(output.len() < 25_000);
    }

    #[test]
    fn test_resample_upsample() {
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..22_050).map(|i| (i as f32 * 0.001).sin()).collect();
        let output = resample(WaveformBuffer::new(samples, 22_050), 44_100).unwrap();
        assert_eq!(output.sample_rate(), 44_100);
        assert!(output.len() > 40_000);
        assert!(output.len() < 50_000);
    }

    #[test]
    fn test_resample_zero_target_rate_fails() {
        let result = resample(WaveformBuffer::new(vec![0.0; 16], 8000), 0);
        assert!(matches!(result, Err(Error::Resample { .. })));
    }
}
