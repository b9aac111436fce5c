//! Audio decoding using symphonia.

use super::WaveformBuffer;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an audio file to a mono waveform.
///
/// Supports WAV, FLAC, MP3, and AAC formats. Multi-channel audio is mixed
/// down by averaging the channels.
///
/// # Errors
///
/// Returns [`Error::DecodeFailure`] if the file cannot be opened, recognized or
/// decoded.
pub fn decode_audio_file(path: &Path) -> Result<WaveformBuffer> {
    let file = File::open(path).map_err(|e| Error::decode_failure(path, e))?;

    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::decode_failure(path, e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::decode_failure(path, "no audio tracks found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::decode_failure(path, "missing sample rate"))?;
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::decode_failure(path, e))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::decode_failure(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| Error::decode_failure(path, e))?;

        append_mono(&decoded, channels, &mut samples).map_err(|format| {
            Error::decode_failure(path, format!("unsupported sample format: {format}"))
        })?;
    }

    Ok(WaveformBuffer::new(samples, sample_rate))
}

/// Append decoded samples to `output`, averaging channels to mono.
///
/// Fails with the name of the sample format if it is not supported.
fn append_mono(
    buffer: &AudioBufferRef,
    channels: usize,
    output: &mut Vec<f32>,
) -> std::result::Result<(), &'static str> {
    match buffer {
        AudioBufferRef::F32(buf) => mix_down(buf.frames(), channels, output, |ch, i| {
            buf.chan(ch)[i]
        }),
        AudioBufferRef::F64(buf) => {
            #[allow(clippy::cast_possible_truncation)]
            mix_down(buf.frames(), channels, output, |ch, i| buf.chan(ch)[i] as f32);
        }
        AudioBufferRef::S16(buf) => {
            const I16_NORM: f32 = 32768.0;
            mix_down(buf.frames(), channels, output, |ch, i| {
                f32::from(buf.chan(ch)[i]) / I16_NORM
            });
        }
        AudioBufferRef::S24(buf) => {
            const I24_NORM: f32 = 8_388_608.0;
            #[allow(clippy::cast_precision_loss)]
            mix_down(buf.frames(), channels, output, |ch, i| {
                buf.chan(ch)[i].inner() as f32 / I24_NORM
            });
        }
        AudioBufferRef::S32(buf) => {
            const I32_NORM: f32 = 2_147_483_648.0;
            #[allow(clippy::cast_precision_loss)]
            mix_down(buf.frames(), channels, output, |ch, i| {
                buf.chan(ch)[i] as f32 / I32_NORM
            });
        }
        AudioBufferRef::U8(buf) => {
            mix_down(buf.frames(), channels, output, |ch, i| {
                (f32::from(buf.chan(ch)[i]) - 128.0) / 128.0
            });
        }
        AudioBufferRef::U16(_) => return Err("u16"),
        AudioBufferRef::U24(_) => return Err("u24"),
        AudioBufferRef::U32(_) => return Err("u32"),
        AudioBufferRef::S8(_) => return Err("s8"),
    }
    Ok(())
}

fn mix_down(
    frames: usize,
    channels: usize,
    output: &mut Vec<f32>,
    sample: impl Fn(usize, usize) -> f32,
) {
    let channels = channels.max(1);
    output.reserve(frames);
    for i in 0..frames {
        let sum: f32 = (0..channels).map(|ch| sample(ch, i)).sum();
        #[allow(clippy::cast_precision_loss)]
        output.push(sum / channels as f32);
    }
}
