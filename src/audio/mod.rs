//! Audio processing pipeline.

mod buffer;
mod decode;
mod filter;
mod normalize;
mod resample;
mod wav;

pub use buffer::{WaveformBuffer, ms_to_samples, secs_to_samples};
pub use decode::decode_audio_file;
pub use filter::{BandpassFilter, FilterSpec, bandpass};
pub use normalize::{Normalized, normalize};
pub use resample::resample;
pub use wav::write_pcm16;
