//! Configuration type definitions.

use crate::audio::FilterSpec;
use crate::constants::{convert, segmentation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Band-pass applied before detection.
    pub filter: FilterSpec,

    /// Event detection settings.
    pub segmentation: SegmentationConfig,

    /// Decoding and resampling settings.
    pub audio: AudioConfig,

    /// Format conversion settings.
    pub convert: ConvertConfig,

    /// Output settings.
    pub output: OutputConfig,

    /// Worker pool settings.
    pub pipeline: PipelineConfig,

    /// Named per-species overrides, selected with `--profile`.
    pub profiles: BTreeMap<String, Profile>,
}

impl Config {
    /// Replace the filter and segmentation tables with those `profile` sets.
    #[must_use]
    pub fn with_profile(mut self, profile: &Profile) -> Self {
        if let Some(filter) = profile.filter {
            self.filter = filter;
        }
        if let Some(segmentation) = &profile.segmentation {
            self.segmentation = segmentation.clone();
        }
        self
    }
}

/// Per-species filter and segmentation settings.
///
/// A table that is present replaces the top-level one; keys missing from it
/// take the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Band-pass override.
    pub filter: Option<FilterSpec>,
    /// Segmentation override.
    pub segmentation: Option<SegmentationConfig>,
}

/// Detection strategy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Split on silent runs, pad and truncate.
    #[default]
    SilenceGap,
    /// Runs above an amplitude threshold, reject out-of-range runs.
    EnergyThreshold,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SilenceGap => write!(f, "silence-gap"),
            Self::EnergyThreshold => write!(f, "energy-threshold"),
        }
    }
}

/// Event detection settings. Immutable while a recording is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Strategy to run.
    pub strategy: Strategy,
    /// Shortest accepted event in milliseconds.
    pub min_event_ms: u32,
    /// Longest accepted event in milliseconds.
    pub max_event_ms: u32,
    /// Silence-gap parameters.
    pub silence_gap: SilenceGapParams,
    /// Energy-threshold parameters.
    pub energy: EnergyParams,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            min_event_ms: segmentation::DEFAULT_MIN_EVENT_MS,
            max_event_ms: segmentation::DEFAULT_MAX_EVENT_MS,
            silence_gap: SilenceGapParams::default(),
            energy: EnergyParams::default(),
        }
    }
}

/// Silence-gap strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceGapParams {
    /// Window RMS at or below this level (dBFS) is silence.
    pub silence_thresh_dbfs: f64,
    /// Shortest silent run that splits events.
    pub min_silence_ms: u32,
    /// Padding re-added around each event.
    pub keep_silence_ms: u32,
    /// Step between loudness windows.
    pub seek_step_ms: u32,
}

impl Default for SilenceGapParams {
    fn default() -> Self {
        Self {
            silence_thresh_dbfs: segmentation::DEFAULT_SILENCE_THRESH_DBFS,
            min_silence_ms: segmentation::DEFAULT_MIN_SILENCE_MS,
            keep_silence_ms: segmentation::DEFAULT_KEEP_SILENCE_MS,
            seek_step_ms: segmentation::DEFAULT_SEEK_STEP_MS,
        }
    }
}

/// Energy-threshold strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyParams {
    /// Linear amplitude a sample must exceed to be active.
    pub amplitude_threshold: f32,
    /// Active runs closer than this (seconds) are merged.
    pub silence_pad_sec: f64,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            amplitude_threshold: segmentation::DEFAULT_AMPLITUDE_THRESHOLD,
            silence_pad_sec: segmentation::DEFAULT_SILENCE_PAD_SEC,
        }
    }
}

/// Decoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Resample decoded audio to this rate before normalization.
    pub target_sample_rate: Option<u32>,
}

/// Conversion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// External `ffmpeg` binary.
    Ffmpeg,
    /// In-process decode, resample and WAV encode.
    Native,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ffmpeg => write!(f, "ffmpeg"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// Format conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Convert non-WAV inputs to PCM WAV before decoding.
    pub enabled: bool,
    /// Sample rate of converted files.
    pub sample_rate: u32,
    /// Channel count of converted files.
    pub channels: u16,
    /// Backends in priority order.
    pub backends: Vec<BackendKind>,
    /// Replace previously converted files.
    pub overwrite: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: convert::DEFAULT_SAMPLE_RATE,
            channels: convert::DEFAULT_CHANNELS,
            backends: vec![BackendKind::Ffmpeg, BackendKind::Native],
            overwrite: false,
        }
    }
}

/// How event clips are named.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EventNaming {
    /// `{stem}_{index:04}.wav`, index of the accepted event.
    #[default]
    Sequence,
    /// `{stem}_{start_sample}.wav`.
    Offset,
}

/// Which waveform event clips are cut from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipSource {
    /// Band-passed signal the detector saw.
    #[default]
    Filtered,
    /// Normalized signal before filtering.
    Normalized,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output root (default: `events/` next to each input).
    pub dir: Option<PathBuf>,
    /// Clip naming scheme.
    pub naming: EventNaming,
    /// Waveform clips are cut from.
    pub clip_source: ClipSource,
    /// Replace existing clips.
    pub overwrite: bool,
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker count (default: `min(4, available CPUs)`).
    pub workers: Option<usize>,
}
