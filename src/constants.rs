//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "flightcall";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FLIGHTCALL_CONFIG";

/// Peak amplitude at or below which a buffer is treated as silent (-120 dBFS).
pub const SILENCE_EPSILON: f32 = 1e-6;

/// Upper bound on worker threads when none is configured.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Band-pass defaults.
pub mod filter {
    /// Default lower cutoff in Hz.
    pub const DEFAULT_LOW_HZ: f64 = 2000.0;
    /// Default upper cutoff in Hz.
    pub const DEFAULT_HIGH_HZ: f64 = 10_000.0;
    /// Default Butterworth prototype order.
    pub const DEFAULT_ORDER: u32 = 4;
    /// Highest prototype order accepted.
    pub const MAX_ORDER: u32 = 10;
}

/// Segmentation defaults shared by both strategies.
pub mod segmentation {
    /// Shortest accepted event in milliseconds.
    pub const DEFAULT_MIN_EVENT_MS: u32 = 150;
    /// Longest accepted event in milliseconds.
    pub const DEFAULT_MAX_EVENT_MS: u32 = 1000;

    /// Silence threshold in dBFS.
    pub const DEFAULT_SILENCE_THRESH_DBFS: f64 = -50.0;
    /// Minimum silent run that splits events, in milliseconds.
    pub const DEFAULT_MIN_SILENCE_MS: u32 = 500;
    /// Padding kept around each event, in milliseconds.
    pub const DEFAULT_KEEP_SILENCE_MS: u32 = 200;
    /// Step between loudness windows, in milliseconds.
    pub const DEFAULT_SEEK_STEP_MS: u32 = 1;

    /// Linear amplitude above which a sample is active.
    pub const DEFAULT_AMPLITUDE_THRESHOLD: f32 = 0.02;
    /// Gaps shorter than this (seconds) are merged into one event.
    pub const DEFAULT_SILENCE_PAD_SEC: f64 = 0.05;
}

/// Format conversion defaults.
pub mod convert {
    /// Sample rate of converted WAV files.
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
    /// Channel count of converted WAV files.
    pub const DEFAULT_CHANNELS: u16 = 1;
    /// Subdirectory of the output root holding converted sources.
    pub const CONVERTED_DIR: &str = "converted";
    /// External encoder binary.
    pub const FFMPEG_BIN: &str = "ffmpeg";
}

/// Output naming.
pub mod output {
    /// Default output directory name, created next to the inputs.
    pub const DEFAULT_OUTPUT_DIR: &str = "events";
    /// Suffix of the per-recording event manifest.
    pub const MANIFEST_SUFFIX: &str = ".events.csv";
    /// Suffix of in-progress files, renamed into place when complete.
    pub const PARTIAL_SUFFIX: &str = ".part";
    /// Extension of event clips.
    pub const CLIP_EXTENSION: &str = "wav";
}

/// Audio extensions accepted as inputs.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "m4a", "aac", "ogg", "opus"];
