//! Error types for flightcall.

use std::path::PathBuf;

/// Result type alias for flightcall operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for flightcall.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Requested segmentation profile is not defined.
    #[error("profile '{name}' not found in configuration")]
    ProfileNotFound {
        /// Name of the missing profile.
        name: String,
    },

    /// No audio files found in the given inputs.
    #[error("no valid audio files found in the provided paths")]
    NoInputFiles,

    /// Source file could not be read as audio.
    #[error("failed to decode audio from '{path}'")]
    DecodeFailure {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Band-pass cutoffs violate ordering or the Nyquist limit.
    #[error(
        "invalid filter spec: {low_hz} Hz - {high_hz} Hz (order {order}) at {sample_rate} Hz: {reason}"
    )]
    InvalidFilterSpec {
        /// Lower cutoff in Hz.
        low_hz: f64,
        /// Upper cutoff in Hz.
        high_hz: f64,
        /// Butterworth prototype order.
        order: u32,
        /// Sample rate the filter was designed for.
        sample_rate: u32,
        /// Which invariant was violated.
        reason: String,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Every configured conversion backend failed.
    #[error("failed to convert '{path}' (tried: {attempts})")]
    ConversionFailed {
        /// Source file.
        path: PathBuf,
        /// Backends tried with their failure reasons.
        attempts: String,
    },

    /// Destination could not be created or written.
    #[error("failed to write '{path}'")]
    WriteFailure {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the event manifest.
    #[error("failed to write event manifest '{path}'")]
    ManifestWrite {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to serialize the batch summary.
    #[error("failed to serialize summary")]
    SummarySerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Some recordings failed or some event clips could not be written.
    #[error("{failed} recording(s) failed and {write_failures} event clip(s) could not be written")]
    BatchIncomplete {
        /// Recordings that failed.
        failed: usize,
        /// Event clips that failed to write.
        write_failures: usize,
    },

    /// The run was interrupted before every recording was started.
    #[error("interrupted")]
    Interrupted,

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Wrap an I/O or encoder error raised while writing `path`.
    pub fn write_failure(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Wrap a decoder error raised while reading `path`.
    pub fn decode_failure(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::DecodeFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}
