//! Conversion of arbitrary inputs to PCM WAV.
//!
//! Backends are tried in the configured order; the first success wins and
//! the destination looks the same whichever backend produced it.

mod ffmpeg;
mod native;

pub use ffmpeg::FfmpegBackend;
pub use native::NativeBackend;

use crate::config::{BackendKind, ConvertConfig};
use crate::constants::convert::CONVERTED_DIR;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A way of turning `src` into a PCM16 WAV at `dst`.
pub trait ConversionBackend: Send + Sync {
    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    /// Whether this backend can run on this machine.
    fn is_available(&self) -> bool;

    /// Convert `src` into `dst`. `dst` may not exist yet; parents do.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The caller removes any
    /// partial output.
    fn convert(&self, src: &Path, dst: &Path, sample_rate: u32, channels: u16) -> Result<()>;
}

/// Which backend produced a converted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Destination already existed and was reused.
    Reused,
    /// Converted by the named backend.
    Converted(&'static str),
}

/// Prioritized list of conversion backends.
pub struct ConverterChain {
    backends: Vec<Box<dyn ConversionBackend>>,
    overwrite: bool,
}

impl ConverterChain {
    /// Chain over explicit backends, in priority order.
    #[must_use]
    pub fn new(backends: Vec<Box<dyn ConversionBackend>>, overwrite: bool) -> Self {
        Self {
            backends,
            overwrite,
        }
    }

    /// Chain built from the configured backend list.
    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        let backends = config
            .backends
            .iter()
            .map(|kind| -> Box<dyn ConversionBackend> {
                match kind {
                    BackendKind::Ffmpeg => Box::new(FfmpegBackend::default()),
                    BackendKind::Native => Box::new(NativeBackend),
                }
            })
            .collect();
        Self::new(backends, config.overwrite)
    }

    /// Convert `src` to a PCM16 WAV at `dst`.
    ///
    /// An existing `dst` is reused unless overwrite was requested. Each
    /// backend writes to a partial file that is renamed into place on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversionFailed`] listing every backend tried, or
    /// [`Error::OutputDirCreateFailed`] if the destination directory cannot
    /// be created.
    pub fn convert(
        &self,
        src: &Path,
        dst: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Conversion> {
        if dst.exists() && !self.overwrite {
            debug!("Reusing converted file: {}", dst.display());
            return Ok(Conversion::Reused);
        }

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut attempts = Vec::new();
        for backend in &self.backends {
            if !backend.is_available() {
                attempts.push(format!("{}: not available", backend.name()));
                continue;
            }

            let result = crate::utils::fs::write_atomically(dst, |partial| {
                backend.convert(src, partial, sample_rate, channels)
            });
            match result {
                Ok(()) => {
                    info!(
                        "Converted {} -> {} with {} ({} Hz, {} ch)",
                        src.display(),
                        dst.display(),
                        backend.name(),
                        sample_rate,
                        channels
                    );
                    return Ok(Conversion::Converted(backend.name()));
                }
                Err(e) => {
                    warn!("{} failed to convert {}: {e}", backend.name(), src.display());
                    attempts.push(format!("{}: {e}", backend.name()));
                }
            }
        }

        Err(Error::ConversionFailed {
            path: src.to_path_buf(),
            attempts: if attempts.is_empty() {
                "no backends configured".to_string()
            } else {
                attempts.join("; ")
            },
        })
    }
}

/// Whether `path` must be converted before decoding (anything but `.wav`).
#[must_use]
pub fn needs_conversion(path: &Path) -> bool {
    !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Destination of the converted copy of the recording `key` under `output_root`.
#[must_use]
pub fn converted_path_for(key: &str, output_root: &Path) -> PathBuf {
    output_root.join(CONVERTED_DIR).join(format!("{key}.wav"))
}
