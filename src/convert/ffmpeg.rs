//! External `ffmpeg` encoder.

use super::ConversionBackend;
use crate::constants::convert::FFMPEG_BIN;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::debug;

/// Converts through an `ffmpeg` subprocess.
#[derive(Debug)]
pub struct FfmpegBackend {
    binary: PathBuf,
    available: OnceLock<bool>,
}

impl FfmpegBackend {
    /// Backend invoking `binary` instead of `ffmpeg` from `PATH`.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            available: OnceLock::new(),
        }
    }

    fn check_installed(&self) -> bool {
        let ok = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success());
        debug!("{} available: {ok}", self.binary.display());
        ok
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::with_binary(FFMPEG_BIN)
    }
}

impl ConversionBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.check_installed())
    }

    fn convert(&self, src: &Path, dst: &Path, sample_rate: u32, channels: u16) -> Result<()> {
        // dst is a partial name without a .wav extension, so force the muxer
        let output = Command::new(&self.binary)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
            .arg(src)
            .args(["-ac", &channels.to_string()])
            .args(["-ar", &sample_rate.to_string()])
            .args(["-acodec", "pcm_s16le", "-f", "wav"])
            .arg(dst)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::write_failure(dst, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::write_failure(
            dst,
            format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_unavailable() {
        let backend = FfmpegBackend::with_binary("/nonexistent/bin/ffmpeg-does-not-exist");
        assert!(!backend.is_available());
        // Cached
        assert!(!backend.is_available());
    }

    #[test]
    fn test_missing_binary_fails_conversion() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let backend = FfmpegBackend::with_binary("/nonexistent/bin/ffmpeg-does-not-exist");
        let result = backend.convert(
            &dir.path().join("in.mp3"),
            &dir.path().join("out.wav.part"),
            44_100,
            1,
        );
        assert!(matches!(result, Err(Error::WriteFailure { .. })));
    }
}
