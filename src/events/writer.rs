//! Event clip writing.
//!
//! Writes each accepted event as a mono PCM16 WAV named after its source
//! recording.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::audio::{WaveformBuffer, write_pcm16};
use crate::config::EventNaming;
use crate::constants::output::CLIP_EXTENSION;
use crate::detect::CandidateSpan;
use crate::error::{Error, Result};
use crate::utils::fs::write_atomically;

/// An accepted span and its audio.
#[derive(Debug, Clone)]
pub struct Event {
    /// Stem of the source recording.
    pub source_id: String,
    /// Position among the recording's accepted events, from 0.
    pub sequence: usize,
    /// Span in the filtered waveform.
    pub span: CandidateSpan,
    /// Samples of the span.
    pub audio: WaveformBuffer,
}

impl Event {
    /// Cut `span` out of `source`.
    #[must_use]
    pub fn from_span(
        source_id: &str,
        sequence: usize,
        span: CandidateSpan,
        source: &WaveformBuffer,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            sequence,
            span,
            audio: source.slice(span.range()),
        }
    }
}

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The clip was written.
    Written(PathBuf),
    /// A clip already existed and overwrite was off.
    SkippedExisting(PathBuf),
}

impl WriteOutcome {
    /// Path of the clip on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::SkippedExisting(path) => path,
        }
    }
}

/// Writes event clips into one directory.
#[derive(Debug, Clone)]
pub struct EventWriter {
    output_dir: PathBuf,
    naming: EventNaming,
    overwrite: bool,
}

impl EventWriter {
    /// Writer for `output_dir`, created on first write.
    #[must_use]
    pub fn new(output_dir: PathBuf, naming: EventNaming, overwrite: bool) -> Self {
        Self {
            output_dir,
            naming,
            overwrite,
        }
    }

    /// Destination path of `event`.
    #[must_use]
    pub fn path_for(&self, event: &Event) -> PathBuf {
        self.output_dir.join(generate_filename(
            &sanitize_filename(&event.source_id),
            self.naming,
            event.sequence,
            event.span.start_sample,
        ))
    }

    /// Write one event.
    ///
    /// An existing clip is left alone unless overwrite is enabled. The clip
    /// is written under a partial name and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] if the directory cannot be created or
    /// the clip cannot be written.
    pub fn write_event(&self, event: &Event) -> Result<WriteOutcome> {
        let path = self.path_for(event);
        if path.exists() && !self.overwrite {
            debug!("Keeping existing clip: {}", path.display());
            return Ok(WriteOutcome::SkippedExisting(path));
        }

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| Error::write_failure(&self.output_dir, e))?;

        write_atomically(&path, |partial| {
            write_pcm16(
                partial,
                event.audio.samples(),
                event.audio.sample_rate(),
                1,
            )
        })?;

        Ok(WriteOutcome::Written(path))
    }

    /// Write every event, continuing past failures.
    ///
    /// Results are in the same order as `events`.
    pub fn write_all(&self, events: &[Event]) -> Vec<Result<WriteOutcome>> {
        events
            .iter()
            .map(|event| {
                let result = self.write_event(event);
                if let Err(e) = &result {
                    warn!(
                        "Skipping event {} of {}: {e}",
                        event.sequence, event.source_id
                    );
                }
                result
            })
            .collect()
    }
}

/// Sanitize a string for use as a filename.
///
/// Replaces characters that are invalid in filenames across platforms
/// and prevents path traversal.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    sanitized.replace("..", "__")
}

/// Generate a clip filename.
///
/// `XC1234_0003.wav` for sequence naming, `XC1234_132300.wav` for offsets.
fn generate_filename(stem: &str, naming: EventNaming, sequence: usize, start_sample: usize) -> String {
    match naming {
        EventNaming::Sequence => format!("{stem}_{sequence:04}.{CLIP_EXTENSION}"),
        EventNaming::Offset => format!("{stem}_{start_sample}.{CLIP_EXTENSION}"),
    }
}
