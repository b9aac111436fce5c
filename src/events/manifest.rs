//! Per-recording event manifest.
//!
//! One CSV row per event clip on disk. The manifest is written last and
//! atomically, so its presence marks a recording as complete.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::output::MANIFEST_SUFFIX;
use crate::error::{Error, Result};
use crate::events::Event;
use crate::utils::fs::write_atomically;

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Clip file name, relative to the manifest.
    pub file: String,
    /// Sequence number of the event.
    pub index: usize,
    /// First sample of the event in the source.
    pub start_sample: usize,
    /// One past the last sample.
    pub end_sample: usize,
    /// Start time in seconds.
    pub start_s: f64,
    /// End time in seconds.
    pub end_s: f64,
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Peak absolute amplitude of the clip.
    pub peak: f32,
}

impl ManifestRow {
    /// Row describing `event` stored at `clip_path`.
    #[must_use]
    pub fn new(event: &Event, clip_path: &Path) -> Self {
        let sample_rate = event.audio.sample_rate();
        Self {
            file: clip_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            index: event.sequence,
            start_sample: event.span.start_sample,
            end_sample: event.span.end_sample,
            start_s: round_to(event.span.start_secs(sample_rate), 4),
            end_s: round_to(event.span.end_secs(sample_rate), 4),
            duration_ms: round_to(event.span.duration_ms(sample_rate), 2),
            peak: event.audio.peak(),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Manifest path for the recording `stem` in `output_dir`.
#[must_use]
pub fn manifest_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{stem}{MANIFEST_SUFFIX}"))
}

/// Write `rows` to `path` atomically, header included even when empty.
///
/// # Errors
///
/// Returns [`Error::ManifestWrite`] if the CSV cannot be written, or
/// [`Error::WriteFailure`] if it cannot be moved into place.
pub fn write_manifest(path: &Path, rows: &[ManifestRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::write_failure(parent, e))?;
    }

    write_atomically(path, |partial| {
        let manifest_err = |source: csv::Error| Error::ManifestWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(partial)
            .map_err(manifest_err)?;
        writer
            .write_record([
                "file",
                "index",
                "start_sample",
                "end_sample",
                "start_s",
                "end_s",
                "duration_ms",
                "peak",
            ])
            .map_err(manifest_err)?;
        for row in rows {
            writer.serialize(row).map_err(manifest_err)?;
        }
        writer
            .flush()
            .map_err(|e| Error::write_failure(partial, e))
    })
}

/// Read a manifest written by [`write_manifest`].
///
/// # Errors
///
/// Returns [`Error::ManifestWrite`] wrapping the CSV error if the file is
/// missing or malformed.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>> {
    let manifest_err = |source: csv::Error| Error::ManifestWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(manifest_err)?;

    reader
        .deserialize::<ManifestRow>()
        .map(|row| row.map_err(manifest_err))
        .collect()
}
