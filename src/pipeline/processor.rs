//! Single recording processing pipeline.

use crate::audio::{
    BandpassFilter, Normalized, WaveformBuffer, decode_audio_file, normalize, resample,
};
use crate::config::{ClipSource, Config};
use crate::convert::{Conversion, ConverterChain, converted_path_for, needs_conversion};
use crate::detect::segment;
use crate::error::Result;
use crate::events::{Event, EventWriter, ManifestRow, WriteOutcome, manifest_path, write_manifest};
use crate::pipeline::{Recording, output_root_for, plan_recordings, recording_dir_for};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-run switches that are not part of the configuration file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Reprocess recordings whose manifest already exists.
    pub force: bool,
    /// Detect events but write nothing.
    pub dry_run: bool,
}

/// Counts and timings for one processed recording.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingReport {
    /// Input file.
    pub input: PathBuf,
    /// Directory holding the clips and manifest.
    pub output_dir: PathBuf,
    /// Backend that converted the input, if it was converted.
    pub converted_with: Option<&'static str>,
    /// Sample rate events were detected at.
    pub sample_rate: u32,
    /// Length of the recording in seconds.
    pub duration_s: f64,
    /// Peak was below the silence floor.
    pub silent: bool,
    /// Strategy that produced the spans.
    pub strategy: &'static str,
    /// Spans found before the duration filter.
    pub candidates: usize,
    /// Spans that passed the duration filter.
    pub accepted: usize,
    /// Clips written by this run.
    pub written: usize,
    /// Clips that already existed and were kept.
    pub kept_existing: usize,
    /// Events whose clip could not be written.
    pub write_failures: usize,
    /// Wall time spent on the recording.
    pub elapsed_s: f64,
}

/// Everything needed to turn one recording into event clips.
pub struct Pipeline {
    config: Config,
    converter: ConverterChain,
    options: RunOptions,
}

impl Pipeline {
    /// Pipeline over a validated configuration.
    #[must_use]
    pub fn new(config: Config, options: RunOptions) -> Self {
        let converter = ConverterChain::from_config(&config.convert);
        Self {
            config,
            converter,
            options,
        }
    }

    /// Pipeline with an explicit converter, for custom backends.
    #[must_use]
    pub fn with_converter(config: Config, options: RunOptions, converter: ConverterChain) -> Self {
        Self {
            config,
            converter,
            options,
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run options in effect.
    #[must_use]
    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Output root for `input`.
    #[must_use]
    pub fn output_root_for(&self, input: &Path) -> PathBuf {
        output_root_for(input, self.config.output.dir.as_deref())
    }

    /// Key every input of a batch; see [`plan_recordings`].
    #[must_use]
    pub fn plan(&self, files: &[PathBuf]) -> Vec<Recording> {
        plan_recordings(files, |input| self.output_root_for(input))
    }

    /// Process `input` on its own, keyed by its stem.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::process_recording`].
    pub fn process(&self, input: &Path) -> Result<RecordingReport> {
        self.process_recording(&Recording::new(input))
    }

    /// Process one recording: decode, normalize, filter, detect, write.
    ///
    /// Write failures of individual events are counted, not returned; the
    /// manifest is only written when every event made it to disk, so an
    /// incomplete recording is retried on the next run.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be converted or decoded, the
    /// filter is invalid for its sample rate, or the manifest cannot be
    /// written.
    pub fn process_recording(&self, recording: &Recording) -> Result<RecordingReport> {
        let start_time = Instant::now();
        let input = recording.input.as_path();
        info!("Processing: {}", input.display());

        let stem = recording.key.as_str();
        let output_root = self.output_root_for(input);
        let output_dir = recording_dir_for(recording, &output_root);

        let (buffer, converted_with) = self.load(recording, &output_root)?;
        let buffer = match self.config.audio.target_sample_rate {
            Some(rate) if rate != buffer.sample_rate() => {
                debug!("Resampling from {} Hz to {} Hz", buffer.sample_rate(), rate);
                resample(buffer, rate)?
            }
            _ => buffer,
        };
        let sample_rate = buffer.sample_rate();
        let duration_s = buffer.duration_secs();
        debug!("Decoded {duration_s:.1}s at {sample_rate} Hz");

        // Rejected before any sample is touched
        let filter = BandpassFilter::design(&self.config.filter, sample_rate)?;

        let normalized = normalize(buffer);
        let silent = normalized.is_silent();
        if let Normalized::Scaled { gain, .. } = &normalized {
            debug!("Normalized with gain {gain:.3}");
        } else {
            info!("Silent input, no events expected: {}", input.display());
        }
        let normalized = normalized.into_buffer();

        let (filtered, clip_source) = match self.config.output.clip_source {
            ClipSource::Filtered => (filter.apply(normalized), None),
            ClipSource::Normalized => (filter.apply(normalized.clone()), Some(normalized)),
        };
        debug!(
            "Filtered {}-{} Hz, {} sections",
            self.config.filter.low_hz,
            self.config.filter.high_hz,
            filter.section_count()
        );

        let segmentation = segment(&filtered, &self.config.segmentation);
        debug!(
            "{}: {} candidates, {} accepted ({:?} policy)",
            segmentation.strategy,
            segmentation.candidate_count,
            segmentation.accepted.len(),
            segmentation.policy
        );

        let source = clip_source.as_ref().unwrap_or(&filtered);
        let events: Vec<Event> = segmentation
            .accepted
            .iter()
            .enumerate()
            .map(|(i, span)| Event::from_span(stem, i, *span, source))
            .collect();

        let mut report = RecordingReport {
            input: input.to_path_buf(),
            output_dir: output_dir.clone(),
            converted_with,
            sample_rate,
            duration_s,
            silent,
            strategy: segmentation.strategy,
            candidates: segmentation.candidate_count,
            accepted: events.len(),
            written: 0,
            kept_existing: 0,
            write_failures: 0,
            elapsed_s: 0.0,
        };

        if !self.options.dry_run {
            self.write_events(&events, stem, &output_dir, &mut report)?;
        }

        report.elapsed_s = start_time.elapsed().as_secs_f64();
        info!(
            "{}: {} events ({} written, {} kept, {} failed) in {:.2}s",
            stem,
            report.accepted,
            report.written,
            report.kept_existing,
            report.write_failures,
            report.elapsed_s
        );
        Ok(report)
    }

    /// Decode the input, converting it first when it is not a WAV.
    fn load(
        &self,
        recording: &Recording,
        output_root: &Path,
    ) -> Result<(WaveformBuffer, Option<&'static str>)> {
        let input = recording.input.as_path();
        let convert = &self.config.convert;
        if !convert.enabled || self.options.dry_run || !needs_conversion(input) {
            return Ok((decode_audio_file(input)?, None));
        }

        // The converted rate is known, so a bad band fails before conversion
        let detection_rate = self
            .config
            .audio
            .target_sample_rate
            .unwrap_or(convert.sample_rate);
        self.config.filter.validate(detection_rate)?;

        let converted = converted_path_for(&recording.key, output_root);
        let backend = match self.converter.convert(
            input,
            &converted,
            convert.sample_rate,
            convert.channels,
        )? {
            Conversion::Converted(name) => Some(name),
            Conversion::Reused => None,
        };
        Ok((decode_audio_file(&converted)?, backend))
    }

    fn write_events(
        &self,
        events: &[Event],
        stem: &str,
        output_dir: &Path,
        report: &mut RecordingReport,
    ) -> Result<()> {
        let writer = EventWriter::new(
            output_dir.to_path_buf(),
            self.config.output.naming,
            self.config.output.overwrite,
        );

        let mut rows = Vec::with_capacity(events.len());
        for (event, result) in events.iter().zip(writer.write_all(events)) {
            match result {
                Ok(outcome) => {
                    match &outcome {
                        WriteOutcome::Written(_) => report.written += 1,
                        WriteOutcome::SkippedExisting(_) => report.kept_existing += 1,
                    }
                    rows.push(ManifestRow::new(event, outcome.path()));
                }
                Err(_) => report.write_failures += 1,
            }
        }

        if report.write_failures > 0 {
            warn!(
                "{} of {} events failed to write for {}; manifest not written",
                report.write_failures,
                events.len(),
                stem
            );
            return Ok(());
        }

        write_manifest(&manifest_path(output_dir, stem), &rows)
    }
}
