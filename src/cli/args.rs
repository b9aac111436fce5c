//! CLI argument definitions.

use crate::cli::validators::{parse_amplitude, parse_dbfs, parse_frequency, parse_seconds};
use crate::config::{Config, EventNaming, Strategy};
use crate::constants::{CONFIG_ENV_VAR, filter::MAX_ORDER};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Isolate bird flight-call events from field recordings.
#[derive(Debug, Parser)]
#[command(name = "flightcall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input files or directories to segment.
    pub inputs: Vec<PathBuf>,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// Options for segmentation runs.
    #[command(flatten)]
    pub run: RunArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for a segmentation run.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Output root (default: `events/` next to each input).
    #[arg(short, long, env = "FLIGHTCALL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Named profile from the configuration file.
    #[arg(short, long, env = "FLIGHTCALL_PROFILE")]
    pub profile: Option<String>,

    /// Detection strategy.
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Band-pass lower cutoff in Hz.
    #[arg(long, value_parser = parse_frequency)]
    pub low_hz: Option<f64>,

    /// Band-pass upper cutoff in Hz.
    #[arg(long, value_parser = parse_frequency)]
    pub high_hz: Option<f64>,

    /// Butterworth prototype order.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ORDER)))]
    pub order: Option<u32>,

    /// Shortest accepted event in milliseconds.
    #[arg(long)]
    pub min_event_ms: Option<u32>,

    /// Longest accepted event in milliseconds.
    #[arg(long)]
    pub max_event_ms: Option<u32>,

    /// Silence threshold in dBFS (silence-gap).
    #[arg(long, value_parser = parse_dbfs, allow_negative_numbers = true)]
    pub silence_thresh_dbfs: Option<f64>,

    /// Minimum silent run that splits events, in ms (silence-gap).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub min_silence_ms: Option<u32>,

    /// Padding kept around each event, in ms (silence-gap).
    #[arg(long)]
    pub keep_silence_ms: Option<u32>,

    /// Step between loudness windows, in ms (silence-gap).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub seek_step_ms: Option<u32>,

    /// Linear amplitude threshold, 0.0-1.0 (energy-threshold).
    #[arg(long, value_parser = parse_amplitude)]
    pub amplitude_threshold: Option<f32>,

    /// Merge active runs closer than this many seconds (energy-threshold).
    #[arg(long, value_parser = parse_seconds)]
    pub silence_pad_sec: Option<f64>,

    /// Clip naming scheme.
    #[arg(long, value_enum)]
    pub naming: Option<EventNaming>,

    /// Resample recordings to this rate before detection.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub target_sample_rate: Option<u32>,

    /// Decode non-WAV inputs directly instead of converting them first.
    #[arg(long)]
    pub no_convert: bool,

    /// Number of recordings processed in parallel.
    #[arg(short = 'j', long, env = "FLIGHTCALL_WORKERS",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Reprocess recordings even if their manifest exists.
    #[arg(long)]
    pub force: bool,

    /// Replace existing event clips.
    #[arg(long)]
    pub overwrite: bool,

    /// Detect events without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the batch summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl RunArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = Some(dir.clone());
        }

        let filter = &mut config.filter;
        set(&mut filter.low_hz, self.low_hz);
        set(&mut filter.high_hz, self.high_hz);
        set(&mut filter.order, self.order);

        let seg = &mut config.segmentation;
        set(&mut seg.strategy, self.strategy);
        set(&mut seg.min_event_ms, self.min_event_ms);
        set(&mut seg.max_event_ms, self.max_event_ms);
        set(&mut seg.silence_gap.silence_thresh_dbfs, self.silence_thresh_dbfs);
        set(&mut seg.silence_gap.min_silence_ms, self.min_silence_ms);
        set(&mut seg.silence_gap.keep_silence_ms, self.keep_silence_ms);
        set(&mut seg.silence_gap.seek_step_ms, self.seek_step_ms);
        set(&mut seg.energy.amplitude_threshold, self.amplitude_threshold);
        set(&mut seg.energy.silence_pad_sec, self.silence_pad_sec);

        set(&mut config.output.naming, self.naming);
        if self.target_sample_rate.is_some() {
            config.audio.target_sample_rate = self.target_sample_rate;
        }
        if self.no_convert {
            config.convert.enabled = false;
        }
        if self.overwrite {
            config.output.overwrite = true;
        }
        if let Some(workers) = self.workers {
            config.pipeline.workers = usize::try_from(workers).ok();
        }
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
