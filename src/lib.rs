//! flightcall - isolate bird flight-call events from field recordings.
//!
//! Recordings are decoded to mono, peak-normalized, band-passed with a
//! zero-phase Butterworth filter and split into events by a silence-gap or
//! energy-threshold detector. Each event is written as a WAV clip next to a
//! per-recording CSV manifest.

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod convert;
pub mod detect;
pub mod error;
pub mod events;
pub mod output;
pub mod pipeline;
pub mod utils;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, RunArgs};
use config::{Config, get_profile, load_config, resolve_config_path, save_config, validate_config};
use output::{BatchSummary, progress};
use pipeline::{Pipeline, RunOptions, collect_input_files, default_workers, run_pool};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for flightcall CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.run.verbose, cli.run.quiet);

    // First Ctrl+C lets in-flight recordings finish; the second exits
    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupt);
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130); // 128 + SIGINT(2)
        }
        warn!("Interrupt received: finishing in-flight recordings (Ctrl+C again to abort)");
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    if let Some(command) = cli.command {
        return handle_command(command, cli.config.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;

    // Show help if no inputs provided
    if cli.inputs.is_empty() {
        let exists = resolve_config_path(cli.config.as_deref()).is_ok_and(|p| p.exists());
        cli::help::print_smart_help(&config, exists);
        return Ok(());
    }

    let summary = segment_files(&cli.inputs, &cli.run, config, &interrupt)?;

    if interrupt.load(Ordering::SeqCst) {
        return Err(Error::Interrupted);
    }
    if !summary.is_clean() {
        return Err(Error::BatchIncomplete {
            failed: summary.failed,
            write_failures: summary.write_failures,
        });
    }
    Ok(())
}

/// Resolve settings, then segment every input on the worker pool.
fn segment_files(
    inputs: &[PathBuf],
    args: &RunArgs,
    config: Config,
    interrupt: &Arc<AtomicBool>,
) -> Result<BatchSummary> {
    let total_start = Instant::now();

    let mut config = match &args.profile {
        Some(name) => {
            let profile = get_profile(&config, name)?.clone();
            info!("Using profile: {name}");
            config.with_profile(&profile)
        }
        None => config,
    };
    args.apply_to(&mut config);
    validate_config(&config)?;

    let exclude: Vec<PathBuf> = config.output.dir.iter().cloned().collect();
    let files = collect_input_files(inputs, &exclude)?;
    if files.is_empty() {
        return Err(Error::NoInputFiles);
    }
    info!("Found {} audio file(s) to process", files.len());
    info!(
        "Strategy {}, band {}-{} Hz (order {}), events {}-{} ms",
        config.segmentation.strategy,
        config.filter.low_hz,
        config.filter.high_hz,
        config.filter.order,
        config.segmentation.min_event_ms,
        config.segmentation.max_event_ms
    );

    let workers = config.pipeline.workers.unwrap_or_else(default_workers);
    let options = RunOptions {
        force: args.force,
        dry_run: args.dry_run,
    };
    let pipeline = Arc::new(Pipeline::new(config, options));

    let progress_enabled = !args.quiet && !args.no_progress && !args.json;
    let file_progress = progress::create_file_progress(files.len(), progress_enabled);

    let outcomes = run_pool(
        pipeline,
        files,
        workers,
        Arc::clone(interrupt),
        file_progress.clone(),
    )?;

    let interrupted = interrupt.load(Ordering::SeqCst);
    progress::finish_progress(file_progress, if interrupted { "Interrupted" } else { "Complete" });

    let summary = BatchSummary::from_outcomes(&outcomes, total_start.elapsed().as_secs_f64());
    summary.log();
    if args.json {
        print_json(&summary)?;
    }
    Ok(summary)
}

#[allow(clippy::print_stdout)]
fn print_json(summary: &BatchSummary) -> Result<()> {
    println!("{}", summary.to_json()?);
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Symphonia format detection is noisy at info; keep it down unless tracing
    let filter_str = if quiet {
        "warn".to_string()
    } else {
        match verbose {
            0 => "info,symphonia=warn".to_string(),
            1 => "debug,symphonia=warn".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Logs go to stderr so `--json` output on stdout stays parseable
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_command(command: Command, explicit_config: Option<&Path>) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action, explicit_config),
    }
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction, explicit_config: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(explicit_config)?;

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!("  Edit [filter] and [segmentation] to suit your recordings,");
                println!("  or add per-species [profiles.<name>] tables.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(&path))?;
            let text =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("# {}", path.display());
            print!("{text}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
