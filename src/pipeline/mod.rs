//! Processing pipeline components.

mod coordinator;
mod pool;
mod processor;

pub use coordinator::{
    ProcessCheck, Recording, collect_input_files, output_root_for, plan_recordings,
    recording_dir_for, should_process, source_stem,
};
pub use pool::{RecordingOutcome, default_workers, run_pool};
pub use processor::{Pipeline, RecordingReport, RunOptions};
