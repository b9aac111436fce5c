//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use crate::audio::FilterSpec;
pub use file::{load_config, load_config_file, save_config};
pub use paths::{config_dir, config_file_path, resolve_config_path};
pub use types::{
    AudioConfig, BackendKind, ClipSource, Config, ConvertConfig, EnergyParams, EventNaming,
    OutputConfig, PipelineConfig, Profile, SegmentationConfig, SilenceGapParams, Strategy,
};
pub use validate::{get_profile, validate_config};
