//! Event clips and the per-recording manifest.

mod manifest;
mod writer;

pub use manifest::{ManifestRow, manifest_path, read_manifest, write_manifest};
pub use writer::{Event, EventWriter, WriteOutcome, sanitize_filename};
