//! Run reporting: progress and the batch summary.

pub mod progress;
mod summary;

pub use summary::{BatchSummary, FileStatus, RecordingSummary};
