//! Plan execution.
//!
//! Every job of a plan is a lossless stream copy; nothing is re-encoded.

mod extract;

pub use extract::{execute_plan, Extractor, FfmpegExtractor, JobOutcome};
