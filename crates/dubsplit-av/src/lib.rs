//! # dubsplit-av
//!
//! Stream correlation and demux planning for multi-language media containers.
//!
//! Anime releases and streaming rips often bundle several video variants, a
//! stack of dubbed audio tracks and several subtitle tracks in one container.
//! This crate decides which audio belongs to which video, which audio tracks
//! are standalone dubs and how subtitle tracks are named, and produces a
//! non-overlapping list of lossless stream-copy jobs:
//! - Probing containers with ffprobe into a [`StreamCatalog`]
//! - Planning extraction jobs ([`plan`])
//! - Executing the jobs with ffmpeg stream copy (`actions`)
//!
//! ## Features
//!
//! - `probe` (default) - Stream probing using ffprobe
//! - `extract` (default) - Lossless extraction using ffmpeg
//! - `tracing` - Enable tracing support
//! - `all` - Enable all features
//!
//! ## Example
//!
//! ```no_run
//! use dubsplit_av::plan::{DemuxPlanBuilder, LanguageSuffixResolver};
//! use std::path::Path;
//!
//! let path = Path::new("/anime/ep01.mkv");
//! let catalog = dubsplit_av::probe(path)?;
//! let resolver = LanguageSuffixResolver::default();
//! let plan = DemuxPlanBuilder::new(&resolver).build(path, &catalog);
//! for job in &plan.jobs {
//!     println!("{:?} -> {}", job.stream_indices, job.output_file_name());
//! }
//! # Ok::<(), dubsplit_av::Error>(())
//! ```

pub mod catalog;
mod error;
pub mod plan;
pub mod tools;
pub mod workspace;

#[cfg(feature = "probe")]
pub mod probe;

#[cfg(feature = "extract")]
pub mod actions;

// Re-exports
pub use catalog::{CodecType, StreamCatalog, StreamDescriptor};
pub use error::{Error, Result};
pub use plan::{DemuxJob, DemuxPlan, DemuxPlanBuilder, JobKind, LanguageSuffixResolver};
pub use tools::{check_tool, check_tools, locate, require_tool, Tool, ToolInfo};
pub use workspace::Workspace;

/// Probe a media file with ffprobe and return its stream catalog.
#[cfg(feature = "probe")]
pub fn probe<P: AsRef<std::path::Path>>(path: P) -> Result<StreamCatalog> {
    probe::probe(path.as_ref())
}
