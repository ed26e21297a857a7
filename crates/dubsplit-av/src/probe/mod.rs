//! Stream probing.
//!
//! Probing turns a container file into a [`StreamCatalog`]. The only backend
//! shipped is the ffprobe CLI; anything else (fixtures in tests, a cached
//! probe result) can plug in through the [`Prober`] trait.

mod ffprobe;

pub use ffprobe::{parse_ffprobe_streams, FfprobeProber};

use crate::{Result, StreamCatalog};
use std::path::Path;

/// A media prober capable of listing the streams of a container file.
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe the file at `path` and return its stream catalog.
    fn probe(&self, path: &Path) -> Result<StreamCatalog>;
}

/// Probe a media file with ffprobe found on `PATH`.
pub fn probe(path: &Path) -> Result<StreamCatalog> {
    FfprobeProber::default().probe(path)
}
