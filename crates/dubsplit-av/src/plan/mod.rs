//! Demux planning.
//!
//! Planning is a pure function of a [`StreamCatalog`] and a
//! [`LanguageSuffixResolver`]: it pairs video streams with their audio,
//! splits the remaining audio into standalone dub jobs, classifies subtitle
//! tracks and names every output. Nothing here touches the filesystem.
//!
//! ```
//! use dubsplit_av::catalog::{CodecType, StreamCatalog, StreamDescriptor};
//! use dubsplit_av::plan::{DemuxPlanBuilder, LanguageSuffixResolver};
//! use std::path::Path;
//!
//! let catalog = StreamCatalog::new(vec![
//!     StreamDescriptor::new(0, CodecType::Video),
//!     StreamDescriptor::new(1, CodecType::Audio).with_language("ja-JP"),
//!     StreamDescriptor::new(2, CodecType::Audio).with_language("en-US"),
//! ])?;
//!
//! let resolver = LanguageSuffixResolver::default();
//! let plan = DemuxPlanBuilder::new(&resolver).build(Path::new("/anime/ep01.mkv"), &catalog);
//!
//! assert_eq!(plan.jobs[0].output_file_name(), "ep01.mp4");
//! assert_eq!(plan.jobs[1].output_file_name(), "ep01.dub.aac");
//! # Ok::<(), dubsplit_av::Error>(())
//! ```

mod builder;
mod correlate;
mod language;
mod subtitle;

pub use builder::{standalone_audio, DemuxPlanBuilder};
pub use correlate::{
    carries_video_marker, video_marker, ClaimedSet, Correlation, CorrelationFailure,
    PrimaryAudioFallback, VideoAudioCorrelator, VideoPairing,
};
pub use language::{
    LanguageSuffixResolver, ResolvedSuffix, UnknownLanguagePolicy, BUILTIN_SUFFIXES, UNDETERMINED,
    UNSAFE_FILENAME_CHARS,
};
pub use subtitle::{ClassifiedSubtitle, SubtitleClassifier, SubtitleStyle, CAPTION_MARKER};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Container extension of a demux output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputExtension {
    #[serde(rename = ".mp4")]
    Mp4,
    #[serde(rename = ".aac")]
    Aac,
    #[serde(rename = ".ass")]
    Ass,
}

impl OutputExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputExtension::Mp4 => ".mp4",
            OutputExtension::Aac => ".aac",
            OutputExtension::Ass => ".ass",
        }
    }
}

impl std::fmt::Display for OutputExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a job extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// A video stream, with its paired audio when one was found.
    Video,
    /// A standalone audio dub.
    Audio,
    /// A single subtitle track.
    Subtitle,
}

impl JobKind {
    pub fn extension(&self) -> OutputExtension {
        match self {
            JobKind::Video => OutputExtension::Mp4,
            JobKind::Audio => OutputExtension::Aac,
            JobKind::Subtitle => OutputExtension::Ass,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            JobKind::Video => "video",
            JobKind::Audio => "audio",
            JobKind::Subtitle => "subtitle",
        })
    }
}

/// One lossless stream copy into one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemuxJob {
    pub source_file: PathBuf,
    pub kind: JobKind,
    /// Streams to copy; the video index comes first when present.
    pub stream_indices: Vec<u32>,
    pub output_suffix: String,
    pub output_extension: OutputExtension,
}

impl DemuxJob {
    pub fn new(
        source_file: &Path,
        kind: JobKind,
        stream_indices: Vec<u32>,
        output_suffix: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.to_path_buf(),
            kind,
            stream_indices,
            output_suffix: output_suffix.into(),
            output_extension: kind.extension(),
        }
    }

    /// `<source stem><suffix><extension>`.
    pub fn output_file_name(&self) -> String {
        let stem = self
            .source_file
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        format!("{}{}{}", stem, self.output_suffix, self.output_extension)
    }

    /// Destination path; outputs land next to the source unless `output_dir`
    /// is given.
    pub fn output_path(&self, output_dir: Option<&Path>) -> PathBuf {
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => self
                .source_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        dir.join(self.output_file_name())
    }

    /// Audio stream index carried by this job, if any.
    pub fn audio_index(&self) -> Option<u32> {
        match self.kind {
            JobKind::Video => self.stream_indices.get(1).copied(),
            JobKind::Audio => self.stream_indices.first().copied(),
            JobKind::Subtitle => None,
        }
    }
}

/// A language tag that was missing from the suffix table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownLanguageTag {
    pub stream_index: u32,
    pub tag: String,
    /// Suffix the fallback policy produced.
    pub suffix: String,
}

/// A suffix that was extended to keep two outputs from sharing a filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRename {
    pub stream_index: u32,
    pub original_suffix: String,
    pub suffix: String,
}

/// The extraction plan for one source file, with every decision taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemuxPlan {
    pub source_file: PathBuf,
    /// Video jobs, then standalone audio jobs, then subtitle jobs.
    pub jobs: Vec<DemuxJob>,
    /// Audio indices paired with a video stream.
    pub claimed: ClaimedSet,
    /// Audio indices extracted on their own.
    pub standalone: Vec<u32>,
    pub primary_fallback: Option<PrimaryAudioFallback>,
    pub correlation_failures: Vec<CorrelationFailure>,
    pub unknown_languages: Vec<UnknownLanguageTag>,
    pub renames: Vec<OutputRename>,
}

impl DemuxPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs_of(&self, kind: JobKind) -> impl Iterator<Item = &DemuxJob> {
        self.jobs.iter().filter(move |j| j.kind == kind)
    }

    /// Whether any automatic decision in this plan deserves a look.
    pub fn has_warnings(&self) -> bool {
        !self.correlation_failures.is_empty()
            || !self.unknown_languages.is_empty()
            || !self.renames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        let job = DemuxJob::new(
            Path::new("/media/show/ep01.mkv"),
            JobKind::Audio,
            vec![2],
            ".dub",
        );
        assert_eq!(job.output_extension, OutputExtension::Aac);
        assert_eq!(job.output_file_name(), "ep01.dub.aac");
        assert_eq!(
            job.output_path(None),
            PathBuf::from("/media/show/ep01.dub.aac")
        );
        assert_eq!(
            job.output_path(Some(Path::new("/out"))),
            PathBuf::from("/out/ep01.dub.aac")
        );
    }

    #[test]
    fn test_output_file_name_keeps_inner_dots() {
        let job = DemuxJob::new(
            Path::new("Show.S01E01.1080p.mkv"),
            JobKind::Subtitle,
            vec![4],
            ".en",
        );
        assert_eq!(job.output_file_name(), "Show.S01E01.1080p.en.ass");
    }

    #[test]
    fn test_audio_index() {
        let src = Path::new("a.mkv");
        assert_eq!(
            DemuxJob::new(src, JobKind::Video, vec![0, 1], "").audio_index(),
            Some(1)
        );
        assert_eq!(
            DemuxJob::new(src, JobKind::Video, vec![3], "").audio_index(),
            None
        );
        assert_eq!(
            DemuxJob::new(src, JobKind::Audio, vec![2], ".dub").audio_index(),
            Some(2)
        );
        assert_eq!(
            DemuxJob::new(src, JobKind::Subtitle, vec![4], ".en").audio_index(),
            None
        );
    }
}
