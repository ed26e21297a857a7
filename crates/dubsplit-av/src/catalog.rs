//! Typed view over the streams of one container file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecType {
    Video,
    Audio,
    Subtitle,
    /// Data, attachment and anything else ffprobe reports.
    Other,
}

impl CodecType {
    /// Map an ffprobe `codec_type` string onto a stream kind.
    pub fn from_probe(codec_type: &str) -> Self {
        match codec_type {
            "video" => CodecType::Video,
            "audio" => CodecType::Audio,
            "subtitle" => CodecType::Subtitle,
            _ => CodecType::Other,
        }
    }
}

impl std::fmt::Display for CodecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecType::Video => write!(f, "video"),
            CodecType::Audio => write!(f, "audio"),
            CodecType::Subtitle => write!(f, "subtitle"),
            CodecType::Other => write!(f, "other"),
        }
    }
}

/// One stream of a container, as declared in the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Container-level stream index.
    pub index: u32,
    /// Stream kind.
    pub codec_type: CodecType,
    /// Language tag (e.g. "ja-JP").
    pub language: Option<String>,
    /// Free-text title tag.
    pub title: Option<String>,
}

impl StreamDescriptor {
    pub fn new(index: u32, codec_type: CodecType) -> Self {
        Self {
            index,
            codec_type,
            language: None,
            title: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_video(&self) -> bool {
        self.codec_type == CodecType::Video
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type == CodecType::Audio
    }

    pub fn is_subtitle(&self) -> bool {
        self.codec_type == CodecType::Subtitle
    }

    /// Title tag, or an empty string when the stream has none.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// Ordered, immutable list of the streams of exactly one file.
///
/// Streams are kept sorted by index and indices are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamCatalog {
    streams: Vec<StreamDescriptor>,
}

impl StreamCatalog {
    /// Build a catalog, rejecting duplicate stream indices.
    pub fn new(mut streams: Vec<StreamDescriptor>) -> Result<Self> {
        streams.sort_by_key(|s| s.index);

        let mut seen = BTreeSet::new();
        for stream in &streams {
            if !seen.insert(stream.index) {
                return Err(Error::malformed(format!(
                    "duplicate stream index {}",
                    stream.index
                )));
            }
        }

        Ok(Self { streams })
    }

    /// Parse raw ffprobe `-show_streams` JSON output.
    #[cfg(feature = "probe")]
    pub fn from_probe_json(json: &[u8]) -> Result<Self> {
        crate::probe::parse_ffprobe_streams(json)
    }

    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Look up a stream by its container index.
    pub fn get(&self, index: u32) -> Option<&StreamDescriptor> {
        self.streams
            .binary_search_by_key(&index, |s| s.index)
            .ok()
            .map(|pos| &self.streams[pos])
    }

    /// Video streams in ascending index order.
    pub fn videos(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_video())
    }

    /// Audio streams in ascending index order.
    pub fn audios(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_audio())
    }

    /// Subtitle streams in ascending index order.
    pub fn subtitles(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_subtitle())
    }

    /// Indices of every audio stream.
    pub fn audio_indices(&self) -> BTreeSet<u32> {
        self.audios().map(|s| s.index).collect()
    }
}
