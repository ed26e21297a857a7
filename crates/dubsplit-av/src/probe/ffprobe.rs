//! FFprobe-based stream probing.

use super::Prober;
use crate::catalog::{CodecType, StreamCatalog, StreamDescriptor};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: String,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// Prober backed by the ffprobe CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl FfprobeProber {
    /// Use a specific ffprobe executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<StreamCatalog> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Probing {:?} with {:?}", path, self.program);

        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffprobe")
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool_failed("ffprobe", stderr.to_string()));
        }

        parse_ffprobe_streams(&output.stdout)
    }
}

/// Parse ffprobe `-show_streams` JSON into a stream catalog.
///
/// Missing `codec_type`, a missing or non-integer `index`, a missing
/// `streams` array and duplicate indices are all reported as
/// [`Error::MalformedMetadata`].
pub fn parse_ffprobe_streams(json: &[u8]) -> Result<StreamCatalog> {
    let output: FfprobeOutput = serde_json::from_slice(json)?;

    let streams = output
        .streams
        .into_iter()
        .map(|stream| StreamDescriptor {
            index: stream.index,
            codec_type: CodecType::from_probe(&stream.codec_type),
            language: non_empty(stream.tags.language),
            title: non_empty(stream.tags.title),
        })
        .collect();

    StreamCatalog::new(streams)
}

fn non_empty(tag: Option<String>) -> Option<String> {
    tag.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI_VARIANT: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "tags": {}},
            {"index": 1, "codec_type": "audio", "codec_name": "aac",
             "tags": {"language": "ja-JP"}},
            {"index": 2, "codec_type": "audio", "codec_name": "aac",
             "tags": {"language": "en-US", "title": "English [Video: Alt]"}},
            {"index": 3, "codec_type": "video", "codec_name": "h264",
             "tags": {"title": "Alt"}},
            {"index": 4, "codec_type": "subtitle", "codec_name": "ass",
             "tags": {"language": "en", "title": "English"}},
            {"index": 5, "codec_type": "attachment"}
        ]
    }"#;

    #[test]
    fn test_parse_streams() {
        let catalog = parse_ffprobe_streams(MULTI_VARIANT.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.videos().count(), 2);

        let alt = catalog.get(3).unwrap();
        assert_eq!(alt.codec_type, CodecType::Video);
        assert_eq!(alt.title.as_deref(), Some("Alt"));
        assert!(alt.language.is_none());

        let dub = catalog.get(2).unwrap();
        assert_eq!(dub.language.as_deref(), Some("en-US"));
        assert_eq!(dub.title.as_deref(), Some("English [Video: Alt]"));

        assert_eq!(catalog.get(5).unwrap().codec_type, CodecType::Other);
    }

    #[test]
    fn test_missing_codec_type_is_malformed() {
        let json = r#"{"streams": [{"index": 0}]}"#;
        let err = parse_ffprobe_streams(json.as_bytes()).unwrap_err();
        assert!(err.is_malformed_metadata());
    }

    #[test]
    fn test_non_numeric_index_is_malformed() {
        let json = r#"{"streams": [{"index": "zero", "codec_type": "video"}]}"#;
        let err = parse_ffprobe_streams(json.as_bytes()).unwrap_err();
        assert!(err.is_malformed_metadata());

        let json = r#"{"streams": [{"index": -1, "codec_type": "video"}]}"#;
        let err = parse_ffprobe_streams(json.as_bytes()).unwrap_err();
        assert!(err.is_malformed_metadata());
    }

    #[test]
    fn test_missing_streams_is_malformed() {
        let err = parse_ffprobe_streams(b"{}").unwrap_err();
        assert!(err.is_malformed_metadata());

        let err = parse_ffprobe_streams(b"not json").unwrap_err();
        assert!(err.is_malformed_metadata());
    }

    #[test]
    fn test_blank_tags_are_absent() {
        let json = r#"{"streams": [
            {"index": 0, "codec_type": "audio", "tags": {"language": "", "title": "  "}}
        ]}"#;
        let catalog = parse_ffprobe_streams(json.as_bytes()).unwrap();
        let audio = catalog.get(0).unwrap();
        assert!(audio.language.is_none());
        assert!(audio.title.is_none());
    }

    #[test]
    fn test_probe_missing_file() {
        let err = FfprobeProber::default()
            .probe(Path::new("/nonexistent/file.mkv"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
