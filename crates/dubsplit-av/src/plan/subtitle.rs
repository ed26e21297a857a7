//! Caption-style versus standard subtitle tracks.

use super::language::{filename_safe, LanguageSuffixResolver, UNDETERMINED};
use crate::catalog::{StreamCatalog, StreamDescriptor};
use serde::Serialize;

/// Title marker of caption-style (closed caption / SDH) tracks.
pub const CAPTION_MARKER: &str = "(CC)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleStyle {
    Caption,
    Standard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedSubtitle {
    pub index: u32,
    pub style: SubtitleStyle,
    /// Effective language tag (`und` when the stream had none).
    pub tag: String,
    pub suffix: String,
    /// False when a caption track's language was missing from the suffix
    /// table and the fallback policy supplied its prefix.
    pub language_known: bool,
}

/// Classifies subtitle streams and derives their output suffix.
///
/// Standard tracks are named `.<tag>`; caption tracks put the language's dub
/// suffix in front, `<dub suffix>.<tag>`, so the two never share a name.
#[derive(Debug, Clone, Copy)]
pub struct SubtitleClassifier<'a> {
    resolver: &'a LanguageSuffixResolver,
}

impl<'a> SubtitleClassifier<'a> {
    pub fn new(resolver: &'a LanguageSuffixResolver) -> Self {
        Self { resolver }
    }

    pub fn style_of(stream: &StreamDescriptor) -> SubtitleStyle {
        if stream.title_or_empty().contains(CAPTION_MARKER) {
            SubtitleStyle::Caption
        } else {
            SubtitleStyle::Standard
        }
    }

    pub fn classify(&self, stream: &StreamDescriptor) -> ClassifiedSubtitle {
        let style = Self::style_of(stream);
        let tag = stream.language.as_deref().unwrap_or(UNDETERMINED);
        let tag_part = format!(".{}", filename_safe(tag));

        match style {
            SubtitleStyle::Caption => {
                let resolved = self.resolver.resolve_stream(Some(tag));
                ClassifiedSubtitle {
                    index: stream.index,
                    style,
                    tag: tag.to_string(),
                    suffix: format!("{}{}", resolved.suffix, tag_part),
                    language_known: resolved.known,
                }
            }
            SubtitleStyle::Standard => ClassifiedSubtitle {
                index: stream.index,
                style,
                tag: tag.to_string(),
                suffix: tag_part,
                language_known: true,
            },
        }
    }

    /// Classify every subtitle stream, in ascending index order.
    pub fn classify_all(&self, catalog: &StreamCatalog) -> Vec<ClassifiedSubtitle> {
        catalog.subtitles().map(|s| self.classify(s)).collect()
    }
}
