//! Language tag to output filename suffix mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag used for streams that carry no language tag.
pub const UNDETERMINED: &str = "und";

/// Built-in suffix table.
///
/// The original-language track (Japanese) gets no suffix; dubs get a short
/// marker so they sort next to the original on disk.
pub const BUILTIN_SUFFIXES: &[(&str, &str)] = &[
    ("ja-JP", ""),
    ("ja", ""),
    ("jpn", ""),
    ("en-US", ".dub"),
    ("en", ".dub"),
    ("eng", ".dub"),
    ("en-IN", ".in-dub"),
    ("fr-FR", ".vf"),
    ("fr", ".vf"),
    ("fre", ".vf"),
    ("fra", ".vf"),
    ("pt-BR", ".br-dub"),
    ("pt-PT", ".pt-dub"),
    ("es-419", ".la-dub"),
    ("es-ES", ".es-dub"),
    ("es", ".es-dub"),
    ("spa", ".es-dub"),
    ("de-DE", ".de-dub"),
    ("de", ".de-dub"),
    ("ger", ".de-dub"),
    ("deu", ".de-dub"),
    ("it-IT", ".it-dub"),
    ("it", ".it-dub"),
    ("ita", ".it-dub"),
    ("ru-RU", ".ru-dub"),
    ("ru", ".ru-dub"),
    ("rus", ".ru-dub"),
    ("ar-SA", ".ar-dub"),
    ("hi-IN", ".hi-dub"),
    ("ko-KR", ".ko-dub"),
    ("zh-CN", ".zh-dub"),
    ("zh-TW", ".tw-dub"),
];

/// What to do with a language tag that is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLanguagePolicy {
    /// Use `.<tag>` as the suffix, so unknown dubs never collide with the
    /// original-language output.
    #[default]
    Echo,
    /// Use no suffix at all.
    Empty,
}

/// The suffix chosen for one stream's language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSuffix {
    /// Effective language tag (`und` when the stream had none).
    pub tag: String,
    /// Filename suffix, possibly empty.
    pub suffix: String,
    /// Whether the tag came from the table or from the fallback policy.
    pub known: bool,
}

/// Immutable lookup from language tag to filename suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSuffixResolver {
    table: BTreeMap<String, String>,
    unknown: UnknownLanguagePolicy,
}

impl LanguageSuffixResolver {
    pub fn new(table: BTreeMap<String, String>, unknown: UnknownLanguagePolicy) -> Self {
        Self { table, unknown }
    }

    /// The built-in table as an owned map, ready to be extended.
    pub fn builtin_table() -> BTreeMap<String, String> {
        BUILTIN_SUFFIXES
            .iter()
            .map(|(tag, suffix)| (tag.to_string(), suffix.to_string()))
            .collect()
    }

    pub fn policy(&self) -> UnknownLanguagePolicy {
        self.unknown
    }

    /// Table entries in tag order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact table lookup, without the fallback.
    pub fn lookup(&self, tag: &str) -> Option<&str> {
        self.table.get(tag).map(String::as_str)
    }

    /// Suffix for `tag`, applying the unknown-language policy when needed.
    pub fn resolve(&self, tag: &str) -> String {
        match self.lookup(tag) {
            Some(suffix) => suffix.to_string(),
            None => self.fallback(tag),
        }
    }

    /// Resolve an optional stream language, treating a missing tag as `und`.
    pub fn resolve_stream(&self, language: Option<&str>) -> ResolvedSuffix {
        let tag = language.unwrap_or(UNDETERMINED);
        match self.lookup(tag) {
            Some(suffix) => ResolvedSuffix {
                tag: tag.to_string(),
                suffix: suffix.to_string(),
                known: true,
            },
            None => ResolvedSuffix {
                tag: tag.to_string(),
                suffix: self.fallback(tag),
                known: false,
            },
        }
    }

    fn fallback(&self, tag: &str) -> String {
        match self.unknown {
            UnknownLanguagePolicy::Echo => format!(".{}", filename_safe(tag)),
            UnknownLanguagePolicy::Empty => String::new(),
        }
    }
}

impl Default for LanguageSuffixResolver {
    fn default() -> Self {
        Self::new(Self::builtin_table(), UnknownLanguagePolicy::default())
    }
}

/// Characters that cannot appear in an output suffix.
pub const UNSAFE_FILENAME_CHARS: [char; 4] = ['/', '\\', ':', '\0'];

/// Make a tag usable inside a filename.
pub(crate) fn filename_safe(tag: &str) -> String {
    tag.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
