use dubsplit_av::plan::{LanguageSuffixResolver, UnknownLanguagePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub languages: LanguagesConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// File extensions picked up when a directory is given (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["mkv".to_string()]
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            recursive: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for extracted files (default: next to each source file)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Replace outputs that already exist (default: true)
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

fn default_overwrite() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            overwrite: default_overwrite(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LanguagesConfig {
    /// Suffix used for tags missing from the table: "echo" (".<tag>") or "empty"
    #[serde(default)]
    pub unknown: UnknownLanguagePolicy,

    /// Extra or overriding entries, e.g. `"en-GB" = ".uk-dub"`
    #[serde(default)]
    pub suffixes: BTreeMap<String, String>,

    /// Start from an empty table instead of the built-in one
    #[serde(default)]
    pub replace_builtin: bool,
}

impl LanguagesConfig {
    /// Build the resolver described by this section.
    pub fn resolver(&self) -> LanguageSuffixResolver {
        let mut table = if self.replace_builtin {
            BTreeMap::new()
        } else {
            LanguageSuffixResolver::builtin_table()
        };
        table.extend(
            self.suffixes
                .iter()
                .map(|(tag, suffix)| (tag.clone(), suffix.clone())),
        );
        LanguageSuffixResolver::new(table, self.unknown)
    }
}
