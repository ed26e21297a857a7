//! Locating and checking the FFmpeg command-line tools.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external program the demux pipeline shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Stream listing.
    Ffprobe,
    /// Stream copy.
    Ffmpeg,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Ffprobe, Tool::Ffmpeg];

    /// Executable name looked up on PATH.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Ffprobe => "ffprobe",
            Tool::Ffmpeg => "ffmpeg",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of checking one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub tool: Tool,
    /// Whether `-version` ran successfully.
    pub available: bool,
    /// Version number from the banner, e.g. `6.1.1`.
    pub version: Option<String>,
    /// Resolved executable, when it could be found.
    pub path: Option<PathBuf>,
}

/// Run `<program> -version` and report what it says.
///
/// `configured` overrides the PATH lookup of the tool's default name.
///
/// # Example
///
/// ```no_run
/// use dubsplit_av::tools::{check_tool, Tool};
///
/// let info = check_tool(Tool::Ffprobe, None);
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(tool: Tool, configured: Option<&Path>) -> ToolInfo {
    let program = configured.unwrap_or_else(|| Path::new(tool.name()));

    match Command::new(program).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let banner = String::from_utf8_lossy(&output.stdout);
            ToolInfo {
                tool,
                available: true,
                version: banner.lines().next().and_then(parse_version),
                path: which::which(program).ok(),
            }
        }
        _ => ToolInfo {
            tool,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check every [`Tool`], honouring configured locations.
pub fn check_tools(ffprobe: Option<&Path>, ffmpeg: Option<&Path>) -> Vec<ToolInfo> {
    Tool::ALL
        .into_iter()
        .map(|tool| {
            let configured = match tool {
                Tool::Ffprobe => ffprobe,
                Tool::Ffmpeg => ffmpeg,
            };
            check_tool(tool, configured)
        })
        .collect()
}

/// Find a tool on PATH.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if the tool is not installed.
pub fn require_tool(tool: Tool) -> Result<PathBuf> {
    which::which(tool.name()).map_err(|_| Error::tool_not_found(tool.name()))
}

/// Resolve the executable to run for `tool`.
///
/// A configured path is used when it exists; a configured bare name is
/// looked up on PATH. Without configuration the default name is looked up.
pub fn locate(tool: Tool, configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => which::which(path).map_err(|_| {
            Error::tool_not_found(format!("{} (configured as {})", tool, path.display()))
        }),
        None => require_tool(tool),
    }
}

/// Pull the version out of a banner like `ffmpeg version 6.1.1 Copyright ...`.
fn parse_version(banner: &str) -> Option<String> {
    let mut words = banner.split_whitespace();
    words.find(|w| *w == "version")?;
    words.next().map(|v| v.to_string())
}
