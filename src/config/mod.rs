mod types;

pub use types::*;

use anyhow::{Context, Result};
use dubsplit_av::plan::UNSAFE_FILENAME_CHARS;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./dubsplit.toml",
        "~/.config/dubsplit/config.toml",
        "/etc/dubsplit/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.scan.extensions.is_empty() {
        anyhow::bail!("scan.extensions cannot be empty");
    }

    for ext in &config.scan.extensions {
        if ext.is_empty() || ext.starts_with('.') {
            anyhow::bail!(
                "Invalid extension '{}': give it without the leading dot",
                ext
            );
        }
    }

    for (tag, suffix) in &config.languages.suffixes {
        if tag.is_empty() {
            anyhow::bail!("Language tag cannot be empty");
        }
        if !suffix.is_empty() && !suffix.starts_with('.') {
            anyhow::bail!(
                "Suffix '{}' for language '{}' must be empty or start with '.'",
                suffix,
                tag
            );
        }
        if suffix.contains(UNSAFE_FILENAME_CHARS) {
            anyhow::bail!(
                "Suffix {:?} for language '{}' cannot contain any of {:?}",
                suffix,
                tag,
                UNSAFE_FILENAME_CHARS
            );
        }
    }

    for (name, path) in [
        ("ffmpeg_path", &config.tools.ffmpeg_path),
        ("ffprobe_path", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("tools.{} does not exist: {:?}", name, path);
            }
        }
    }

    if let Some(ref dir) = config.output.directory {
        if !dir.is_dir() {
            tracing::warn!("Output directory does not exist yet: {:?}", dir);
        }
    }

    Ok(())
}
