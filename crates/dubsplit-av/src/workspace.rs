//! Staging area for extraction outputs.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Staging directory for one extraction.
///
/// The extractor writes into [`Workspace::output`], a path inside a hidden
/// temporary directory created next to the destination, so the final move is
/// a same-filesystem rename. Dropping the workspace removes the directory and
/// anything left in it.
///
/// # Example
///
/// ```no_run
/// use dubsplit_av::Workspace;
///
/// let workspace = Workspace::new("/anime/ep01.dub.aac")?;
/// // ffmpeg writes to workspace.output()
/// workspace.finalize(true)?;
/// # Ok::<(), dubsplit_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    destination: PathBuf,
    output_path: PathBuf,
}

impl Workspace {
    /// Create a workspace for producing `destination`.
    pub fn new<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref();

        let file_name = destination
            .file_name()
            .ok_or_else(|| Error::InvalidInput("Invalid output file path".to_string()))?;

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp_dir = tempfile::Builder::new()
            .prefix(".dubsplit-")
            .tempdir_in(&parent)
            .map_err(|e| Error::Workspace(format!("Failed to create staging dir in {:?}: {}", parent, e)))?;

        let output_path = temp_dir.path().join(file_name);

        Ok(Self {
            temp_dir,
            destination: destination.to_path_buf(),
            output_path,
        })
    }

    /// Final destination of the output.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Path the extractor should write to.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Move the staged output to its destination.
    ///
    /// An existing destination is replaced only when `overwrite` is set; the
    /// previous file is kept as a backup until the move succeeds and restored
    /// if it fails.
    pub fn finalize(self, overwrite: bool) -> Result<PathBuf> {
        let dest = &self.destination;

        if !self.output_path.exists() {
            return Err(Error::Workspace(format!(
                "Output file does not exist: {:?}",
                self.output_path
            )));
        }

        if dest.exists() {
            if !overwrite {
                return Err(Error::OutputExists { path: dest.clone() });
            }

            let backup = self.temp_dir.path().join(".previous");
            std::fs::rename(dest, &backup).map_err(|e| {
                Error::Workspace(format!("Failed to move existing output aside: {}", e))
            })?;

            if let Err(e) = std::fs::rename(&self.output_path, dest) {
                let _ = std::fs::rename(&backup, dest);
                return Err(Error::Workspace(format!(
                    "Failed to move output to destination: {}",
                    e
                )));
            }
        } else {
            std::fs::rename(&self.output_path, dest).map_err(|e| {
                Error::Workspace(format!("Failed to move output to destination: {}", e))
            })?;
        }

        Ok(dest.clone())
    }

    /// Discard the staged output.
    pub fn cleanup(self) {
        drop(self.temp_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_paths() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ep01.dub.aac");
        let workspace = Workspace::new(&dest).unwrap();

        assert_eq!(workspace.destination(), dest);
        assert!(workspace.output().starts_with(workspace.temp_dir()));
        assert!(workspace.temp_dir().starts_with(dir.path()));
        assert_eq!(workspace.output().file_name().unwrap(), "ep01.dub.aac");
    }

    #[test]
    fn test_finalize_moves_output() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ep01.en.ass");
        let workspace = Workspace::new(&dest).unwrap();
        std::fs::write(workspace.output(), b"subs").unwrap();
        let staging = workspace.temp_dir().to_path_buf();

        let path = workspace.finalize(false).unwrap();
        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"subs");
        assert!(!staging.exists());
    }

    #[test]
    fn test_finalize_respects_overwrite() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ep01.mp4");
        std::fs::write(&dest, b"old").unwrap();

        let workspace = Workspace::new(&dest).unwrap();
        std::fs::write(workspace.output(), b"new").unwrap();
        let err = workspace.finalize(false).unwrap_err();
        assert!(matches!(err, Error::OutputExists { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");

        let workspace = Workspace::new(&dest).unwrap();
        std::fs::write(workspace.output(), b"new").unwrap();
        workspace.finalize(true).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_cleanup_discards_output() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path().join("ep01.mp4")).unwrap();
        std::fs::write(workspace.output(), b"partial").unwrap();
        let staging = workspace.temp_dir().to_path_buf();
        workspace.cleanup();
        assert!(!staging.exists());
        assert!(!dir.path().join("ep01.mp4").exists());
    }

    #[test]
    fn test_finalize_without_output_fails() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path().join("ep01.mp4")).unwrap();
        assert!(matches!(workspace.finalize(true), Err(Error::Workspace(_))));
    }
}
