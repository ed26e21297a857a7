//! Batch input discovery.

use crate::config::ScanConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand the command-line inputs into the ordered list of files to process.
///
/// Files are taken as given, whatever their extension. Directories are
/// walked (one level, or fully with `scan.recursive`) in file-name order and
/// contribute the files whose extension is listed in `scan.extensions`.
/// Paths that do not exist are kept so they are reported as failures.
pub fn discover_files(inputs: &[PathBuf], scan: &ScanConfig) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let max_depth = if scan.recursive { usize::MAX } else { 1 };
            let mut found = 0usize;

            for entry in WalkDir::new(input)
                .follow_links(true)
                .max_depth(max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_staging_dir(e.path()))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !entry.file_type().is_file() || !has_extension(path, &scan.extensions) {
                    continue;
                }
                if seen.insert(path.to_path_buf()) {
                    files.push(path.to_path_buf());
                    found += 1;
                }
            }

            tracing::debug!("Found {} files in {:?}", found, input);
        } else {
            if !input.exists() {
                tracing::warn!("Input does not exist: {:?}", input);
            }
            if seen.insert(input.clone()) {
                files.push(input.clone());
            }
        }
    }

    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

fn is_staging_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(".dubsplit-"))
}
