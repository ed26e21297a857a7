//! Stream-copy extraction with ffmpeg.

use crate::plan::{DemuxJob, DemuxPlan};
use crate::{Error, Result, Workspace};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executes a single demux job.
pub trait Extractor: Send + Sync {
    /// Human-readable name identifying this extractor implementation.
    fn name(&self) -> &'static str;

    /// Copy the job's streams into `destination`, returning the written path.
    fn extract(&self, job: &DemuxJob, destination: &Path) -> Result<PathBuf>;
}

/// Result of one job of a plan.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: DemuxJob,
    pub destination: PathBuf,
    pub result: Result<PathBuf>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every job of `plan`, continuing past failed jobs.
pub fn execute_plan(
    extractor: &dyn Extractor,
    plan: &DemuxPlan,
    output_dir: Option<&Path>,
) -> Vec<JobOutcome> {
    let total = plan.jobs.len();

    plan.jobs
        .iter()
        .enumerate()
        .map(|(i, job)| {
            let destination = job.output_path(output_dir);

            #[cfg(feature = "tracing")]
            tracing::info!(
                "[{}/{}] Extracting streams {:?} to {:?}",
                i + 1,
                total,
                job.stream_indices,
                destination
            );
            #[cfg(not(feature = "tracing"))]
            let _ = (i, total);

            let result = ensure_not_source(job, &destination)
                .and_then(|()| extractor.extract(job, &destination));

            #[cfg(feature = "tracing")]
            {
                if let Err(ref e) = result {
                    tracing::error!("Extraction of {:?} failed: {}", destination, e);
                }
            }

            JobOutcome {
                job: job.clone(),
                destination,
                result,
            }
        })
        .collect()
}

/// Refuse a destination that resolves to the job's own source file.
fn ensure_not_source(job: &DemuxJob, destination: &Path) -> Result<()> {
    let same = match (
        std::fs::canonicalize(&job.source_file),
        std::fs::canonicalize(destination),
    ) {
        (Ok(source), Ok(dest)) => source == dest,
        _ => job.source_file.as_path() == destination,
    };

    if same {
        return Err(Error::OutputIsSource {
            path: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Extractor backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: PathBuf,
    overwrite: bool,
}

impl FfmpegExtractor {
    /// Use a specific ffmpeg executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            overwrite: true,
        }
    }

    /// Whether existing outputs may be replaced (default: true).
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// ffmpeg arguments copying the job's streams into `output`.
    pub fn command_args(job: &DemuxJob, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y", "-v", "error", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(job.source_file.clone().into_os_string());

        for index in &job.stream_indices {
            args.push("-map".into());
            args.push(format!("0:{}", index).into());
        }

        args.push("-c".into());
        args.push("copy".into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Extractor for FfmpegExtractor {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn extract(&self, job: &DemuxJob, destination: &Path) -> Result<PathBuf> {
        if !job.source_file.exists() {
            return Err(Error::file_not_found(&job.source_file));
        }
        ensure_not_source(job, destination)?;
        if !self.overwrite && destination.exists() {
            return Err(Error::OutputExists {
                path: destination.to_path_buf(),
            });
        }

        let workspace = Workspace::new(destination)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Running ffmpeg into staging file {:?}", workspace.output());

        let result = Command::new(&self.program)
            .args(Self::command_args(job, workspace.output()))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::Io(e)
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            workspace.cleanup();
            return Err(Error::tool_failed("ffmpeg", stderr.trim().to_string()));
        }

        workspace.finalize(self.overwrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::JobKind;
    use std::sync::Mutex;

    #[test]
    fn test_command_args() {
        let job = DemuxJob::new(Path::new("/media/ep01.mkv"), JobKind::Video, vec![3, 2], ".dub");
        let args = FfmpegExtractor::command_args(&job, Path::new("/tmp/x/ep01.dub.mp4"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-nostdin",
                "-y",
                "-v",
                "error",
                "-i",
                "/media/ep01.mkv",
                "-map",
                "0:3",
                "-map",
                "0:2",
                "-c",
                "copy",
                "/tmp/x/ep01.dub.mp4",
            ]
        );
    }

    #[test]
    fn test_missing_source() {
        let job = DemuxJob::new(Path::new("/nonexistent/ep01.mkv"), JobKind::Audio, vec![1], "");
        let err = FfmpegExtractor::default()
            .extract(&job, Path::new("/nonexistent/ep01.aac"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_existing_output_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ep01.mkv");
        let dest = dir.path().join("ep01.aac");
        std::fs::write(&source, b"").unwrap();
        std::fs::write(&dest, b"").unwrap();

        let job = DemuxJob::new(&source, JobKind::Audio, vec![1], "");
        let err = FfmpegExtractor::default()
            .with_overwrite(false)
            .extract(&job, &dest)
            .unwrap_err();
        assert!(matches!(err, Error::OutputExists { .. }));
    }

    #[test]
    fn test_refuses_to_overwrite_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ep01.mp4");
        std::fs::write(&source, b"original container").unwrap();

        let job = DemuxJob::new(&source, JobKind::Video, vec![0, 1], "");
        let err = FfmpegExtractor::new("nonexistent_ffmpeg_12345")
            .extract(&job, &source)
            .unwrap_err();

        assert!(matches!(err, Error::OutputIsSource { .. }));
        assert_eq!(std::fs::read(&source).unwrap(), b"original container");
    }

    #[test]
    fn test_execute_plan_never_hands_source_to_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ep01.mp4");
        std::fs::write(&source, b"original container").unwrap();

        // A hand-built plan that bypasses the builder's name reservation.
        let plan = DemuxPlan {
            source_file: source.clone(),
            jobs: vec![DemuxJob::new(&source, JobKind::Video, vec![0, 1], "")],
            claimed: Default::default(),
            standalone: Vec::new(),
            primary_fallback: None,
            correlation_failures: Vec::new(),
            unknown_languages: Vec::new(),
            renames: Vec::new(),
        };
        let extractor = FailingOn {
            index: u32::MAX,
            seen: Mutex::new(Vec::new()),
        };
        let outcomes = execute_plan(&extractor, &plan, None);

        assert!(extractor.seen.lock().unwrap().is_empty());
        assert!(matches!(outcomes[0].result, Err(Error::OutputIsSource { .. })));
    }

    struct FailingOn {
        index: u32,
        seen: Mutex<Vec<u32>>,
    }

    impl Extractor for FailingOn {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract(&self, job: &DemuxJob, destination: &Path) -> Result<PathBuf> {
            self.seen.lock().unwrap().push(job.stream_indices[0]);
            if job.stream_indices[0] == self.index {
                Err(Error::tool_failed("ffmpeg", "boom"))
            } else {
                Ok(destination.to_path_buf())
            }
        }
    }

    #[test]
    fn test_execute_plan_continues_after_failure() {
        use crate::catalog::{CodecType, StreamCatalog, StreamDescriptor};
        use crate::plan::{DemuxPlanBuilder, LanguageSuffixResolver};

        let catalog = StreamCatalog::new(vec![
            StreamDescriptor::new(0, CodecType::Video),
            StreamDescriptor::new(1, CodecType::Audio).with_language("ja-JP"),
            StreamDescriptor::new(2, CodecType::Audio).with_language("en-US"),
            StreamDescriptor::new(3, CodecType::Subtitle).with_language("en"),
        ])
        .unwrap();
        let resolver = LanguageSuffixResolver::default();
        let plan = DemuxPlanBuilder::new(&resolver).build(Path::new("/media/ep01.mkv"), &catalog);

        let extractor = FailingOn {
            index: 2,
            seen: Mutex::new(Vec::new()),
        };
        let outcomes = execute_plan(&extractor, &plan, Some(Path::new("/out")));

        assert_eq!(*extractor.seen.lock().unwrap(), vec![0, 2, 3]);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());
        assert_eq!(outcomes[2].destination, PathBuf::from("/out/ep01.en.ass"));
    }
}
