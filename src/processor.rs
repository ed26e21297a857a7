//! Sequential batch processing.
//!
//! Each file moves through `Probed -> Correlated -> Planned -> Extracted ->
//! CleanedUp` before the next file starts. A file that cannot be probed stops
//! there; the batch carries on with the next one.

use crate::config::Config;
use dubsplit_av::actions::{execute_plan, Extractor, FfmpegExtractor, JobOutcome};
use dubsplit_av::plan::{DemuxPlan, DemuxPlanBuilder, LanguageSuffixResolver, VideoAudioCorrelator};
use dubsplit_av::probe::{FfprobeProber, Prober};
use dubsplit_av::tools::{locate, Tool};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// How far a file got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    Probed,
    Correlated,
    Planned,
    Extracted,
    CleanedUp,
}

impl std::fmt::Display for FileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FileStage::Probed => "probed",
            FileStage::Correlated => "correlated",
            FileStage::Planned => "planned",
            FileStage::Extracted => "extracted",
            FileStage::CleanedUp => "cleaned up",
        };
        f.write_str(name)
    }
}

/// Outcome of processing one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Last stage reached; `None` when probing failed.
    pub stage: Option<FileStage>,
    pub plan: Option<DemuxPlan>,
    pub outcomes: Vec<JobOutcome>,
    /// Error that stopped the file before planning.
    pub error: Option<dubsplit_av::Error>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            stage: None,
            plan: None,
            outcomes: Vec::new(),
            error: None,
        }
    }

    fn advance(&mut self, stage: FileStage) {
        debug_assert!(self.stage.map_or(true, |s| s < stage));
        tracing::trace!("{:?}: {}", self.path, stage);
        self.stage = Some(stage);
    }

    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// No fatal error and no failed job.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed_jobs().next().is_none()
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Drives files through probing, planning and extraction.
pub struct BatchProcessor {
    prober: Box<dyn Prober>,
    extractor: Box<dyn Extractor>,
    resolver: LanguageSuffixResolver,
    output_dir: Option<PathBuf>,
    dry_run: bool,
}

impl BatchProcessor {
    pub fn new(
        prober: Box<dyn Prober>,
        extractor: Box<dyn Extractor>,
        resolver: LanguageSuffixResolver,
    ) -> Self {
        Self {
            prober,
            extractor,
            resolver,
            output_dir: None,
            dry_run: false,
        }
    }

    /// Build a processor using ffprobe/ffmpeg and the settings in `config`.
    pub fn from_config(config: &Config) -> Self {
        let ffprobe = resolve_tool(Tool::Ffprobe, config.tools.ffprobe_path.as_deref());
        let ffmpeg = resolve_tool(Tool::Ffmpeg, config.tools.ffmpeg_path.as_deref());

        let extractor = FfmpegExtractor::new(ffmpeg).with_overwrite(config.output.overwrite);

        Self::new(
            Box::new(FfprobeProber::new(ffprobe)),
            Box::new(extractor),
            config.languages.resolver(),
        )
        .with_output_dir(config.output.directory.clone())
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Stop after planning; nothing is written.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn prober(&self) -> &dyn Prober {
        self.prober.as_ref()
    }

    pub fn resolver(&self) -> &LanguageSuffixResolver {
        &self.resolver
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Process every file in order, continuing past failures.
    pub fn run(&self, files: &[PathBuf]) -> BatchReport {
        let total = files.len();
        let mut report = BatchReport::default();

        for (i, path) in files.iter().enumerate() {
            tracing::info!("[{}/{}] {:?}", i + 1, total, path);
            report.files.push(self.process_file(path));
        }

        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );

        report
    }

    /// Take one file through the whole pipeline.
    pub fn process_file(&self, path: &Path) -> FileReport {
        let mut report = FileReport::new(path);

        let catalog = match self.prober.probe(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Skipping {:?}: {} failed: {}", path, self.prober.name(), e);
                report.error = Some(e);
                return report;
            }
        };
        tracing::debug!("{:?}: {} streams", path, catalog.len());
        report.advance(FileStage::Probed);

        let correlation = VideoAudioCorrelator::new().correlate(&catalog);
        report.advance(FileStage::Correlated);

        let plan = DemuxPlanBuilder::new(&self.resolver).build_from(path, &catalog, correlation);
        report.advance(FileStage::Planned);

        if self.dry_run {
            tracing::info!("[DRY RUN] Would run {} jobs for {:?}", plan.jobs.len(), path);
            report.plan = Some(plan);
            return report;
        }

        report.outcomes = execute_plan(self.extractor.as_ref(), &plan, self.output_dir());
        report.plan = Some(plan);
        report.advance(FileStage::Extracted);

        // Every job's staging directory is dropped by the time execute_plan
        // returns, successful or not.
        report.advance(FileStage::CleanedUp);

        report
    }
}

fn resolve_tool(tool: Tool, configured: Option<&Path>) -> PathBuf {
    match locate(tool, configured) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("{}; files will fail when it is needed", e);
            configured
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(tool.name()))
        }
    }
}
