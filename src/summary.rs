//! Human-readable plan and batch summaries for the CLI.

use crate::processor::{BatchReport, FileReport};
use dubsplit_av::plan::DemuxPlan;
use std::fmt;
use std::path::Path;

/// A plan's jobs followed by its [`PlanNotes`].
pub struct PlanSummary<'a> {
    plan: &'a DemuxPlan,
    output_dir: Option<&'a Path>,
}

impl<'a> PlanSummary<'a> {
    pub fn new(plan: &'a DemuxPlan, output_dir: Option<&'a Path>) -> Self {
        Self { plan, output_dir }
    }
}

impl fmt::Display for PlanSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        writeln!(f, "File: {}", plan.source_file.display())?;
        writeln!(f, "Jobs: {}", plan.jobs.len())?;
        for (i, job) in plan.jobs.iter().enumerate() {
            writeln!(
                f,
                "  {}. {:<8} {:?} -> {}",
                i + 1,
                job.kind,
                job.stream_indices,
                job.output_path(self.output_dir).display()
            )?;
        }
        write!(f, "{}", PlanNotes(plan))
    }
}

/// How the audio was split up, plus every automatic decision worth a look.
pub struct PlanNotes<'a>(pub &'a DemuxPlan);

impl fmt::Display for PlanNotes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.0;
        let claimed: Vec<u32> = plan.claimed.iter().collect();
        writeln!(
            f,
            "Audio: claimed {:?}, standalone {:?}",
            claimed, plan.standalone
        )?;

        if !plan.has_warnings() && plan.primary_fallback.is_none() {
            return Ok(());
        }

        writeln!(f, "Notes:")?;
        if let Some(ref fallback) = plan.primary_fallback {
            writeln!(
                f,
                "  video {}: stream {} is not usable audio, paired with {} instead",
                fallback.video_index, fallback.positional_index, fallback.chosen_index
            )?;
        }
        for failure in &plan.correlation_failures {
            writeln!(f, "  {}", failure)?;
        }
        for unknown in &plan.unknown_languages {
            writeln!(
                f,
                "  stream {}: unknown language '{}', using suffix '{}'",
                unknown.stream_index, unknown.tag, unknown.suffix
            )?;
        }
        for rename in &plan.renames {
            writeln!(
                f,
                "  stream {}: suffix '{}' renamed to '{}' to avoid a name clash",
                rename.stream_index, rename.original_suffix, rename.suffix
            )?;
        }
        Ok(())
    }
}

/// Per-file results of a `demux` run and the final tally.
pub struct ReportSummary<'a> {
    report: &'a BatchReport,
    dry_run: bool,
    output_dir: Option<&'a Path>,
}

impl<'a> ReportSummary<'a> {
    pub fn new(report: &'a BatchReport, dry_run: bool, output_dir: Option<&'a Path>) -> Self {
        Self {
            report,
            dry_run,
            output_dir,
        }
    }

    fn write_file(&self, f: &mut fmt::Formatter<'_>, file: &FileReport) -> fmt::Result {
        if let Some(ref e) = file.error {
            return writeln!(f, "✗ {}: {}", file.path.display(), e);
        }

        match file.plan {
            Some(ref plan) if self.dry_run => {
                writeln!(f, "[DRY RUN] Would run {} jobs", plan.jobs.len())?;
                write!(f, "{}", PlanSummary::new(plan, self.output_dir))
            }
            ref plan => {
                let status = if file.is_success() { "✓" } else { "✗" };
                writeln!(f, "{} {}", status, file.path.display())?;
                for outcome in &file.outcomes {
                    match outcome.result {
                        Ok(ref path) => writeln!(f, "    {}", path.display())?,
                        Err(ref e) => {
                            writeln!(f, "    failed {}: {}", outcome.destination.display(), e)?
                        }
                    }
                }
                match plan {
                    Some(plan) => write!(f, "{}", PlanNotes(plan)),
                    None => Ok(()),
                }
            }
        }
    }
}

impl fmt::Display for ReportSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.report.files {
            writeln!(f)?;
            self.write_file(f, file)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{} files: {} succeeded, {} failed",
            self.report.files.len(),
            self.report.succeeded(),
            self.report.failed()
        )
    }
}
