//! Assembles the demux plan for one file.

use super::correlate::{ClaimedSet, Correlation, VideoAudioCorrelator};
use super::language::LanguageSuffixResolver;
use super::subtitle::SubtitleClassifier;
use super::{DemuxJob, DemuxPlan, JobKind, OutputRename, UnknownLanguageTag};
use crate::catalog::StreamCatalog;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Audio indices not claimed by any video pairing, ascending.
pub fn standalone_audio(all_audio: &BTreeSet<u32>, claimed: &ClaimedSet) -> Vec<u32> {
    all_audio.difference(claimed.as_set()).copied().collect()
}

/// Builds [`DemuxPlan`]s from stream catalogs.
#[derive(Debug, Clone, Copy)]
pub struct DemuxPlanBuilder<'a> {
    resolver: &'a LanguageSuffixResolver,
    correlator: VideoAudioCorrelator,
}

impl<'a> DemuxPlanBuilder<'a> {
    pub fn new(resolver: &'a LanguageSuffixResolver) -> Self {
        Self {
            resolver,
            correlator: VideoAudioCorrelator::new(),
        }
    }

    /// Correlate `catalog` and build its plan.
    pub fn build(&self, source: &Path, catalog: &StreamCatalog) -> DemuxPlan {
        let correlation = self.correlator.correlate(catalog);
        self.build_from(source, catalog, correlation)
    }

    /// Build a plan from an existing correlation of `catalog`.
    pub fn build_from(
        &self,
        source: &Path,
        catalog: &StreamCatalog,
        correlation: Correlation,
    ) -> DemuxPlan {
        let Correlation {
            pairings,
            claimed,
            primary_fallback,
            failures,
        } = correlation;

        let mut unknown_languages = Vec::new();
        let mut jobs = Vec::new();

        for pairing in &pairings {
            let mut indices = vec![pairing.video_index];
            let suffix = match pairing.audio_index {
                Some(audio_index) => {
                    indices.push(audio_index);
                    self.audio_suffix(catalog, audio_index, &mut unknown_languages)
                }
                None => String::new(),
            };
            jobs.push(DemuxJob::new(source, JobKind::Video, indices, suffix));
        }

        let standalone = standalone_audio(&catalog.audio_indices(), &claimed);
        for &index in &standalone {
            let suffix = self.audio_suffix(catalog, index, &mut unknown_languages);
            jobs.push(DemuxJob::new(source, JobKind::Audio, vec![index], suffix));
        }

        for subtitle in SubtitleClassifier::new(self.resolver).classify_all(catalog) {
            if !subtitle.language_known {
                unknown_languages.push(UnknownLanguageTag {
                    stream_index: subtitle.index,
                    tag: subtitle.tag.clone(),
                    suffix: subtitle.suffix.clone(),
                });
            }
            jobs.push(DemuxJob::new(
                source,
                JobKind::Subtitle,
                vec![subtitle.index],
                subtitle.suffix,
            ));
        }

        let renames = dedupe_output_names(source, &mut jobs);

        let plan = DemuxPlan {
            source_file: source.to_path_buf(),
            jobs,
            claimed,
            standalone,
            primary_fallback,
            correlation_failures: failures,
            unknown_languages,
            renames,
        };

        #[cfg(feature = "tracing")]
        log_plan(&plan);

        plan
    }

    fn audio_suffix(
        &self,
        catalog: &StreamCatalog,
        index: u32,
        unknown: &mut Vec<UnknownLanguageTag>,
    ) -> String {
        let language = catalog.get(index).and_then(|s| s.language.as_deref());
        let resolved = self.resolver.resolve_stream(language);
        if !resolved.known {
            unknown.push(UnknownLanguageTag {
                stream_index: index,
                tag: resolved.tag,
                suffix: resolved.suffix.clone(),
            });
        }
        resolved.suffix
    }
}

/// Give every job a distinct output filename by appending `.2`, `.3`, ... to
/// later duplicates. Comparison ignores case so the plan is safe on
/// case-insensitive filesystems. The source's own name is reserved, so an
/// `.mp4` source is never chosen as an output.
fn dedupe_output_names(source: &Path, jobs: &mut [DemuxJob]) -> Vec<OutputRename> {
    let mut taken = HashSet::new();
    let mut renames = Vec::new();

    if let Some(name) = source.file_name() {
        taken.insert(name.to_string_lossy().to_lowercase());
    }

    for job in jobs.iter_mut() {
        if taken.insert(job.output_file_name().to_lowercase()) {
            continue;
        }

        let original_suffix = job.output_suffix.clone();
        let mut n = 2u32;
        loop {
            job.output_suffix = format!("{}.{}", original_suffix, n);
            if taken.insert(job.output_file_name().to_lowercase()) {
                break;
            }
            n += 1;
        }

        renames.push(OutputRename {
            stream_index: job.stream_indices.first().copied().unwrap_or_default(),
            original_suffix,
            suffix: job.output_suffix.clone(),
        });
    }

    renames
}

#[cfg(feature = "tracing")]
fn log_plan(plan: &DemuxPlan) {
    let file = plan.source_file.display();
    let claimed: Vec<u32> = plan.claimed.iter().collect();

    tracing::info!(
        "{}: claimed audio {:?}, standalone audio {:?}",
        file,
        claimed,
        plan.standalone
    );

    if let Some(ref fallback) = plan.primary_fallback {
        tracing::info!(
            "{}: stream #{} is not usable for primary video #{}, paired audio #{} instead",
            file,
            fallback.positional_index,
            fallback.video_index,
            fallback.chosen_index
        );
    }
    for failure in &plan.correlation_failures {
        tracing::warn!("{}: {}; extracting video without audio", file, failure);
    }
    for unknown in &plan.unknown_languages {
        tracing::warn!(
            "{}: language '{}' of stream #{} not in suffix table, using '{}'",
            file,
            unknown.tag,
            unknown.stream_index,
            unknown.suffix
        );
    }
    for rename in &plan.renames {
        tracing::warn!(
            "{}: output of stream #{} renamed from suffix '{}' to '{}' to avoid a collision",
            file,
            rename.stream_index,
            rename.original_suffix,
            rename.suffix
        );
    }
    for job in &plan.jobs {
        tracing::debug!(
            "{}: {:?} {:?} -> {}",
            file,
            job.kind,
            job.stream_indices,
            job.output_file_name()
        );
    }
}
