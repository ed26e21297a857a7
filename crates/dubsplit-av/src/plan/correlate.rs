//! Video/audio pairing.
//!
//! The primary video stream is paired positionally: in these containers the
//! audio that belongs to it sits directly after all video streams. Every
//! other video stream is a variant whose dedicated audio track names it in
//! its title, as `[Video: <variant title>]`.

use crate::catalog::{StreamCatalog, StreamDescriptor};
use serde::Serialize;
use std::collections::BTreeSet;

/// The marker a dedicated audio track carries for `variant`.
pub fn video_marker(variant: &str) -> String {
    format!("[Video: {}]", variant)
}

/// Whether `title` carries the marker for `variant`.
///
/// Plain substring comparison; variant titles routinely contain brackets,
/// parentheses and other characters that would be syntax in a pattern.
pub fn carries_video_marker(title: &str, variant: &str) -> bool {
    title.contains(&video_marker(variant))
}

/// Audio indices already assigned to a video pairing.
///
/// Built by a single correlation run and handed to the plan builder; it
/// never outlives the file it was built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClaimedSet(BTreeSet<u32>);

impl ClaimedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `index`; returns false if it was already claimed.
    pub fn claim(&mut self, index: u32) -> bool {
        self.0.insert(index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn as_set(&self) -> &BTreeSet<u32> {
        &self.0
    }
}

/// A video stream that could not be given its audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrelationFailure {
    /// No audio stream was available for the primary video.
    #[error("no audio stream available for primary video #{video_index}")]
    NoPrimaryAudio { video_index: u32 },

    /// A variant video stream has no title to look for.
    #[error("variant video #{video_index} has no title tag")]
    MissingVariantTitle { video_index: u32 },

    /// No unclaimed audio stream carries the variant's marker.
    #[error("no audio stream titled with \"[Video: {variant}]\" for video #{video_index}")]
    NoMatchingAudio { video_index: u32, variant: String },
}

/// The primary video did not find its audio at the conventional position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryAudioFallback {
    pub video_index: u32,
    /// Index the positional rule pointed at.
    pub positional_index: u32,
    /// Audio stream used instead.
    pub chosen_index: u32,
}

/// One video stream and the audio stream it was paired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoPairing {
    pub video_index: u32,
    pub audio_index: Option<u32>,
    /// Variant title; `None` for the primary video.
    pub variant: Option<String>,
}

/// Result of correlating one catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Correlation {
    /// Primary first, then variants in ascending index order.
    pub pairings: Vec<VideoPairing>,
    pub claimed: ClaimedSet,
    pub primary_fallback: Option<PrimaryAudioFallback>,
    pub failures: Vec<CorrelationFailure>,
}

/// Pairs video streams with their audio streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoAudioCorrelator;

impl VideoAudioCorrelator {
    pub fn new() -> Self {
        Self
    }

    pub fn correlate(&self, catalog: &StreamCatalog) -> Correlation {
        let videos: Vec<&StreamDescriptor> = catalog.videos().collect();
        let Some((primary, variants)) = videos.split_first() else {
            return Correlation::default();
        };

        let mut claimed = ClaimedSet::new();
        let mut failures = Vec::new();

        let variant_titles: Vec<&str> = variants.iter().filter_map(|&v| variant_title(v)).collect();
        let is_dedicated = |audio: &StreamDescriptor| {
            variant_titles
                .iter()
                .any(|t| carries_video_marker(audio.title_or_empty(), t))
        };

        // Variants claim their dedicated audio before the primary's fallback
        // search runs, so the fallback can never take a marked track.
        let mut variant_pairings = Vec::with_capacity(variants.len());
        for video in variants {
            let Some(title) = variant_title(video) else {
                failures.push(CorrelationFailure::MissingVariantTitle {
                    video_index: video.index,
                });
                variant_pairings.push(VideoPairing {
                    video_index: video.index,
                    audio_index: None,
                    variant: None,
                });
                continue;
            };

            let matched = catalog
                .audios()
                .find(|a| {
                    !claimed.contains(a.index) && carries_video_marker(a.title_or_empty(), title)
                })
                .map(|a| a.index);

            match matched {
                Some(audio_index) => {
                    claimed.claim(audio_index);
                }
                None => failures.push(CorrelationFailure::NoMatchingAudio {
                    video_index: video.index,
                    variant: title.to_string(),
                }),
            }

            variant_pairings.push(VideoPairing {
                video_index: video.index,
                audio_index: matched,
                variant: Some(title.to_string()),
            });
        }

        let positional_index = videos.len() as u32;
        let usable =
            |a: &StreamDescriptor| a.is_audio() && !claimed.contains(a.index) && !is_dedicated(a);

        let mut primary_fallback = None;
        let primary_audio = match catalog.get(positional_index).filter(|&a| usable(a)) {
            Some(audio) => Some(audio.index),
            None => {
                let chosen = catalog.audios().find(|&a| usable(a)).map(|a| a.index);
                if let Some(chosen_index) = chosen {
                    primary_fallback = Some(PrimaryAudioFallback {
                        video_index: primary.index,
                        positional_index,
                        chosen_index,
                    });
                }
                chosen
            }
        };

        match primary_audio {
            Some(index) => {
                claimed.claim(index);
            }
            None => failures.insert(
                0,
                CorrelationFailure::NoPrimaryAudio {
                    video_index: primary.index,
                },
            ),
        }

        let mut pairings = Vec::with_capacity(videos.len());
        pairings.push(VideoPairing {
            video_index: primary.index,
            audio_index: primary_audio,
            variant: None,
        });
        pairings.extend(variant_pairings);

        Correlation {
            pairings,
            claimed,
            primary_fallback,
            failures,
        }
    }
}

fn variant_title(video: &StreamDescriptor) -> Option<&str> {
    video.title.as_deref().filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CodecType;

    fn video(index: u32) -> StreamDescriptor {
        StreamDescriptor::new(index, CodecType::Video)
    }

    fn audio(index: u32, lang: &str) -> StreamDescriptor {
        StreamDescriptor::new(index, CodecType::Audio).with_language(lang)
    }

    fn correlate(streams: Vec<StreamDescriptor>) -> Correlation {
        VideoAudioCorrelator::new().correlate(&StreamCatalog::new(streams).unwrap())
    }

    #[test]
    fn test_marker_is_literal() {
        assert!(carries_video_marker("Foo [Video: Director's Cut]", "Director's Cut"));
        assert!(carries_video_marker("[Video: Cut (v2.0) [HD]*]", "Cut (v2.0) [HD]*"));
        assert!(!carries_video_marker("[Video: Cut (v2.0) [HD]*]", "Cut (v2.0)"));
        assert!(!carries_video_marker("[video: Alt]", "Alt"));
        assert!(!carries_video_marker("Video: Alt", "Alt"));
    }

    #[test]
    fn test_positional_single_audio() {
        let c = correlate(vec![video(0), audio(1, "ja-JP")]);
        assert_eq!(c.pairings.len(), 1);
        assert_eq!(c.pairings[0].audio_index, Some(1));
        assert!(c.primary_fallback.is_none());
        assert!(c.failures.is_empty());
    }

    #[test]
    fn test_positional_pairs_audio_after_all_videos() {
        let c = correlate(vec![
            video(0),
            audio(1, "ja-JP"),
            audio(2, "en-US"),
            audio(3, "fr-FR"),
        ]);
        assert_eq!(c.pairings[0].audio_index, Some(1));
        assert_eq!(c.claimed.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_positional_uses_video_count() {
        let c = correlate(vec![
            video(0),
            video(1).with_title("Alt"),
            audio(2, "ja-JP"),
            audio(3, "en-US").with_title("English [Video: Alt]"),
        ]);
        assert_eq!(c.pairings[0].audio_index, Some(2));
        assert_eq!(c.pairings[1].audio_index, Some(3));
        assert!(c.primary_fallback.is_none());
        assert_eq!(c.claimed.len(), 2);
    }

    #[test]
    fn test_variant_pairs_by_title_marker() {
        let c = correlate(vec![
            video(0),
            audio(1, "ja-JP"),
            video(2).with_title("Director's Cut"),
            audio(3, "ja-JP").with_title("Foo [Video: Director's Cut]"),
        ]);
        let variant = &c.pairings[1];
        assert_eq!(variant.video_index, 2);
        assert_eq!(variant.audio_index, Some(3));
        assert_eq!(variant.variant.as_deref(), Some("Director's Cut"));
        assert!(c.claimed.contains(3));
    }

    #[test]
    fn test_variant_title_with_pattern_characters_claims_audio() {
        let c = correlate(vec![
            video(0),
            audio(1, "ja-JP"),
            audio(2, "en-US").with_title("English [Video: Cut (v2.0) [HD]*]"),
            video(3).with_title("Cut (v2.0) [HD]*"),
        ]);
        assert_eq!(c.pairings[1].video_index, 3);
        assert_eq!(c.pairings[1].audio_index, Some(2));
        assert!(c.claimed.contains(2));
        assert!(c.failures.is_empty());
    }

    #[test]
    fn test_primary_skips_dedicated_positional_audio() {
        let c = correlate(vec![
            video(0),
            audio(1, "ja-JP"),
            audio(2, "en-US").with_title("[Video: Alt]"),
            video(3).with_title("Alt"),
        ]);
        assert_eq!(c.pairings[0].audio_index, Some(1));
        assert_eq!(c.pairings[1].audio_index, Some(2));
        assert_eq!(
            c.primary_fallback,
            Some(PrimaryAudioFallback {
                video_index: 0,
                positional_index: 2,
                chosen_index: 1,
            })
        );
    }

    #[test]
    fn test_variant_without_match_is_failure() {
        let c = correlate(vec![
            video(0),
            video(1).with_title("Extended"),
            audio(2, "ja-JP"),
        ]);
        assert_eq!(c.pairings[1].audio_index, None);
        assert_eq!(
            c.failures,
            vec![CorrelationFailure::NoMatchingAudio {
                video_index: 1,
                variant: "Extended".to_string(),
            }]
        );
        assert_eq!(c.pairings[0].audio_index, Some(2));
    }

    #[test]
    fn test_variant_without_title_is_failure() {
        let c = correlate(vec![video(0), video(1), audio(2, "ja-JP")]);
        assert_eq!(
            c.failures,
            vec![CorrelationFailure::MissingVariantTitle { video_index: 1 }]
        );
        assert_eq!(c.pairings[1].audio_index, None);
    }

    #[test]
    fn test_no_audio_at_all() {
        let c = correlate(vec![video(0)]);
        assert_eq!(
            c.failures,
            vec![CorrelationFailure::NoPrimaryAudio { video_index: 0 }]
        );
        assert_eq!(c.pairings[0].audio_index, None);
        assert!(c.claimed.is_empty());
    }

    #[test]
    fn test_no_video_streams() {
        let c = correlate(vec![audio(0, "ja-JP"), audio(1, "en-US")]);
        assert!(c.pairings.is_empty());
        assert!(c.claimed.is_empty());
    }

    #[test]
    fn test_two_variants_same_marker_each_claim_once() {
        let c = correlate(vec![
            video(0),
            video(1).with_title("Alt"),
            video(2).with_title("Alt"),
            audio(3, "ja-JP"),
            audio(4, "ja-JP").with_title("[Video: Alt]"),
            audio(5, "en-US").with_title("[Video: Alt]"),
        ]);
        assert_eq!(c.pairings[1].audio_index, Some(4));
        assert_eq!(c.pairings[2].audio_index, Some(5));
        assert_eq!(c.pairings[0].audio_index, Some(3));
    }

    #[test]
    fn test_correlation_is_repeatable() {
        let catalog = StreamCatalog::new(vec![
            video(0),
            audio(1, "ja-JP"),
            audio(2, "en-US").with_title("[Video: Alt]"),
            video(3).with_title("Alt"),
        ])
        .unwrap();
        let correlator = VideoAudioCorrelator::new();
        assert_eq!(correlator.correlate(&catalog), correlator.correlate(&catalog));
    }
}
