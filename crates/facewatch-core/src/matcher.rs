//! Gallery matching: score every probe face against every usable gallery
//! entry and reduce to one reported result.
//!
//! Gallery preparation and scoring fan out over a rayon pool owned by the
//! matcher. Results are collected in gallery order and reduced on the calling
//! thread, so the outcome never depends on scheduling.

use crate::config::{MatcherConfig, ScoringStrategy, Threshold};
use crate::loader::ImageLoader;
use crate::locator::FaceLocator;
use crate::preprocess::prepare;
use crate::report::assemble;
use crate::scorer::{clamp_confidence, score, PixelVector, Sample};
use crate::types::{FaceBox, GalleryEntry, ImageSource, MatchResult};
use image::DynamicImage;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("failed to build gallery worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Scores of one probe face against the usable gallery entries, in gallery order.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceScores {
    pub face: FaceBox,
    pub scores: Vec<(String, f32)>,
}

impl FaceScores {
    pub fn new(face: FaceBox, scores: Vec<(String, f32)>) -> Self {
        Self { face, scores }
    }

    /// Highest score and the first entry that reached it.
    fn best(&self) -> (Option<&str>, f32) {
        let mut best: Option<(&str, f32)> = None;
        for (identity, raw) in &self.scores {
            let s = clamp_confidence(*raw);
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((identity.as_str(), s));
            }
        }
        match best {
            Some((identity, s)) => (Some(identity), s),
            None => (None, 0.0),
        }
    }
}

/// Reduce per-face scores to the single reported result.
///
/// The most confident face wins; the earlier face wins ties. `None` only when
/// there are no faces at all.
pub fn select_best(faces: &[FaceScores], threshold: Threshold) -> Option<MatchResult> {
    let mut winner: Option<(FaceBox, Option<&str>, f32)> = None;
    for face in faces {
        let (identity, confidence) = face.best();
        if winner.map_or(true, |(_, _, c)| confidence > c) {
            winner = Some((face.face, identity, confidence));
        }
    }
    winner.map(|(face, identity, confidence)| assemble(face, identity, confidence, threshold))
}

/// Matches probe images against a gallery with one configured strategy.
pub struct GalleryMatcher {
    locator: FaceLocator,
    loader: Arc<dyn ImageLoader>,
    config: MatcherConfig,
    pool: ThreadPool,
}

impl GalleryMatcher {
    pub fn new(
        locator: FaceLocator,
        loader: Arc<dyn ImageLoader>,
        config: MatcherConfig,
    ) -> Result<Self, MatcherError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers.unwrap_or(0))
            .thread_name(|i| format!("facewatch-gallery-{i}"))
            .build()?;
        tracing::debug!(
            strategy = %config.strategy,
            threshold = config.threshold.value(),
            workers = pool.current_num_threads(),
            "gallery matcher ready"
        );
        Ok(Self {
            locator,
            loader,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Load the probe, locate its faces, then match them.
    ///
    /// An unreadable probe or a probe without faces yields `None`. Location
    /// runs on the matcher's pool like the rest of the work.
    pub fn match_source(
        &self,
        probe: &ImageSource,
        gallery: &[GalleryEntry],
    ) -> Option<MatchResult> {
        let image = match self.loader.load(probe) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(probe = %probe.describe(), error = %e, "cannot load probe");
                return None;
            }
        };
        let faces = self.pool.install(|| self.locator.locate(&image));
        tracing::info!(probe = %probe.describe(), faces = faces.len(), "located probe faces");
        self.match_faces(&faces, &image, gallery)
    }

    /// Match already-located probe faces against `gallery`.
    pub fn match_faces(
        &self,
        probe_faces: &[FaceBox],
        probe_image: &DynamicImage,
        gallery: &[GalleryEntry],
    ) -> Option<MatchResult> {
        if probe_faces.is_empty() {
            return None;
        }

        let usable = self.prepare_gallery(gallery);
        if usable.is_empty() {
            tracing::warn!(entries = gallery.len(), "no usable gallery entries");
        }

        let whole = match self.config.strategy {
            ScoringStrategy::PixelStats => Some(PixelVector::from_image(probe_image)),
            ScoringStrategy::Template => None,
        };

        let per_face: Vec<FaceScores> = probe_faces
            .iter()
            .map(|face| {
                let sample = match &whole {
                    Some(pixels) => Some(Sample::Pixels(pixels.clone())),
                    None => prepare(probe_image, face).map(Sample::Patch),
                };
                let scores = match sample {
                    Some(sample) => self.pool.install(|| {
                        usable
                            .par_iter()
                            .map(|(identity, reference)| {
                                (identity.clone(), score(&sample, reference))
                            })
                            .collect::<Vec<_>>()
                    }),
                    None => Vec::new(),
                };
                FaceScores::new(*face, scores)
            })
            .collect();

        let result = select_best(&per_face, self.config.threshold);
        if let Some(r) = &result {
            tracing::info!(
                matched = r.is_match(),
                identity = r.identity().unwrap_or("-"),
                confidence = r.confidence(),
                "match complete"
            );
        }
        result
    }

    /// Load and sample every entry once, keeping gallery order.
    fn prepare_gallery(&self, gallery: &[GalleryEntry]) -> Vec<(String, Sample)> {
        let prepared: Vec<Option<Sample>> = self.pool.install(|| {
            gallery
                .par_iter()
                .map(|entry| self.prepare_entry(entry))
                .collect::<Vec<_>>()
        });
        gallery
            .iter()
            .zip(prepared)
            .filter_map(|(entry, sample)| sample.map(|s| (entry.identity.clone(), s)))
            .collect()
    }

    fn prepare_entry(&self, entry: &GalleryEntry) -> Option<Sample> {
        let image = match self.loader.load(&entry.source) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(
                    identity = %entry.identity,
                    source = %entry.source.describe(),
                    error = %e,
                    "skipping gallery entry"
                );
                return None;
            }
        };

        match self.config.strategy {
            ScoringStrategy::PixelStats => Some(Sample::Pixels(PixelVector::from_image(&image))),
            ScoringStrategy::Template => {
                let Some(face) = self.locator.locate(&image).into_iter().next() else {
                    tracing::debug!(
                        identity = %entry.identity,
                        "no face in gallery image; skipping"
                    );
                    return None;
                };
                prepare(&image, &face).map(Sample::Patch)
            }
        }
    }
}
