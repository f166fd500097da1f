//! Face Locator: two cascade passes, unioned and greedily de-duplicated.

use crate::config::{ConfigError, PassParams};
use crate::detector::CascadeDetector;
use crate::loader::ImageLoader;
use crate::types::{FaceBox, ImageSource};
use image::{DynamicImage, GrayImage};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::filter3x3;
use std::fmt;
use std::sync::Arc;

/// Candidates overlapping an accepted box by more than this fraction of the
/// smaller box's area are duplicates.
pub const OVERLAP_RATIO: f64 = 0.5;

/// 3×3 Gaussian (σ ≈ 0.8), normalised.
pub(crate) const GAUSSIAN_3X3: [f32; 9] = [
    0.0625, 0.125, 0.0625, 0.125, 0.25, 0.125, 0.0625, 0.125, 0.0625,
];

/// Finds face boxes in an image using an explicitly supplied detector pair.
#[derive(Clone)]
pub struct FaceLocator {
    primary: Arc<dyn CascadeDetector>,
    alternate: Arc<dyn CascadeDetector>,
    passes: [PassParams; 2],
}

impl FaceLocator {
    /// Pass A runs `primary` with [`PassParams::PRIMARY`], pass B runs
    /// `alternate` with [`PassParams::ALTERNATE`].
    pub fn new(primary: Arc<dyn CascadeDetector>, alternate: Arc<dyn CascadeDetector>) -> Self {
        Self {
            primary,
            alternate,
            passes: [PassParams::PRIMARY, PassParams::ALTERNATE],
        }
    }

    /// Use one detector for both passes.
    pub fn with_single(detector: Arc<dyn CascadeDetector>) -> Self {
        Self::new(detector.clone(), detector)
    }

    /// Override the two pass profiles. Both are validated here.
    pub fn with_passes(
        mut self,
        primary: PassParams,
        alternate: PassParams,
    ) -> Result<Self, ConfigError> {
        primary.validate()?;
        alternate.validate()?;
        self.passes = [primary, alternate];
        Ok(self)
    }

    /// Detect faces in `image`.
    ///
    /// Never fails: an empty image or a failing pass simply contributes no
    /// boxes. Returned boxes lie inside the image and have positive area.
    pub fn locate(&self, image: &DynamicImage) -> Vec<FaceBox> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let gray = detection_frame(image);
        let mut candidates = Vec::new();
        for (name, detector, params) in [
            ("primary", &self.primary, &self.passes[0]),
            ("alternate", &self.alternate, &self.passes[1]),
        ] {
            match detector.detect(&gray, params) {
                Ok(boxes) => {
                    tracing::debug!(pass = name, found = boxes.len(), "detector pass");
                    candidates.extend(boxes);
                }
                Err(e) => {
                    tracing::warn!(
                        pass = name,
                        error = %e,
                        "detector pass failed; treating as no faces"
                    );
                }
            }
        }

        let clipped: Vec<FaceBox> = candidates
            .iter()
            .filter_map(|b| b.clip_to(width, height))
            .collect();
        suppress_overlaps(clipped)
    }

    /// Load then locate. A load failure yields no faces.
    pub fn locate_source(&self, source: &ImageSource, loader: &dyn ImageLoader) -> Vec<FaceBox> {
        match loader.load(source) {
            Ok(image) => self.locate(&image),
            Err(e) => {
                tracing::warn!(
                    source = %source.describe(),
                    error = %e,
                    "cannot load image for location"
                );
                Vec::new()
            }
        }
    }
}

impl fmt::Debug for FaceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceLocator")
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

/// Luminance, histogram-equalised, lightly blurred: the frame the cascades scan.
fn detection_frame(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let equalized = equalize_histogram(&gray);
    filter3x3::<_, f32, u8>(&equalized, &GAUSSIAN_3X3)
}

/// Greedy, order-dependent duplicate removal.
///
/// Walks candidates in discovery order and accepts one unless it overlaps an
/// already-accepted box by more than [`OVERLAP_RATIO`] of the smaller area.
pub fn suppress_overlaps(candidates: Vec<FaceBox>) -> Vec<FaceBox> {
    let mut accepted: Vec<FaceBox> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !accepted.iter().any(|a| a.overlaps(&candidate, OVERLAP_RATIO)) {
            accepted.push(candidate);
        }
    }
    accepted
}
