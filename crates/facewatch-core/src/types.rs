use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Axis-aligned face region in source-image pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Area of the axis-aligned intersection with `other` (0 when disjoint).
    pub fn intersection_area(&self, other: &FaceBox) -> u64 {
        let x1 = self.x.max(other.x) as u64;
        let y1 = self.y.max(other.y) as u64;
        let x2 = (self.x as u64 + self.width as u64).min(other.x as u64 + other.width as u64);
        let y2 = (self.y as u64 + self.height as u64).min(other.y as u64 + other.height as u64);

        if x1 < x2 && y1 < y2 {
            (x2 - x1) * (y2 - y1)
        } else {
            0
        }
    }

    /// Whether the two boxes overlap by more than `ratio` of the smaller box's area.
    pub fn overlaps(&self, other: &FaceBox, ratio: f64) -> bool {
        let inter = self.intersection_area(other);
        if inter == 0 {
            return false;
        }
        let min_area = self.area().min(other.area());
        inter as f64 > ratio * min_area as f64
    }

    /// Clip to an image of `width` × `height`. Returns `None` if nothing of
    /// positive area remains.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<FaceBox> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(FaceBox::new(self.x, self.y, w, h))
    }
}

/// Where an image comes from. The core only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Short human-readable description for log fields.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(p) => p.display().to_string(),
            ImageSource::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// A named reference subject and the image that represents them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub identity: String,
    pub source: ImageSource,
}

impl GalleryEntry {
    pub fn new(identity: impl Into<String>, source: impl Into<ImageSource>) -> Self {
        Self {
            identity: identity.into(),
            source: source.into(),
        }
    }
}

/// Outcome of matching one probe image against a gallery.
///
/// Only the most confident face of the probe is reported. `Unmatched` still
/// carries the best sub-threshold confidence that was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        identity: String,
        /// Similarity in [0, 100], rounded to two decimals.
        confidence: f32,
        face: FaceBox,
    },
    Unmatched {
        confidence: f32,
        face: FaceBox,
    },
}

impl MatchResult {
    pub fn confidence(&self) -> f32 {
        match self {
            MatchResult::Matched { confidence, .. } | MatchResult::Unmatched { confidence, .. } => {
                *confidence
            }
        }
    }

    pub fn face(&self) -> FaceBox {
        match self {
            MatchResult::Matched { face, .. } | MatchResult::Unmatched { face, .. } => *face,
        }
    }

    /// Identity label of the matched gallery entry (if any).
    pub fn identity(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { identity, .. } => Some(identity),
            MatchResult::Unmatched { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}
