//! facewatch-core: cascade face location and gallery matching.
//!
//! Probe images are scanned by two Haar cascade passes, each located face is
//! scored against every gallery subject with one of two similarity
//! strategies, and the most confident face is reported.
//!
//! The `opencv` feature adds `OpenCvCascade`, a detector backed by OpenCV's
//! `CascadeClassifier`. Without it the built-in [`HaarCascade`] evaluator runs
//! the passes.

pub mod cascade;
pub mod config;
pub mod detector;
pub mod gallery;
pub mod loader;
pub mod locator;
pub mod matcher;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod preprocess;
pub mod report;
pub mod scorer;
pub mod types;

pub use cascade::{CascadeError, HaarCascade};
pub use config::{
    ConfigError, DetectorBackend, MatcherConfig, PassParams, ScoringStrategy, Threshold,
};
pub use detector::{CascadeDetector, DetectorError};
pub use gallery::{GalleryError, GalleryProvider};
pub use loader::{DecodingLoader, ImageLoader, LoadError};
pub use locator::FaceLocator;
pub use matcher::{select_best, FaceScores, GalleryMatcher, MatcherError};
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvCascade;
pub use types::{FaceBox, GalleryEntry, ImageSource, MatchResult};
