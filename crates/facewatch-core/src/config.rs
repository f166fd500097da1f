//! Validated pipeline parameters.
//!
//! Everything here is checked once, when a deployment is configured. A bad
//! threshold is a deployment mistake and fails construction instead of
//! surfacing per call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default threshold for template-correlation deployments (precision-leaning).
pub const DEFAULT_TEMPLATE_THRESHOLD: f32 = 25.0;
/// Default threshold for pixel-statistics deployments (sensitivity-leaning).
pub const DEFAULT_PIXEL_STATS_THRESHOLD: f32 = 5.0;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be a finite number in [0, 100], got {0}")]
    InvalidThreshold(f32),
    #[error("{key}: cannot parse {value:?} as {expected}")]
    Malformed {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("unknown scoring strategy {0:?} (expected \"template\" or \"pixel-stats\")")]
    UnknownStrategy(String),
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("invalid detection pass: {0}")]
    InvalidPass(String),
    #[error("unknown detector backend {0:?} (expected \"opencv\" or \"native\")")]
    UnknownBackend(String),
    #[error("detector backend {0:?} is not compiled in (enable the `opencv` feature)")]
    BackendUnavailable(String),
}

/// Which cascade evaluator runs the detection passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorBackend {
    /// OpenCV's `CascadeClassifier`. Needs the `opencv` feature.
    #[serde(rename = "opencv")]
    OpenCv,
    /// The built-in Viola-Jones evaluator.
    Native,
}

impl DetectorBackend {
    /// Whether this build can run the backend.
    pub fn is_available(self) -> bool {
        match self {
            DetectorBackend::OpenCv => cfg!(feature = "opencv"),
            DetectorBackend::Native => true,
        }
    }

    /// Fails for a backend this build does not include.
    pub fn ensure_available(self) -> Result<Self, ConfigError> {
        if self.is_available() {
            Ok(self)
        } else {
            Err(ConfigError::BackendUnavailable(self.to_string()))
        }
    }
}

impl Default for DetectorBackend {
    /// OpenCV when compiled in, the built-in evaluator otherwise.
    fn default() -> Self {
        if cfg!(feature = "opencv") {
            DetectorBackend::OpenCv
        } else {
            DetectorBackend::Native
        }
    }
}

impl FromStr for DetectorBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let backend = match s.trim().to_ascii_lowercase().as_str() {
            "opencv" => DetectorBackend::OpenCv,
            "native" => DetectorBackend::Native,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };
        backend.ensure_available()
    }
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorBackend::OpenCv => f.write_str("opencv"),
            DetectorBackend::Native => f.write_str("native"),
        }
    }
}

/// Which similarity measure a deployment scores with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// Normalized cross-correlation of preprocessed 100×100 face patches.
    #[default]
    Template,
    /// Blend of MSE, global SSIM and flattened correlation over whole images.
    PixelStats,
}

impl ScoringStrategy {
    /// The documented default threshold for this strategy.
    pub fn default_threshold(self) -> Threshold {
        match self {
            ScoringStrategy::Template => Threshold(DEFAULT_TEMPLATE_THRESHOLD),
            ScoringStrategy::PixelStats => Threshold(DEFAULT_PIXEL_STATS_THRESHOLD),
        }
    }
}

impl FromStr for ScoringStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "template" | "t" => Ok(ScoringStrategy::Template),
            "pixel-stats" | "pixel_stats" | "pixel" | "p" => Ok(ScoringStrategy::PixelStats),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::Template => f.write_str("template"),
            ScoringStrategy::PixelStats => f.write_str("pixel-stats"),
        }
    }
}

/// Match threshold on the [0, 100] confidence scale.
///
/// A face is matched only when its confidence is strictly greater than this.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f32);

impl Threshold {
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_exceeded_by(self, confidence: f32) -> bool {
        confidence > self.0
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f32::deserialize(deserializer)?;
        Threshold::new(value).map_err(serde::de::Error::custom)
    }
}

/// Parameters of one multi-scale cascade pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassParams {
    /// Window growth per scale level (> 1.0).
    pub scale_factor: f32,
    /// A grouped detection survives only with more than this many raw hits.
    pub min_neighbors: u32,
    /// Smallest window reported, `(width, height)`.
    pub min_size: (u32, u32),
}

impl PassParams {
    /// Fine scale step, moderate neighbour threshold, 30×30 minimum.
    pub const PRIMARY: PassParams = PassParams {
        scale_factor: 1.05,
        min_neighbors: 3,
        min_size: (30, 30),
    };

    /// Coarser scale step, looser neighbour threshold, 25×25 minimum.
    pub const ALTERNATE: PassParams = PassParams {
        scale_factor: 1.08,
        min_neighbors: 2,
        min_size: (25, 25),
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 1.0) {
            return Err(ConfigError::InvalidPass(format!(
                "scale_factor must be > 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.min_size.0 == 0 || self.min_size.1 == 0 {
            return Err(ConfigError::InvalidPass("min_size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Everything the gallery matcher needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    pub strategy: ScoringStrategy,
    pub threshold: Threshold,
    /// Gallery fan-out width. `None` sizes the pool to available cores.
    pub workers: Option<usize>,
}

impl MatcherConfig {
    pub fn new(strategy: ScoringStrategy, threshold: Threshold) -> Self {
        Self {
            strategy,
            threshold,
            workers: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        self.workers = Some(workers);
        Ok(self)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let strategy = ScoringStrategy::default();
        Self::new(strategy, strategy.default_threshold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_accepts_range() {
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(25.0).is_ok());
        assert!(Threshold::new(100.0).is_ok());
    }

    #[test]
    fn test_threshold_rejects_garbage() {
        assert!(Threshold::new(f32::NAN).is_err());
        assert_eq!(Threshold::new(-1.0), Err(ConfigError::InvalidThreshold(-1.0)));
        assert!(Threshold::new(100.5).is_err());
        assert!(Threshold::new(f32::INFINITY).is_err());
    }

    #[test]
    fn test_threshold_is_strict() {
        let t = Threshold::new(25.0).unwrap();
        assert!(!t.is_exceeded_by(25.0));
        assert!(t.is_exceeded_by(25.01));
    }

    #[test]
    fn test_threshold_deserialize_validates() {
        #[derive(Deserialize)]
        struct Wrapper {
            threshold: Threshold,
        }
        let ok: Wrapper = serde_json::from_str("{\"threshold\": 12.5}").unwrap();
        assert_eq!(ok.threshold.value(), 12.5);

        let bad = serde_json::from_str::<Wrapper>("{\"threshold\": 250.0}");
        assert!(bad.is_err());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("template".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Template));
        assert_eq!("Pixel-Stats".parse::<ScoringStrategy>(), Ok(ScoringStrategy::PixelStats));
        assert!(matches!(
            "embedding".parse::<ScoringStrategy>(),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_strategy_default_thresholds() {
        assert_eq!(ScoringStrategy::Template.default_threshold().value(), 25.0);
        assert_eq!(ScoringStrategy::PixelStats.default_threshold().value(), 5.0);
    }

    #[test]
    fn test_pass_profiles_valid() {
        assert!(PassParams::PRIMARY.validate().is_ok());
        assert!(PassParams::ALTERNATE.validate().is_ok());
        let bad = PassParams {
            scale_factor: 1.0,
            ..PassParams::PRIMARY
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("native".parse::<DetectorBackend>(), Ok(DetectorBackend::Native));
        assert!(matches!(
            "dlib".parse::<DetectorBackend>(),
            Err(ConfigError::UnknownBackend(_))
        ));
        if cfg!(feature = "opencv") {
            assert_eq!("OpenCV".parse::<DetectorBackend>(), Ok(DetectorBackend::OpenCv));
        } else {
            assert!(matches!(
                "opencv".parse::<DetectorBackend>(),
                Err(ConfigError::BackendUnavailable(_))
            ));
        }
    }

    #[test]
    fn test_default_backend_is_available() {
        let backend = DetectorBackend::default();
        assert!(backend.is_available());
        assert_eq!(backend == DetectorBackend::OpenCv, cfg!(feature = "opencv"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(
            MatcherConfig::default().with_workers(0),
            Err(ConfigError::ZeroWorkers)
        );
    }
}
