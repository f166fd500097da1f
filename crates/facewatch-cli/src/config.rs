use anyhow::{Context, Result};
use facewatch_core::config::{
    ConfigError, DetectorBackend, MatcherConfig, ScoringStrategy, Threshold,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const PRIMARY_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";
const ALTERNATE_CASCADE_FILE: &str = "haarcascade_frontalface_alt2.xml";

/// CLI configuration: `FACEWATCH_*` environment variables layered over an
/// optional TOML file named by `FACEWATCH_CONFIG`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Cascade used by the fine-grained first detection pass.
    pub primary_cascade: PathBuf,
    /// Cascade used by the coarser second pass.
    pub alternate_cascade: PathBuf,
    /// Cascade evaluator for both passes.
    pub detector: DetectorBackend,
    /// Gallery manifest file or image directory.
    pub gallery: PathBuf,
    pub matcher: MatcherConfig,
}

/// Shape of the optional config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    cascade_dir: Option<PathBuf>,
    primary_cascade: Option<PathBuf>,
    alternate_cascade: Option<PathBuf>,
    detector: Option<DetectorBackend>,
    gallery: Option<PathBuf>,
    strategy: Option<ScoringStrategy>,
    threshold: Option<Threshold>,
    workers: Option<usize>,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match lookup("FACEWATCH_CONFIG") {
            Some(path) => read_file(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let data_dir = lookup("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("facewatch");

        let cascade_dir = lookup("FACEWATCH_CASCADE_DIR")
            .map(PathBuf::from)
            .or(file.cascade_dir)
            .unwrap_or_else(|| data_dir.join("cascades"));

        let primary_cascade = lookup("FACEWATCH_PRIMARY_CASCADE")
            .map(PathBuf::from)
            .or(file.primary_cascade)
            .unwrap_or_else(|| cascade_dir.join(PRIMARY_CASCADE_FILE));

        let alternate_cascade = lookup("FACEWATCH_ALTERNATE_CASCADE")
            .map(PathBuf::from)
            .or(file.alternate_cascade)
            .unwrap_or_else(|| cascade_dir.join(ALTERNATE_CASCADE_FILE));

        let detector = match lookup("FACEWATCH_DETECTOR") {
            Some(v) => v.parse::<DetectorBackend>()?,
            None => file.detector.unwrap_or_default().ensure_available()?,
        };

        let gallery = lookup("FACEWATCH_GALLERY")
            .map(PathBuf::from)
            .or(file.gallery)
            .unwrap_or_else(|| data_dir.join("gallery"));

        let strategy = match lookup("FACEWATCH_STRATEGY") {
            Some(v) => v.parse::<ScoringStrategy>()?,
            None => file.strategy.unwrap_or_default(),
        };

        let threshold = match lookup("FACEWATCH_THRESHOLD") {
            Some(v) => Threshold::new(parse_value("FACEWATCH_THRESHOLD", &v, "a number")?)?,
            None => file.threshold.unwrap_or_else(|| strategy.default_threshold()),
        };

        let workers = match lookup("FACEWATCH_WORKERS") {
            Some(v) => Some(parse_value::<usize>("FACEWATCH_WORKERS", &v, "a positive integer")?),
            None => file.workers,
        };

        let mut matcher = MatcherConfig::new(strategy, threshold);
        if let Some(n) = workers {
            matcher = matcher.with_workers(n)?;
        }

        Ok(Self {
            primary_cascade,
            alternate_cascade,
            detector,
            gallery,
            matcher,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

fn parse_value<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Malformed {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}
