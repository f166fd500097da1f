mod config;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use config::Config;
use facewatch_core::config::{DetectorBackend, ScoringStrategy, Threshold};
use facewatch_core::preprocess::prepare;
use facewatch_core::report::round_confidence;
use facewatch_core::scorer::{pixel_stats_score, template_score, PixelVector};
use facewatch_core::{
    CascadeDetector, DecodingLoader, FaceBox, FaceLocator, GalleryEntry, GalleryMatcher,
    HaarCascade, ImageLoader, ImageSource, MatchResult,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "facewatch", about = "Match probe images against a gallery of known faces")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match probe images against the gallery, one JSON report per probe
    Match {
        /// Gallery manifest (TOML) or image directory; overrides FACEWATCH_GALLERY
        #[arg(short, long)]
        gallery: Option<PathBuf>,
        /// Probe images
        #[arg(required = true)]
        probes: Vec<PathBuf>,
    },
    /// Print the face boxes located in an image
    Locate {
        image: PathBuf,
    },
    /// Score two images against each other with the configured strategy
    Score {
        a: PathBuf,
        b: PathBuf,
    },
    /// List gallery entries
    Gallery {
        #[arg(short, long)]
        gallery: Option<PathBuf>,
    },
}

/// Envelope around one probe's result.
#[derive(Debug, Serialize)]
struct Report {
    report_id: Uuid,
    probe: String,
    processed_at: DateTime<Utc>,
    strategy: ScoringStrategy,
    threshold: Threshold,
    result: Option<MatchResult>,
}

impl Report {
    fn new(
        probe: &Path,
        strategy: ScoringStrategy,
        threshold: Threshold,
        result: Option<MatchResult>,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            probe: probe.display().to_string(),
            processed_at: Utc::now(),
            strategy,
            threshold,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListedEntry {
    identity: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct PairScore {
    strategy: ScoringStrategy,
    score: f32,
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn build_locator(cfg: &Config) -> Result<FaceLocator> {
    let primary = load_cascade(cfg.detector, &cfg.primary_cascade)
        .with_context(|| format!("loading primary cascade {}", cfg.primary_cascade.display()))?;
    let alternate = load_cascade(cfg.detector, &cfg.alternate_cascade)
        .with_context(|| format!("loading alternate cascade {}", cfg.alternate_cascade.display()))?;
    tracing::debug!(detector = %cfg.detector, "cascades loaded");
    Ok(FaceLocator::new(primary, alternate))
}

fn load_cascade(backend: DetectorBackend, path: &Path) -> Result<Arc<dyn CascadeDetector>> {
    match backend {
        DetectorBackend::Native => Ok(Arc::new(HaarCascade::load(path)?)),
        DetectorBackend::OpenCv => load_opencv(path),
    }
}

#[cfg(feature = "opencv")]
fn load_opencv(path: &Path) -> Result<Arc<dyn CascadeDetector>> {
    Ok(Arc::new(facewatch_core::OpenCvCascade::load(path)?))
}

#[cfg(not(feature = "opencv"))]
fn load_opencv(_: &Path) -> Result<Arc<dyn CascadeDetector>> {
    bail!(facewatch_core::ConfigError::BackendUnavailable(DetectorBackend::OpenCv.to_string()))
}

fn list_gallery(path: &Path) -> Result<Vec<GalleryEntry>> {
    let provider = facewatch_gallery::open(path)?;
    let entries = provider
        .list_entries()
        .with_context(|| format!("listing gallery {}", path.display()))?;
    tracing::info!(gallery = %path.display(), entries = entries.len(), "gallery loaded");
    Ok(entries)
}

async fn run_match(
    cfg: Config,
    gallery: PathBuf,
    probes: Vec<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let entries = Arc::new(list_gallery(&gallery)?);
    let matcher = Arc::new(GalleryMatcher::new(
        build_locator(&cfg)?,
        Arc::new(DecodingLoader),
        cfg.matcher,
    )?);
    let strategy = matcher.config().strategy;
    let threshold = matcher.config().threshold;

    let mut set = JoinSet::new();
    for (index, probe) in probes.iter().cloned().enumerate() {
        let matcher = Arc::clone(&matcher);
        let entries = Arc::clone(&entries);
        set.spawn_blocking(move || {
            let result = matcher.match_source(&ImageSource::Path(probe.clone()), &entries);
            (index, Report::new(&probe, strategy, threshold, result))
        });
    }

    let mut reports: Vec<Option<Report>> = (0..probes.len()).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, report) = joined.context("probe task panicked")?;
        reports[index] = Some(report);
    }
    for report in reports.into_iter().flatten() {
        emit(&report, pretty)?;
    }
    Ok(())
}

fn first_face(locator: &FaceLocator, image: &image::DynamicImage, path: &Path) -> Result<FaceBox> {
    match locator.locate(image).into_iter().next() {
        Some(face) => Ok(face),
        None => bail!("no face located in {}", path.display()),
    }
}

fn run_score(cfg: &Config, a: &Path, b: &Path) -> Result<PairScore> {
    let loader = DecodingLoader;
    let img_a = loader.load(&ImageSource::Path(a.to_path_buf()))?;
    let img_b = loader.load(&ImageSource::Path(b.to_path_buf()))?;
    let strategy = cfg.matcher.strategy;

    let score = match strategy {
        ScoringStrategy::Template => {
            let locator = build_locator(cfg)?;
            let face_a = first_face(&locator, &img_a, a)?;
            let face_b = first_face(&locator, &img_b, b)?;
            match (prepare(&img_a, &face_a), prepare(&img_b, &face_b)) {
                (Some(pa), Some(pb)) => template_score(&pa, &pb),
                _ => 0.0,
            }
        }
        ScoringStrategy::PixelStats => {
            pixel_stats_score(&PixelVector::from_image(&img_a), &PixelVector::from_image(&img_b))
        }
    };
    Ok(PairScore {
        strategy,
        score: round_confidence(score),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;

    match cli.command {
        Commands::Match { gallery, probes } => {
            let gallery = gallery.unwrap_or_else(|| cfg.gallery.clone());
            run_match(cfg, gallery, probes, cli.pretty).await?;
        }
        Commands::Locate { image } => {
            let locator = build_locator(&cfg)?;
            let img = DecodingLoader.load(&ImageSource::Path(image))?;
            emit(&locator.locate(&img), cli.pretty)?;
        }
        Commands::Score { a, b } => {
            emit(&run_score(&cfg, &a, &b)?, cli.pretty)?;
        }
        Commands::Gallery { gallery } => {
            let path = gallery.unwrap_or_else(|| cfg.gallery.clone());
            let listed: Vec<ListedEntry> = list_gallery(&path)?
                .into_iter()
                .map(|e| ListedEntry {
                    source: e.source.describe(),
                    identity: e.identity,
                })
                .collect();
            emit(&listed, cli.pretty)?;
        }
    }

    Ok(())
}
