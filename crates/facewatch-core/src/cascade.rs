//! Haar cascade evaluator for OpenCV cascade XML files.
//!
//! Implements the Viola-Jones detector: boosted stages of Haar-like rectangle
//! features evaluated over an integral image, with per-window variance
//! normalisation. The window is scaled up over the image rather than the image
//! being scaled down, so all boxes come back in source coordinates.

use crate::config::PassParams;
use crate::detector::{group_rectangles, CascadeDetector, DetectorError, GROUP_EPS};
use crate::types::FaceBox;
use image::GrayImage;
use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("cascade file not found: {0}")]
    NotFound(String),
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cascade XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed cascade: {0}")]
    Malformed(String),
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    #[cfg(feature = "opencv")]
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightedRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    weight: f32,
}

#[derive(Debug, Clone)]
struct Feature {
    rects: Vec<WeightedRect>,
}

/// One split of a weak classifier tree. Child indices `<= 0` address leaves.
#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f32,
}

#[derive(Debug, Clone)]
struct WeakClassifier {
    nodes: Vec<Node>,
    leaves: Vec<f32>,
}

#[derive(Debug, Clone)]
struct Stage {
    threshold: f32,
    classifiers: Vec<WeakClassifier>,
}

/// A loaded, immutable Haar cascade.
#[derive(Debug, Clone)]
pub struct HaarCascade {
    window: (u32, u32),
    stages: Vec<Stage>,
    features: Vec<Feature>,
}

impl HaarCascade {
    /// Load a cascade from an OpenCV `opencv-cascade-classifier` XML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CascadeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CascadeError::NotFound(path.display().to_string()));
        }
        let xml = std::fs::read_to_string(path).map_err(|e| CascadeError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let cascade = Self::from_xml(&xml)?;

        tracing::info!(
            path = %path.display(),
            window = ?cascade.window,
            stages = cascade.stages.len(),
            features = cascade.features.len(),
            "loaded Haar cascade"
        );
        Ok(cascade)
    }

    /// Parse cascade XML text.
    pub fn from_xml(xml: &str) -> Result<Self, CascadeError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc
            .descendants()
            .find(|n| n.has_tag_name("cascade"))
            .ok_or_else(|| {
                CascadeError::Unsupported("no <cascade> element (legacy cascade format?)".into())
            })?;

        if let Some(stage_type) = child(root, "stageType") {
            let t = text(stage_type);
            if t != "BOOST" {
                return Err(CascadeError::Unsupported(format!("stage type {t}")));
            }
        }
        let feature_type = child(root, "featureType")
            .map(text)
            .unwrap_or("HAAR");
        if feature_type != "HAAR" {
            return Err(CascadeError::Unsupported(format!("feature type {feature_type}")));
        }

        let width: u32 = parse_one(required(root, "width")?, "width")?;
        let height: u32 = parse_one(required(root, "height")?, "height")?;
        if width < 3 || height < 3 {
            return Err(CascadeError::Malformed(format!("window {width}x{height} too small")));
        }

        let features = elements(required(root, "features")?)
            .map(parse_feature)
            .collect::<Result<Vec<_>, _>>()?;

        let stages = elements(required(root, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;

        let cascade = Self {
            window: (width, height),
            stages,
            features,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    /// Base detection window `(width, height)`.
    pub fn window(&self) -> (u32, u32) {
        self.window
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn validate(&self) -> Result<(), CascadeError> {
        if self.stages.is_empty() {
            return Err(CascadeError::Malformed("cascade has no stages".into()));
        }
        let (w, h) = self.window;
        for (fi, f) in self.features.iter().enumerate() {
            if f.rects.is_empty() {
                return Err(CascadeError::Malformed(format!("feature {fi} has no rects")));
            }
            for r in &f.rects {
                if r.x + r.width > w || r.y + r.height > h {
                    return Err(CascadeError::Malformed(format!(
                        "feature {fi} rect outside {w}x{h} window"
                    )));
                }
            }
        }
        for (si, stage) in self.stages.iter().enumerate() {
            for wc in &stage.classifiers {
                if wc.nodes.is_empty() {
                    return Err(CascadeError::Malformed(format!("stage {si}: empty classifier")));
                }
                for node in &wc.nodes {
                    if node.feature >= self.features.len() {
                        return Err(CascadeError::Malformed(format!(
                            "stage {si}: feature index {} out of range",
                            node.feature
                        )));
                    }
                    for idx in [node.left, node.right] {
                        let ok = if idx > 0 {
                            (idx as usize) < wc.nodes.len()
                        } else {
                            ((-idx) as usize) < wc.leaves.len()
                        };
                        if !ok {
                            return Err(CascadeError::Malformed(format!(
                                "stage {si}: child index {idx} out of range"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Rescale every feature for a window of `win_w` × `win_h` at `scale`.
    ///
    /// Weights fold in the inverse area of the normalisation rectangle; the
    /// first rect's weight is recomputed so the feature stays zero-sum after
    /// rounding.
    fn scale_features(&self, scale: f64, win_w: u32, win_h: u32) -> ScaledCascade {
        let norm = scaled_norm_rect(self.window, scale, win_w, win_h);
        let inv_area = 1.0 / (norm.width as f64 * norm.height as f64);

        let features = self
            .features
            .iter()
            .map(|f| {
                let mut rects: Vec<ScaledRect> = f
                    .rects
                    .iter()
                    .map(|r| {
                        let x = ((r.x as f64 * scale).round() as u32).min(win_w - 1);
                        let y = ((r.y as f64 * scale).round() as u32).min(win_h - 1);
                        let w = ((r.width as f64 * scale).round() as u32).clamp(1, win_w - x);
                        let h = ((r.height as f64 * scale).round() as u32).clamp(1, win_h - y);
                        ScaledRect {
                            x,
                            y,
                            width: w,
                            height: h,
                            weight: r.weight as f64 * inv_area,
                        }
                    })
                    .collect();

                if rects.len() > 1 {
                    let area0 = rects[0].area();
                    let rest: f64 = f.rects[1..]
                        .iter()
                        .zip(&rects[1..])
                        .map(|(orig, sr)| orig.weight as f64 * sr.area())
                        .sum();
                    if area0 > 0.0 {
                        rects[0].weight = -rest / area0 * inv_area;
                    }
                }
                rects
            })
            .collect();

        ScaledCascade { norm, features }
    }

    /// Run every stage on the window at `(x, y)`. True if all stages pass.
    fn accepts(&self, ii: &IntegralImages, sc: &ScaledCascade, x: u32, y: u32) -> bool {
        let n = &sc.norm;
        let area = n.width as u64 * n.height as u64;
        let sum = ii.sum(x + n.x, y + n.y, n.width, n.height) as i128;
        let sq = ii.sq_sum(x + n.x, y + n.y, n.width, n.height) as i128;
        // area * stddev, exact in integers; a flat window normalises by 1.
        let nf = area as i128 * sq - sum * sum;
        let nf = if nf > 0 { (nf as f64).sqrt() } else { 1.0 };
        let stddev = nf / area as f64;

        for stage in &self.stages {
            let mut stage_sum = 0.0f64;
            for wc in &stage.classifiers {
                let mut idx = 0i32;
                loop {
                    let node = &wc.nodes[idx as usize];
                    let value: f64 = sc.features[node.feature]
                        .iter()
                        .map(|r| r.weight * ii.sum(x + r.x, y + r.y, r.width, r.height) as f64)
                        .sum();
                    idx = if value < node.threshold as f64 * stddev {
                        node.left
                    } else {
                        node.right
                    };
                    if idx <= 0 {
                        break;
                    }
                }
                stage_sum += wc.leaves[(-idx) as usize] as f64;
            }
            if stage_sum < stage.threshold as f64 {
                return false;
            }
        }
        true
    }

    /// Every accepted window over all scales, before grouping.
    fn raw_hits(&self, gray: &GrayImage, params: &PassParams) -> Vec<FaceBox> {
        let (img_w, img_h) = gray.dimensions();
        let ii = IntegralImages::new(gray);
        let (base_w, base_h) = self.window;

        let mut hits = Vec::new();
        let mut scale = 1.0f64;
        loop {
            let win_w = (base_w as f64 * scale).round() as u32;
            let win_h = (base_h as f64 * scale).round() as u32;
            if win_w > img_w || win_h > img_h {
                break;
            }

            if win_w >= params.min_size.0 && win_h >= params.min_size.1 {
                let scaled = self.scale_features(scale, win_w, win_h);
                let step = if scale > 2.0 { scale } else { 2.0 * scale };
                let step = (step.round() as usize).max(1);

                let rows: Vec<u32> = (0..=img_h - win_h).step_by(step).collect();
                let level: Vec<Vec<FaceBox>> = rows
                    .par_iter()
                    .map(|&y| {
                        (0..=img_w - win_w)
                            .step_by(step)
                            .filter(|&x| self.accepts(&ii, &scaled, x, y))
                            .map(|x| FaceBox::new(x, y, win_w, win_h))
                            .collect()
                    })
                    .collect();
                hits.extend(level.into_iter().flatten());
            }

            scale *= params.scale_factor as f64;
        }
        hits
    }
}

impl CascadeDetector for HaarCascade {
    fn detect(&self, gray: &GrayImage, params: &PassParams) -> Result<Vec<FaceBox>, DetectorError> {
        params
            .validate()
            .map_err(|e| DetectorError::InvalidParams(e.to_string()))?;

        let (w, h) = gray.dimensions();
        if w < self.window.0 || h < self.window.1 {
            return Err(DetectorError::ImageTooSmall { width: w, height: h });
        }

        let raw = self.raw_hits(gray, params);
        let grouped = group_rectangles(&raw, params.min_neighbors, GROUP_EPS);
        tracing::debug!(
            raw = raw.len(),
            grouped = grouped.len(),
            scale_factor = params.scale_factor,
            min_neighbors = params.min_neighbors,
            "cascade pass complete"
        );
        Ok(grouped)
    }
}

#[derive(Debug, Clone, Copy)]
struct ScaledRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    weight: f64,
}

impl ScaledRect {
    fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

struct ScaledCascade {
    norm: ScaledRect,
    features: Vec<Vec<ScaledRect>>,
}

/// Window interior, one base pixel in from each edge.
fn scaled_norm_rect(window: (u32, u32), scale: f64, win_w: u32, win_h: u32) -> ScaledRect {
    let x = (scale.round() as u32).min(win_w / 2);
    let y = (scale.round() as u32).min(win_h / 2);
    let w = (((window.0 - 2) as f64 * scale).round() as u32).clamp(1, win_w - x);
    let h = (((window.1 - 2) as f64 * scale).round() as u32).clamp(1, win_h - y);
    ScaledRect {
        x,
        y,
        width: w,
        height: h,
        weight: 1.0,
    }
}

/// Summed-area tables of pixel values and squared pixel values.
struct IntegralImages {
    stride: usize,
    sum: Vec<u64>,
    sq: Vec<u64>,
}

impl IntegralImages {
    fn new(gray: &GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let (w, h) = (w as usize, h as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sq = vec![0u64; stride * (h + 1)];
        let raw = gray.as_raw();

        for y in 0..h {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let p = raw[y * w + x] as u64;
                row_sum += p;
                row_sq += p * p;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = sum[idx - stride] + row_sum;
                sq[idx] = sq[idx - stride] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    fn rect(table: &[u64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        (table[y1 * stride + x1] + table[y0 * stride + x0])
            - (table[y1 * stride + x0] + table[y0 * stride + x1])
    }

    fn sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        Self::rect(&self.sum, self.stride, x, y, w, h)
    }

    fn sq_sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        Self::rect(&self.sq, self.stride, x, y, w, h)
    }
}

// --- XML helpers ---

fn child<'a, 'i>(node: roxmltree::Node<'a, 'i>, name: &str) -> Option<roxmltree::Node<'a, 'i>> {
    node.children().find(|c| c.is_element() && c.has_tag_name(name))
}

fn required<'a, 'i>(
    node: roxmltree::Node<'a, 'i>,
    name: &str,
) -> Result<roxmltree::Node<'a, 'i>, CascadeError> {
    child(node, name).ok_or_else(|| CascadeError::Malformed(format!("missing <{name}>")))
}

fn elements<'a, 'i>(
    node: roxmltree::Node<'a, 'i>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'i>> {
    node.children().filter(|c| c.is_element())
}

fn text<'a>(node: roxmltree::Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn parse_one<T: std::str::FromStr>(
    node: roxmltree::Node<'_, '_>,
    what: &str,
) -> Result<T, CascadeError> {
    let t = text(node);
    t.parse()
        .map_err(|_| CascadeError::Malformed(format!("<{what}>: cannot parse {t:?}")))
}

fn parse_numbers<T: std::str::FromStr>(
    node: roxmltree::Node<'_, '_>,
    what: &str,
) -> Result<Vec<T>, CascadeError> {
    text(node)
        .split_whitespace()
        .map(|tok| {
            tok.parse()
                .map_err(|_| CascadeError::Malformed(format!("<{what}>: cannot parse {tok:?}")))
        })
        .collect()
}

fn parse_feature(node: roxmltree::Node<'_, '_>) -> Result<Feature, CascadeError> {
    if let Some(tilted) = child(node, "tilted") {
        if text(tilted) != "0" {
            return Err(CascadeError::Unsupported("tilted Haar features".into()));
        }
    }
    let rects = elements(required(node, "rects")?)
        .map(|r| {
            let v: Vec<f32> = parse_numbers(r, "rects")?;
            if v.len() != 5 || v[..4].iter().any(|c| *c < 0.0) {
                return Err(CascadeError::Malformed(format!("bad feature rect {v:?}")));
            }
            Ok(WeightedRect {
                x: v[0] as u32,
                y: v[1] as u32,
                width: v[2] as u32,
                height: v[3] as u32,
                weight: v[4],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Feature { rects })
}

fn parse_stage(node: roxmltree::Node<'_, '_>) -> Result<Stage, CascadeError> {
    let threshold: f32 = parse_one(required(node, "stageThreshold")?, "stageThreshold")?;
    let classifiers = elements(required(node, "weakClassifiers")?)
        .map(|wc| {
            let raw: Vec<f64> = parse_numbers(required(wc, "internalNodes")?, "internalNodes")?;
            if raw.is_empty() || raw.len() % 4 != 0 {
                return Err(CascadeError::Unsupported(format!(
                    "internalNodes with {} values (categorical splits?)",
                    raw.len()
                )));
            }
            let nodes = raw
                .chunks_exact(4)
                .map(|c| Node {
                    left: c[0] as i32,
                    right: c[1] as i32,
                    feature: c[2] as usize,
                    threshold: c[3] as f32,
                })
                .collect();
            let leaves = parse_numbers(required(wc, "leafValues")?, "leafValues")?;
            Ok(WeakClassifier { nodes, leaves })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A one-stage, one-stump cascade on a 20×20 window. Its single feature
    /// (bottom half minus top half) accepts windows whose top is darker.
    pub(crate) const DARK_OVER_LIGHT_XML: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>20</height>
  <width>20</width>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 0.25</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 20 20 -1.</_>
        <_>
          0 10 20 10 2.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    /// Test image: gray background with dark-over-light blocks at the given
    /// top-left corners, each 40×40.
    pub(crate) fn blocks_image(w: u32, h: u32, corners: &[(u32, u32)]) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, image::Luma([128]));
        for &(cx, cy) in corners {
            for y in cy..cy + 40 {
                for x in cx..cx + 40 {
                    let v = if y < cy + 20 { 30 } else { 230 };
                    img.put_pixel(x, y, image::Luma([v]));
                }
            }
        }
        img
    }

    #[test]
    fn test_parse_minimal_cascade() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        assert_eq!(c.window(), (20, 20));
        assert_eq!(c.stage_count(), 1);
        assert_eq!(c.features.len(), 1);
        assert_eq!(c.features[0].rects.len(), 2);
        assert_eq!(c.features[0].rects[1].weight, 2.0);
    }

    #[test]
    fn test_parse_rejects_lbp() {
        let xml = DARK_OVER_LIGHT_XML.replace("<featureType>HAAR", "<featureType>LBP");
        assert!(matches!(
            HaarCascade::from_xml(&xml),
            Err(CascadeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_parse_rejects_tilted() {
        let xml = DARK_OVER_LIGHT_XML.replace("</rects></_>", "</rects><tilted>1</tilted></_>");
        assert!(matches!(
            HaarCascade::from_xml(&xml),
            Err(CascadeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_feature_index() {
        let xml = DARK_OVER_LIGHT_XML.replace("0 -1 0 0.25", "0 -1 7 0.25");
        assert!(matches!(
            HaarCascade::from_xml(&xml),
            Err(CascadeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_legacy_format() {
        let xml = r#"<?xml version="1.0"?><opencv_storage><haarcascade_frontalface type_id="opencv-haar-classifier"></haarcascade_frontalface></opencv_storage>"#;
        assert!(matches!(
            HaarCascade::from_xml(xml),
            Err(CascadeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            HaarCascade::load("/no/such/cascade.xml"),
            Err(CascadeError::NotFound(_))
        ));
    }

    #[test]
    fn test_integral_rect_sum() {
        let img = GrayImage::from_fn(4, 3, |x, y| image::Luma([(x + y * 4) as u8]));
        let ii = IntegralImages::new(&img);
        // Whole image: 0 + 1 + ... + 11 = 66
        assert_eq!(ii.sum(0, 0, 4, 3), 66);
        // Bottom-right 2x2: 6 + 7 + 10 + 11 = 34
        assert_eq!(ii.sum(2, 1, 2, 2), 34);
        assert_eq!(ii.sq_sum(0, 0, 1, 1), 0);
        assert_eq!(ii.sq_sum(3, 2, 1, 1), 121);
    }

    #[test]
    fn test_scaled_features_stay_zero_sum() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let sc = c.scale_features(1.7, 34, 34);
        let f = &sc.features[0];
        let balance: f64 = f.iter().map(|r| r.weight * r.area()).sum();
        assert!(balance.abs() < 1e-9, "balance = {balance}");
    }

    #[test]
    fn test_detects_block_at_base_scale() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let img = blocks_image(120, 120, &[(40, 40)]);
        let params = PassParams {
            scale_factor: 1.25,
            min_neighbors: 1,
            min_size: (20, 20),
        };
        let faces = c.detect(&img, &params).unwrap();
        assert!(!faces.is_empty(), "expected at least one detection");
        // Every grouped box overlaps the planted block.
        let block = FaceBox::new(40, 40, 40, 40);
        for f in &faces {
            assert!(f.intersection_area(&block) > 0, "stray box {f:?}");
        }
    }

    #[test]
    fn test_flat_image_yields_nothing() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let img = GrayImage::from_pixel(100, 100, image::Luma([128]));
        let faces = c.detect(&img, &PassParams::PRIMARY).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn test_low_contrast_block_is_detected() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let mut img = GrayImage::from_pixel(120, 120, image::Luma([128]));
        for y in 40..80 {
            for x in 40..80 {
                let v = if y < 60 { 119 } else { 137 };
                img.put_pixel(x, y, image::Luma([v]));
            }
        }
        let params = PassParams {
            scale_factor: 1.25,
            min_neighbors: 0,
            min_size: (20, 20),
        };
        let hits = c.raw_hits(&img, &params);
        assert!(hits.contains(&FaceBox::new(40, 50, 20, 20)), "hits: {hits:?}");
        assert!(!c.detect(&img, &params).unwrap().is_empty());
    }

    #[test]
    fn test_flat_window_still_runs_stages() {
        // A stage that every window passes: flat windows must reach it.
        let xml = DARK_OVER_LIGHT_XML.replace(
            "<stageThreshold>0.</stageThreshold>",
            "<stageThreshold>-2.</stageThreshold>",
        );
        let c = HaarCascade::from_xml(&xml).unwrap();
        let img = GrayImage::from_pixel(40, 40, image::Luma([90]));
        let params = PassParams {
            scale_factor: 1.25,
            min_neighbors: 0,
            min_size: (20, 20),
        };
        assert!(!c.raw_hits(&img, &params).is_empty());
    }

    #[test]
    fn test_image_smaller_than_window_is_error() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let img = GrayImage::new(10, 10);
        assert!(matches!(
            c.detect(&img, &PassParams::PRIMARY),
            Err(DetectorError::ImageTooSmall { .. })
        ));
    }

    #[test]
    fn test_min_size_filters_small_windows() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let img = blocks_image(120, 120, &[(40, 40)]);
        let params = PassParams {
            scale_factor: 1.25,
            min_neighbors: 0,
            min_size: (60, 60),
        };
        let faces = c.detect(&img, &params).unwrap();
        assert!(faces.iter().all(|f| f.width >= 60 && f.height >= 60));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let c = HaarCascade::from_xml(DARK_OVER_LIGHT_XML).unwrap();
        let img = blocks_image(160, 120, &[(10, 10), (100, 60)]);
        let params = PassParams {
            scale_factor: 1.1,
            min_neighbors: 1,
            min_size: (20, 20),
        };
        let a = c.detect(&img, &params).unwrap();
        let b = c.detect(&img, &params).unwrap();
        assert_eq!(a, b);
    }
}
