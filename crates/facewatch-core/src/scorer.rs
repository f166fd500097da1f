//! Similarity scoring on the shared [0, 100] confidence scale.

use crate::preprocess::Patch;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::{Array1, ArrayView1};

/// Side length whole images are resampled to before pixel statistics.
pub const PIXEL_SIDE: u32 = 100;

const SSIM_C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const SSIM_C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

const MSE_WEIGHT: f64 = 0.4;
const SSIM_WEIGHT: f64 = 0.4;
const NCC_WEIGHT: f64 = 0.2;

/// Saturate into [0, 100]. NaN becomes 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Population mean and variance.
fn moments(v: ArrayView1<f32>) -> (f64, f64) {
    let n = v.len() as f64;
    let mean = v.iter().map(|&x| x as f64).sum::<f64>() / n;
    let var = v.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

fn covariance(a: ArrayView1<f32>, b: ArrayView1<f32>, mean_a: f64, mean_b: f64) -> f64 {
    let n = a.len() as f64;
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64 - mean_a) * (y as f64 - mean_b))
        .sum::<f64>()
        / n
}

/// Zero-mean normalised cross-correlation of two patches, scaled to [0, 100].
///
/// Two flat patches score 100 when their means agree and 0 otherwise; a flat
/// patch against a textured one scores 0. Patches of different shapes score 0.
pub fn template_score(a: &Patch, b: &Patch) -> f32 {
    if a.dim() != b.dim() || a.data().is_empty() {
        return 0.0;
    }
    let (Some(va), Some(vb)) = (a.data().as_slice(), b.data().as_slice()) else {
        return 0.0;
    };
    let (va, vb) = (ArrayView1::from(va), ArrayView1::from(vb));

    let (mean_a, var_a) = moments(va);
    let (mean_b, var_b) = moments(vb);
    let flat_a = var_a <= f64::EPSILON;
    let flat_b = var_b <= f64::EPSILON;
    match (flat_a, flat_b) {
        (true, true) => {
            return if (mean_a - mean_b).abs() <= f64::EPSILON { 100.0 } else { 0.0 };
        }
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let ncc = covariance(va, vb, mean_a, mean_b) / (var_a.sqrt() * var_b.sqrt());
    clamp_confidence((ncc * 100.0) as f32)
}

/// A whole image as normalised RGB intensities, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelVector(Array1<f32>);

impl PixelVector {
    /// RGB, Lanczos3 down to 100×100, scaled to [0, 1].
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image
            .resize_exact(PIXEL_SIDE, PIXEL_SIDE, FilterType::Lanczos3)
            .to_rgb8();
        let data: Array1<f32> = rgb.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
        Self(data)
    }

    pub fn from_array(data: Array1<f32>) -> Self {
        Self(data)
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.0
    }
}

/// Weighted blend of MSE, global SSIM and Pearson similarities.
pub fn pixel_stats_score(a: &PixelVector, b: &PixelVector) -> f32 {
    let (va, vb) = (a.0.view(), b.0.view());
    if va.len() != vb.len() || va.is_empty() {
        return 0.0;
    }

    let n = va.len() as f64;
    let mse = va
        .iter()
        .zip(vb.iter())
        .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
        .sum::<f64>()
        / n;

    let (mean_a, var_a) = moments(va);
    let (mean_b, var_b) = moments(vb);
    let cov = covariance(va, vb, mean_a, mean_b);

    // C1/C2 are the 8-bit constants applied to [0, 1] data.
    let ssim = ((2.0 * mean_a * mean_b + SSIM_C1) * (2.0 * cov + SSIM_C2))
        / ((mean_a * mean_a + mean_b * mean_b + SSIM_C1) * (var_a + var_b + SSIM_C2));

    let denom = var_a.sqrt() * var_b.sqrt();
    let ncc_sim = if denom > 0.0 {
        ((cov / denom + 1.0) * 50.0).max(0.0)
    } else {
        0.0
    };
    let mse_sim = ((1.0 - mse) * 100.0).max(0.0);
    let ssim_sim = ((ssim + 1.0) * 50.0).max(0.0);

    let blended = MSE_WEIGHT * mse_sim + SSIM_WEIGHT * ssim_sim + NCC_WEIGHT * ncc_sim;
    clamp_confidence(blended as f32)
}

/// A strategy-specific sample of one face or image, ready to score.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Patch(Patch),
    Pixels(PixelVector),
}

/// Score two samples. Mismatched kinds score 0.
pub fn score(a: &Sample, b: &Sample) -> f32 {
    match (a, b) {
        (Sample::Patch(a), Sample::Patch(b)) => template_score(a, b),
        (Sample::Pixels(a), Sample::Pixels(b)) => pixel_stats_score(a, b),
        _ => 0.0,
    }
}
