//! Face patch preprocessing for template scoring.
//!
//! A face crop becomes a fixed 100×100 luminance patch: equalised, smoothed,
//! sharpened, then resampled. The steps run in that order every time.

use crate::locator::GAUSSIAN_3X3;
use crate::types::FaceBox;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::filter3x3;
use ndarray::Array2;

/// Edge length of a prepared patch.
pub const PATCH_SIZE: u32 = 100;

const SHARPEN_3X3: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// A 100×100 single-channel face region, intensities in `[0, 255]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch(Array2<f32>);

impl Patch {
    /// Wrap raw intensities. Rows are `y`, columns are `x`.
    pub fn from_array(data: Array2<f32>) -> Self {
        Self(data)
    }

    pub fn from_gray(gray: &GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let data = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            gray.get_pixel(x as u32, y as u32)[0] as f32
        });
        Self(data)
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.0
    }

    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }
}

/// Crop `face` out of `image` and run the full preprocessing chain.
///
/// The box is clipped to the image first; `None` when nothing of it remains.
pub fn prepare(image: &DynamicImage, face: &FaceBox) -> Option<Patch> {
    let clipped = face.clip_to(image.width(), image.height())?;
    let region = image.crop_imm(clipped.x, clipped.y, clipped.width, clipped.height);
    Some(prepare_region(&region))
}

/// Run the preprocessing chain on an already-cropped region.
pub fn prepare_region(region: &DynamicImage) -> Patch {
    let gray = region.to_luma8();
    let equalized = equalize_histogram(&gray);
    let smoothed: GrayImage = filter3x3::<_, f32, u8>(&equalized, &GAUSSIAN_3X3);
    let sharpened: GrayImage = filter3x3::<_, f32, u8>(&smoothed, &SHARPEN_3X3);
    let resized = imageops::resize(&sharpened, PATCH_SIZE, PATCH_SIZE, FilterType::CatmullRom);
    Patch::from_gray(&resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, RgbImage};

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            Luma([((x * 3 + y * 2) % 256) as u8])
        }))
    }

    #[test]
    fn test_patch_is_fixed_size() {
        let img = gradient(320, 240);
        for face in [
            FaceBox::new(10, 10, 40, 40),
            FaceBox::new(100, 50, 180, 150),
            FaceBox::new(0, 0, 7, 9),
        ] {
            let patch = prepare(&img, &face).unwrap();
            assert_eq!(patch.dim(), (100, 100));
        }
    }

    #[test]
    fn test_patch_values_in_byte_range() {
        let patch = prepare(&gradient(200, 200), &FaceBox::new(20, 20, 120, 120)).unwrap();
        assert!(patch.data().iter().all(|&v| (0.0..=255.0).contains(&v)));
    }

    #[test]
    fn test_prepare_clips_box() {
        let img = gradient(64, 64);
        let patch = prepare(&img, &FaceBox::new(40, 40, 100, 100)).unwrap();
        assert_eq!(patch.dim(), (100, 100));
    }

    #[test]
    fn test_prepare_outside_image() {
        assert!(prepare(&gradient(64, 64), &FaceBox::new(64, 0, 10, 10)).is_none());
    }

    #[test]
    fn test_prepare_matches_prepare_region() {
        let img = gradient(120, 90);
        let face = FaceBox::new(30, 20, 50, 40);
        let a = prepare(&img, &face).unwrap();
        let b = prepare_region(&img.crop_imm(30, 20, 50, 40));
        assert_eq!(a, b);
    }

    #[test]
    fn test_prepare_accepts_color() {
        let rgb = RgbImage::from_fn(80, 80, |x, y| image::Rgb([x as u8 * 3, y as u8 * 3, 90]));
        let patch = prepare(&DynamicImage::ImageRgb8(rgb), &FaceBox::new(0, 0, 80, 80)).unwrap();
        assert_eq!(patch.dim(), (100, 100));
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let img = gradient(150, 150);
        let face = FaceBox::new(25, 25, 90, 90);
        assert_eq!(prepare(&img, &face), prepare(&img, &face));
    }

    #[test]
    fn test_from_gray_layout() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x + 10 * y) as u8]));
        let patch = Patch::from_gray(&gray);
        assert_eq!(patch.dim(), (2, 3));
        assert_eq!(patch.data()[[1, 2]], 12.0);
    }
}
