//! Cascade detector backed by OpenCV's `CascadeClassifier`.
//!
//! `detect_multi_scale` scans, groups and filters in one call, so boxes come
//! back already clustered by `min_neighbors`.

use crate::cascade::CascadeError;
use crate::config::PassParams;
use crate::detector::{CascadeDetector, DetectorError};
use crate::types::FaceBox;
use image::GrayImage;
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::{self, CascadeClassifier};
use opencv::prelude::*;
use std::path::Path;
use std::sync::Mutex;

/// An OpenCV cascade shared between passes and threads.
pub struct OpenCvCascade {
    // detect_multi_scale needs &mut self.
    classifier: Mutex<CascadeClassifier>,
}

impl OpenCvCascade {
    /// Load a cascade XML file through OpenCV.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CascadeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CascadeError::NotFound(path.display().to_string()));
        }
        let name = path
            .to_str()
            .ok_or_else(|| CascadeError::Malformed(format!("non UTF-8 path {}", path.display())))?;

        let classifier = CascadeClassifier::new(name)?;
        if classifier.empty()? {
            return Err(CascadeError::Malformed(format!(
                "OpenCV loaded no classifier from {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "loaded OpenCV cascade");
        Ok(Self {
            classifier: Mutex::new(classifier),
        })
    }
}

impl CascadeDetector for OpenCvCascade {
    fn detect(&self, gray: &GrayImage, params: &PassParams) -> Result<Vec<FaceBox>, DetectorError> {
        params
            .validate()
            .map_err(|e| DetectorError::InvalidParams(e.to_string()))?;

        let mat = to_mat(gray).map_err(opencv_failure)?;
        let mut found = Vector::<Rect>::new();
        {
            let mut classifier = self
                .classifier
                .lock()
                .map_err(|_| DetectorError::Failed("cascade lock poisoned".into()))?;
            classifier
                .detect_multi_scale(
                    &mat,
                    &mut found,
                    params.scale_factor as f64,
                    params.min_neighbors as i32,
                    objdetect::CASCADE_SCALE_IMAGE,
                    Size::new(params.min_size.0 as i32, params.min_size.1 as i32),
                    Size::new(0, 0),
                )
                .map_err(opencv_failure)?;
        }

        let boxes: Vec<FaceBox> = found.iter().filter_map(rect_to_box).collect();
        tracing::debug!(
            found = boxes.len(),
            scale_factor = params.scale_factor,
            min_neighbors = params.min_neighbors,
            "opencv cascade pass complete"
        );
        Ok(boxes)
    }
}

/// Single-channel `Mat` over the luma rows.
fn to_mat(gray: &GrayImage) -> opencv::Result<Mat> {
    let flat = Mat::from_slice(gray.as_raw())?;
    Ok(flat.reshape(1, gray.height() as i32)?.clone_pointee())
}

/// Drops rects with no area and clamps negative origins to the image edge.
fn rect_to_box(r: Rect) -> Option<FaceBox> {
    let x = r.x.max(0);
    let y = r.y.max(0);
    let width = r.width - (x - r.x);
    let height = r.height - (y - r.y);
    if width <= 0 || height <= 0 {
        return None;
    }
    Some(FaceBox::new(x as u32, y as u32, width as u32, height as u32))
}

fn opencv_failure(e: opencv::Error) -> DetectorError {
    DetectorError::Failed(format!("opencv: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            OpenCvCascade::load("/no/such/cascade.xml"),
            Err(CascadeError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_rejects_non_cascade_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.xml");
        let xml = "<?xml version=\"1.0\"?>\n<opencv_storage>\n</opencv_storage>\n";
        std::fs::write(&path, xml).unwrap();
        assert!(OpenCvCascade::load(&path).is_err());
    }

    #[test]
    fn test_rect_to_box_clamps_origin() {
        assert_eq!(
            rect_to_box(Rect::new(4, 6, 30, 32)),
            Some(FaceBox::new(4, 6, 30, 32))
        );
        assert_eq!(
            rect_to_box(Rect::new(-5, 2, 20, 20)),
            Some(FaceBox::new(0, 2, 15, 20))
        );
        assert_eq!(rect_to_box(Rect::new(-30, 0, 20, 20)), None);
    }

    #[test]
    fn test_mat_matches_image_layout() {
        let img = GrayImage::from_fn(5, 3, |x, y| image::Luma([(x + 10 * y) as u8]));
        let mat = to_mat(&img).unwrap();
        assert_eq!(mat.rows(), 3);
        assert_eq!(mat.cols(), 5);
        assert_eq!(*mat.at_2d::<u8>(2, 4).unwrap(), 24);
    }
}
