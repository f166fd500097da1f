//! facewatch-gallery: reference-subject providers for the matcher.
//!
//! A gallery is either a TOML manifest listing labelled photos or a plain
//! directory of images. Both are listed fresh on every query.

pub mod directory;
pub mod manifest;

pub use directory::DirectoryGallery;
pub use manifest::ManifestGallery;

use facewatch_core::gallery::{GalleryError, GalleryProvider};
use std::path::Path;

/// Pick a provider for `path`: a directory is scanned, a file is a manifest.
pub fn open(path: &Path) -> Result<Box<dyn GalleryProvider>, GalleryError> {
    if path.is_dir() {
        Ok(Box::new(DirectoryGallery::new(path)))
    } else if path.is_file() {
        Ok(Box::new(ManifestGallery::new(path)))
    } else {
        Err(GalleryError::NotFound(path.display().to_string()))
    }
}
