//! Directory-backed gallery: one image file per subject.

use facewatch_core::gallery::{GalleryError, GalleryProvider};
use facewatch_core::types::{GalleryEntry, ImageSource};
use std::path::{Path, PathBuf};

/// Extensions recognised as gallery images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// Every image file directly inside a directory, labelled by its file stem.
#[derive(Debug, Clone)]
pub struct DirectoryGallery {
    dir: PathBuf,
}

impl DirectoryGallery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

impl GalleryProvider for DirectoryGallery {
    fn list_entries(&self) -> Result<Vec<GalleryEntry>, GalleryError> {
        let dir_name = self.dir.display().to_string();
        let io_err = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GalleryError::NotFound(dir_name.clone())
            } else {
                GalleryError::Io {
                    path: dir_name.clone(),
                    source: e,
                }
            }
        };

        let mut files = Vec::new();
        for dirent in std::fs::read_dir(&self.dir).map_err(io_err)? {
            let dirent = dirent.map_err(io_err)?;
            let path = dirent.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let entries: Vec<GalleryEntry> = files
            .into_iter()
            .filter_map(|path| {
                let label = path.file_stem()?.to_string_lossy().into_owned();
                Some(GalleryEntry::new(label, ImageSource::Path(path)))
            })
            .collect();
        tracing::debug!(
            dir = %self.dir.display(),
            subjects = entries.len(),
            "scanned gallery directory"
        );
        Ok(entries)
    }
}
