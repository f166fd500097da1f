//! TOML manifest gallery.
//!
//! ```toml
//! [[subject]]
//! label = "J. Doe"
//! photo = "photos/jdoe.jpg"
//! ```
//!
//! Relative photo paths resolve against the manifest's own directory.

use facewatch_core::gallery::{GalleryError, GalleryProvider};
use facewatch_core::types::{GalleryEntry, ImageSource};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    #[serde(default)]
    subject: Vec<Subject>,
}

/// One `[[subject]]` table.
#[derive(Debug, Clone, Deserialize)]
struct Subject {
    label: String,
    #[serde(default)]
    photo: String,
}

/// Gallery described by a manifest file, re-read on every listing.
#[derive(Debug, Clone)]
pub struct ManifestGallery {
    path: PathBuf,
}

impl ManifestGallery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Parse manifest text. Subjects without a photo are left out.
pub fn parse_manifest(text: &str, base_dir: &Path) -> Result<Vec<GalleryEntry>, toml::de::Error> {
    let manifest: Manifest = toml::from_str(text)?;
    let entries = manifest
        .subject
        .into_iter()
        .filter_map(|s| {
            let photo = s.photo.trim();
            if photo.is_empty() {
                tracing::debug!(label = %s.label, "subject has no photo; skipped");
                return None;
            }
            let photo = Path::new(photo);
            let resolved = if photo.is_absolute() {
                photo.to_path_buf()
            } else {
                base_dir.join(photo)
            };
            Some(GalleryEntry::new(s.label, ImageSource::Path(resolved)))
        })
        .collect();
    Ok(entries)
}

impl GalleryProvider for ManifestGallery {
    fn list_entries(&self) -> Result<Vec<GalleryEntry>, GalleryError> {
        let manifest_name = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GalleryError::NotFound(manifest_name.clone())
            } else {
                GalleryError::Io {
                    path: manifest_name.clone(),
                    source: e,
                }
            }
        })?;
        let entries = parse_manifest(&text, self.base_dir()).map_err(|e| GalleryError::Manifest {
            path: manifest_name,
            reason: e.to_string(),
        })?;
        tracing::debug!(
            manifest = %self.path.display(),
            subjects = entries.len(),
            "read gallery manifest"
        );
        Ok(entries)
    }
}
