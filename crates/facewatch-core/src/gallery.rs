use crate::types::GalleryEntry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery not found: {0}")]
    NotFound(String),
    #[error("failed to read gallery {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid gallery manifest {path}: {reason}")]
    Manifest { path: String, reason: String },
}

/// Source of reference subjects, queried fresh for every match call.
pub trait GalleryProvider: Send + Sync {
    fn list_entries(&self) -> Result<Vec<GalleryEntry>, GalleryError>;
}

/// A fixed in-memory list, handy for callers that already hold entries.
impl GalleryProvider for Vec<GalleryEntry> {
    fn list_entries(&self) -> Result<Vec<GalleryEntry>, GalleryError> {
        Ok(self.clone())
    }
}
