//! Image loading collaborator.

use crate::types::ImageSource;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image has zero width or height: {0}")]
    Empty(String),
}

/// Turns an [`ImageSource`] into pixels.
///
/// Owned by the surrounding application; the pipeline only calls it.
pub trait ImageLoader: Send + Sync {
    fn load(&self, source: &ImageSource) -> Result<DynamicImage, LoadError>;
}

/// Decodes with the `image` crate, sniffing the format from content.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodingLoader;

impl ImageLoader for DecodingLoader {
    fn load(&self, source: &ImageSource) -> Result<DynamicImage, LoadError> {
        let image = match source {
            ImageSource::Path(path) => {
                if !path.exists() {
                    return Err(LoadError::NotFound(path.display().to_string()));
                }
                let reader = image::ImageReader::open(path)
                    .and_then(|r| r.with_guessed_format())
                    .map_err(|e| LoadError::Io {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                reader.decode().map_err(|e| LoadError::Decode {
                    what: path.display().to_string(),
                    source: e,
                })?
            }
            ImageSource::Bytes(bytes) => {
                image::load_from_memory(bytes).map_err(|e| LoadError::Decode {
                    what: source.describe(),
                    source: e,
                })?
            }
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(LoadError::Empty(source.describe()));
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(w, h, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_load_from_bytes() {
        let img = DecodingLoader
            .load(&ImageSource::Bytes(png_bytes(8, 6)))
            .unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn test_load_garbage_bytes_is_decode_error() {
        let err = DecodingLoader
            .load(&ImageSource::Bytes(vec![0, 1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_load_missing_path() {
        let err = DecodingLoader
            .load(&ImageSource::Path("/definitely/not/here.png".into()))
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
