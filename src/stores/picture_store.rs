use crate::core::error::PictureError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Subdirectory of the static root holding profile pictures
pub const IMAGE_DIR: &str = "user_images";

/// Profile pictures on disk, addressed by paths relative to the static root
pub struct PictureStore {
    root: PathBuf,
    quality: u8,
    max_bytes: usize,
}

impl PictureStore {
    pub fn new(root: PathBuf, quality: u8, max_bytes: usize) -> Self {
        Self {
            root,
            quality,
            max_bytes,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.root.join(IMAGE_DIR))
    }

    /// Decode an upload, recompress it as JPEG and write it as
    /// `user_images/{user_id}_{timestamp}.jpg`. Returns the relative path.
    pub fn save(&self, user_id: u32, timestamp: i64, bytes: &[u8]) -> Result<String, PictureError> {
        if bytes.len() > self.max_bytes {
            return Err(PictureError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let decoded = image::load_from_memory(bytes)?;

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let mut encoded = Vec::with_capacity(bytes.len());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, self.quality))?;

        let relative = format!("{}/{}_{}.jpg", IMAGE_DIR, user_id, timestamp);
        self.ensure_dirs()?;
        fs::write(self.root.join(&relative), &encoded)?;

        Ok(relative)
    }

    /// Remove a stored picture. A file that is already gone is not an error.
    pub fn delete(&self, relative: &str) -> Result<(), PictureError> {
        let path = self.resolve(relative)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path of a stored picture
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, PictureError> {
        let rel = Path::new(relative);
        let confined = rel.starts_with(IMAGE_DIR)
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !confined {
            return Err(PictureError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
