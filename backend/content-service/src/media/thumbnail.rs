//! Thumbnail rendering - centre-cropped fill to a fixed frame, encoded as JPEG
//!
//! Decoding and resizing are CPU-bound and run on the blocking pool.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::debug;

/// JPEG quality used for every thumbnail
const THUMBNAIL_QUALITY: u8 = 85;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode thumbnail: {0}")]
    Encode(String),

    #[error("thumbnail task failed: {0}")]
    Task(String),
}

/// Output frame of a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
        }
    }
}

impl ThumbnailSpec {
    /// Blocking render of an already decoded image
    pub fn render(&self, img: &DynamicImage) -> Result<Vec<u8>, ThumbnailError> {
        let (orig_w, orig_h) = img.dimensions();
        let filled = img.resize_to_fill(self.width, self.height, FilterType::Triangle);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(filled.to_rgb8());

        let mut buf = Cursor::new(Vec::new());
        rgb.write_to(&mut buf, ImageOutputFormat::Jpeg(THUMBNAIL_QUALITY))
            .map_err(|e| ThumbnailError::Encode(e.to_string()))?;

        let data = buf.into_inner();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            size = data.len(),
            "Thumbnail rendered"
        );
        Ok(data)
    }

    /// Decode the file at `source` and render it on the blocking pool
    pub async fn render_file(self, source: PathBuf) -> Result<Vec<u8>, ThumbnailError> {
        tokio::task::spawn_blocking(move || {
            let img = image::io::Reader::open(&source)
                .map_err(|e| ThumbnailError::Decode(e.to_string()))?
                .with_guessed_format()
                .map_err(|e| ThumbnailError::Decode(e.to_string()))?
                .decode()
                .map_err(|e| ThumbnailError::Decode(e.to_string()))?;
            self.render(&img)
        })
        .await
        .map_err(|e| ThumbnailError::Task(e.to_string()))?
    }
}
