//! Media pipeline: validates uploaded binaries and persists them to the Object Store
//!
//! Validation (type, then size) always completes before any store call, so a
//! rejected upload costs nothing upstream. Uploads live in a temporary file that is
//! removed when the `UploadedFile` is dropped, whichever way the request ends.
//! Stored media stays owned by a `PendingMedia` guard until the caller commits it;
//! an uncommitted guard releases the objects again.

pub mod object_store;
pub mod thumbnail;

pub use object_store::{ObjectStore, ObjectStoreError, S3ObjectStore};
pub use thumbnail::{ThumbnailError, ThumbnailSpec};

use crate::error::{AppError, Result, ValidationError};
use crate::metrics::media::MEDIA_UPLOADS_TOTAL;
use mime::Mime;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

/// Handle to a stored binary: URL plus optional thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub key: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
}

impl MediaRef {
    /// Every object key backing this reference
    pub fn keys(&self) -> Vec<String> {
        std::iter::once(self.key.clone())
            .chain(self.thumbnail_key.clone())
            .collect()
    }
}

/// MIME type served for an accepted extension
pub fn mime_for_extension(ext: &str) -> Option<Mime> {
    match ext {
        "jpg" | "jpeg" => Some(mime::IMAGE_JPEG),
        "png" => Some(mime::IMAGE_PNG),
        "gif" => Some(mime::IMAGE_GIF),
        "webp" => "image/webp".parse().ok(),
        _ => None,
    }
}

// =====================================================================
// Constraints
// =====================================================================

/// Per-route upload rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Key prefix in the Object Store
    pub folder: String,
    pub max_bytes: u64,
    /// Lower-case extensions without the dot
    pub allowed_extensions: Vec<String>,
    /// Derive a thumbnail as a second object
    pub thumbnail: bool,
}

impl MediaConstraints {
    pub fn new(folder: &str, max_bytes: u64, formats: &[String]) -> Self {
        Self {
            folder: folder.to_string(),
            max_bytes,
            allowed_extensions: formats.iter().map(|f| f.to_ascii_lowercase()).collect(),
            thumbnail: false,
        }
    }

    pub fn with_thumbnail(mut self) -> Self {
        self.thumbnail = true;
        self
    }

    /// The extension must be allowed and the declared MIME type must match it.
    /// Returns the normalised extension.
    pub fn check_type(
        &self,
        filename: &str,
        declared: Option<&Mime>,
    ) -> std::result::Result<String, ValidationError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| self.allowed_extensions.contains(e))
            .ok_or_else(|| {
                ValidationError::UnsupportedType(format!(
                    "'{}' (allowed: {})",
                    filename,
                    self.allowed_extensions.join(", ")
                ))
            })?;

        // The declared type must be the one the extension maps to
        let mime_allowed = match (declared, mime_for_extension(&ext)) {
            (Some(declared), Some(expected)) => declared.essence_str() == expected.essence_str(),
            _ => false,
        };

        if !mime_allowed {
            let declared = declared
                .map(|m| m.essence_str().to_string())
                .unwrap_or_else(|| "none".to_string());
            return Err(ValidationError::UnsupportedType(format!(
                "content type '{}'",
                declared
            )));
        }

        Ok(ext)
    }

    pub fn check_size(&self, size: u64) -> std::result::Result<(), ValidationError> {
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

// =====================================================================
// Uploaded file
// =====================================================================

/// A client upload spooled to a temporary file; the file is removed on drop
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<Mime>,
    pub size: u64,
    file: NamedTempFile,
}

impl UploadedFile {
    /// Wrap an already written temp file
    pub fn from_temp(
        filename: String,
        content_type: Option<Mime>,
        file: NamedTempFile,
    ) -> std::io::Result<Self> {
        let size = file.as_file().metadata()?.len();
        Ok(Self {
            filename,
            content_type,
            size,
            file,
        })
    }

    /// Spool an in-memory buffer (used for small uploads and tests)
    pub fn from_bytes(
        filename: &str,
        content_type: Option<Mime>,
        bytes: &[u8],
    ) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Self::from_temp(filename.to_string(), content_type, file)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

// =====================================================================
// Pending media guard
// =====================================================================

/// Freshly stored media that is released unless committed
pub struct PendingMedia {
    media: MediaRef,
    store: Arc<dyn ObjectStore>,
    committed: bool,
}

impl PendingMedia {
    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    /// The media is now referenced by a stored entity; keep it
    pub fn commit(mut self) -> MediaRef {
        self.committed = true;
        self.media.clone()
    }
}

impl Drop for PendingMedia {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let keys = self.media.keys();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.store.clone();
                handle.spawn(release_keys(store, keys));
            }
            Err(_) => warn!(?keys, "no runtime to release uncommitted media; objects orphaned"),
        }
    }
}

async fn release_keys(store: Arc<dyn ObjectStore>, keys: Vec<String>) {
    for key in keys {
        if let Err(e) = store.delete(&key).await {
            warn!(key = %key, error = %e, "Failed to release media object");
        }
    }
}

// =====================================================================
// Pipeline
// =====================================================================

pub struct MediaPipeline {
    store: Arc<dyn ObjectStore>,
    thumbnail: ThumbnailSpec,
    upload_timeout: Duration,
}

impl MediaPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, thumbnail: ThumbnailSpec, upload_timeout: Duration) -> Self {
        Self {
            store,
            thumbnail,
            upload_timeout,
        }
    }

    /// Validate `upload` against `constraints` and store it for `owner`.
    ///
    /// The temporary file is dropped on every return path.
    pub async fn accept(
        &self,
        owner: Uuid,
        upload: UploadedFile,
        constraints: &MediaConstraints,
    ) -> Result<PendingMedia> {
        let ext = match constraints
            .check_type(&upload.filename, upload.content_type.as_ref())
            .and_then(|ext| constraints.check_size(upload.size).map(|_| ext))
        {
            Ok(ext) => ext,
            Err(e) => {
                MEDIA_UPLOADS_TOTAL.with_label_values(&["rejected"]).inc();
                return Err(e.into());
            }
        };

        let content_type = mime_for_extension(&ext)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.essence_str().to_string());
        let key = format!("{}/{}/{}.{}", constraints.folder, owner, Uuid::new_v4(), ext);

        let url = match tokio::time::timeout(
            self.upload_timeout,
            self.store.put_file(&key, upload.path(), &content_type),
        )
        .await
        {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                MEDIA_UPLOADS_TOTAL.with_label_values(&["upstream_error"]).inc();
                return Err(AppError::Upstream(e.to_string()));
            }
            Err(_) => {
                MEDIA_UPLOADS_TOTAL.with_label_values(&["upstream_timeout"]).inc();
                return Err(AppError::Upstream(format!(
                    "upload of {} timed out after {:?}",
                    key, self.upload_timeout
                )));
            }
        };

        let mut pending = PendingMedia {
            media: MediaRef {
                url,
                key,
                thumbnail_url: None,
                thumbnail_key: None,
            },
            store: self.store.clone(),
            committed: false,
        };

        if constraints.thumbnail {
            if let Some((thumb_key, thumb_url)) = self.store_thumbnail(&pending.media.key, &upload).await
            {
                pending.media.thumbnail_key = Some(thumb_key);
                pending.media.thumbnail_url = Some(thumb_url);
            }
        }

        MEDIA_UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        info!(
            key = %pending.media.key,
            size = upload.size,
            thumbnail = pending.media.thumbnail_key.is_some(),
            "Media accepted"
        );
        Ok(pending)
    }

    /// Render and store the thumbnail; any failure is logged and skipped
    async fn store_thumbnail(&self, main_key: &str, upload: &UploadedFile) -> Option<(String, String)> {
        let jpeg = match self.thumbnail.render_file(upload.path().to_path_buf()).await {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!(key = %main_key, error = %e, "Thumbnail generation failed, continuing without");
                return None;
            }
        };

        let thumb_key = thumbnail_key_for(main_key);
        match tokio::time::timeout(
            self.upload_timeout,
            self.store
                .put_bytes(&thumb_key, jpeg, mime::IMAGE_JPEG.essence_str()),
        )
        .await
        {
            Ok(Ok(url)) => Some((thumb_key, url)),
            Ok(Err(e)) => {
                warn!(key = %thumb_key, error = %e, "Thumbnail upload failed, continuing without");
                None
            }
            Err(_) => {
                warn!(key = %thumb_key, "Thumbnail upload timed out, continuing without");
                None
            }
        }
    }

    /// Best-effort deletion of every object behind `media`
    pub async fn release(&self, media: &MediaRef) {
        release_keys(self.store.clone(), media.keys()).await;
    }

    /// Release in a detached task; the caller does not wait for the store
    pub fn release_in_background(&self, media: MediaRef) {
        tokio::spawn(release_keys(self.store.clone(), media.keys()));
    }
}

fn thumbnail_key_for(main_key: &str) -> String {
    let stem = main_key
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(main_key);
    format!("{}_thumb.jpg", stem)
}
