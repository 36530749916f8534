//! Streaming multipart reader for the upload routes
//!
//! The file part is spooled to a temporary file chunk by chunk. Its type is
//! checked from the part headers before the first byte is read, and the size
//! limit is enforced while streaming, so an oversized body is rejected without
//! ever being buffered in full.

use crate::error::{AppError, Result, ValidationError};
use crate::media::{MediaConstraints, UploadedFile};
use crate::metrics::media::MEDIA_UPLOADS_TOTAL;
use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;
use std::collections::HashMap;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Upper bound for a single text part
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Text parts by name plus the optional file part
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

/// Read every part of `payload`; the part named `file_field` is the upload
pub async fn read_multipart(
    mut payload: Multipart,
    file_field: &str,
    constraints: &MediaConstraints,
) -> Result<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        match filename {
            Some(filename) if name == file_field => {
                if filename.is_empty() {
                    // Empty file input
                    drain(&mut field).await?;
                    continue;
                }
                if form.file.is_some() {
                    return Err(AppError::validation(format!(
                        "Only one '{}' file is accepted",
                        file_field
                    )));
                }
                form.file = Some(spool_file(&mut field, filename, constraints).await?);
            }
            Some(_) => drain(&mut field).await?,
            None => {
                let value = read_text(&mut field, &name).await?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

async fn spool_file(
    field: &mut Field,
    filename: String,
    constraints: &MediaConstraints,
) -> Result<UploadedFile> {
    let content_type = field.content_type().cloned();
    if let Err(e) = constraints.check_type(&filename, content_type.as_ref()) {
        return Err(reject(e));
    }

    let temp = NamedTempFile::new()?;
    let mut out = tokio::fs::File::from_std(temp.reopen()?);
    let mut size: u64 = 0;

    while let Some(chunk) = field.try_next().await? {
        size += chunk.len() as u64;
        if let Err(e) = constraints.check_size(size) {
            return Err(reject(e));
        }
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    drop(out);

    Ok(UploadedFile::from_temp(filename, content_type, temp)?)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::validation(format!("Field '{}' is too long", name)));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::validation(format!("Field '{}' is not valid UTF-8", name)))
}

async fn drain(field: &mut Field) -> Result<()> {
    while field.try_next().await?.is_some() {}
    Ok(())
}

fn reject(err: ValidationError) -> AppError {
    MEDIA_UPLOADS_TOTAL.with_label_values(&["rejected"]).inc();
    err.into()
}
