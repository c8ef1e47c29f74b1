// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multipart image upload: validation and staging to disk.

use crate::error::AppError;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// An accepted upload written to the staging directory.
///
/// The file is removed by [`StagedImage::cleanup`], or when the value is
/// dropped if cleanup never ran.
#[derive(Debug)]
pub struct StagedImage {
    path: TempPath,
    content_type: String,
    size: usize,
    file_name: Option<String>,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// File name the client sent, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }

    /// Delete the staged file.
    pub fn cleanup(self) -> std::io::Result<()> {
        self.path.close()
    }
}

/// Validates and stages single-image multipart uploads.
#[derive(Debug, Clone)]
pub struct UploadHandler {
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl UploadHandler {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the staging directory if needed.
    pub async fn ensure_upload_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await
    }

    /// Pull the single `image` field out of a multipart body and stage it.
    ///
    /// Other fields are skipped. Fails with [`AppError::Validation`] when the
    /// image is missing, empty, not an image, too large, or sent twice.
    pub async fn accept(&self, mut multipart: Multipart) -> Result<StagedImage, AppError> {
        let mut staged: Option<StagedImage> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }
            if staged.is_some() {
                return Err(AppError::Validation(
                    "Only one image file may be uploaded".to_string(),
                ));
            }
            staged = self.stage_field(field).await?;
        }

        let staged =
            staged.ok_or_else(|| AppError::Validation("No image file provided".to_string()))?;

        tracing::debug!(
            path = %staged.path().display(),
            content_type = %staged.content_type,
            size = staged.size,
            "Upload staged"
        );
        Ok(staged)
    }

    /// Stream one field to a temp file. Returns `None` for an empty part,
    /// which is what browsers send when no file was chosen.
    async fn stage_field(&self, mut field: Field<'_>) -> Result<Option<StagedImage>, AppError> {
        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        if !is_image_mime(&content_type) {
            // Browsers send an empty octet-stream part when no file was chosen
            let mut has_data = false;
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                if !chunk.is_empty() {
                    has_data = true;
                    break;
                }
            }
            if !has_data {
                return Ok(None);
            }
            return Err(AppError::Validation(
                "Only image files are allowed".to_string(),
            ));
        }

        let (file, path) = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(&self.upload_dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut size = 0usize;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            size += chunk.len();
            if size > self.max_bytes {
                return Err(self.too_large());
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if size == 0 {
            path.close()?;
            return Ok(None);
        }

        Ok(Some(StagedImage {
            path,
            content_type,
            size,
            file_name,
        }))
    }

    fn too_large(&self) -> AppError {
        AppError::Validation(format!(
            "{}: maximum size is {}",
            AppError::FILE_TOO_LARGE,
            describe_limit(self.max_bytes)
        ))
    }
}

/// Whether a declared MIME type is an image type.
pub fn is_image_mime(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart request: {}", err.body_text()))
}

/// Human-readable size limit: whole MiB when exact, bytes otherwise.
fn describe_limit(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
