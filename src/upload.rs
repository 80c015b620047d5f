use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Largest accepted upload: 2 MiB.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// A file as received from the browser, before validation.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// An accepted image held by a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedImage {
    #[serde(skip)]
    pub payload: Vec<u8>,
    pub preview: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub width: u32,
    pub height: u32,
}

impl UploadedImage {
    pub fn payload_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.payload)
    }
}

/// Check the size limit, then decode the file to prove it is an image and
/// build its data-URI preview.
pub async fn validate_and_load(file: FileUpload) -> Result<UploadedImage> {
    let size = file.bytes.len();
    if size > MAX_UPLOAD_BYTES {
        tracing::info!(
            "Rejected upload {:?}: {} bytes over limit",
            file.file_name,
            size
        );
        return Err(AppError::FileTooLarge { size });
    }
    if size == 0 {
        return Err(AppError::DecodeError("empty file".into()));
    }

    let declared = file
        .content_type
        .filter(|mime| mime.starts_with("image/"));

    tokio::task::spawn_blocking(move || decode(file.bytes, declared))
        .await
        .map_err(|e| AppError::DecodeError(format!("decode task failed: {}", e)))?
}

fn decode(bytes: Vec<u8>, declared: Option<String>) -> Result<UploadedImage> {
    let format = image::guess_format(&bytes)?;
    let img = image::load_from_memory_with_format(&bytes, format)?;

    let mime_type = declared.unwrap_or_else(|| mime_for(format).to_string());
    let preview = format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(&bytes)
    );

    tracing::debug!(
        "Decoded {} upload: {}x{}, {} bytes",
        mime_type,
        img.width(),
        img.height(),
        bytes.len()
    );

    Ok(UploadedImage {
        size_bytes: bytes.len(),
        width: img.width(),
        height: img.height(),
        payload: bytes,
        preview,
        mime_type,
    })
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        _ => "application/octet-stream",
    }
}
