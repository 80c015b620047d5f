use crate::upload::MAX_UPLOAD_BYTES;

/// Every failure the analysis pipeline can produce.
///
/// Only `Configuration` is fatal. The rest are recovered by the session
/// controller and shown to the user as [`AppError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("file of {size} bytes exceeds the {limit} byte upload limit", limit = MAX_UPLOAD_BYTES)]
    FileTooLarge { size: usize },

    #[error("image decode failed: {0}")]
    DecodeError(String),

    #[error("analysis request failed: {0}")]
    RequestError(String),

    #[error("analysis response could not be parsed: {0}")]
    ResponseParseError(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Text stored in the session and shown inline.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::FileTooLarge { .. } => {
                "File size exceeds 2MB. Please upload a smaller image."
            }
            AppError::DecodeError(_) => "Failed to read the image file.",
            AppError::RequestError(_) | AppError::ResponseParseError(_) => {
                "An error occurred during analysis. Please try again."
            }
            AppError::Configuration(_) => "The service is not configured.",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::RequestError(format!("timed out: {}", err))
        } else {
            AppError::RequestError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ResponseParseError(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::DecodeError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
