use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the frame upscaler.
///
/// # Why structured errors
///
/// Each variant captures context specific to its error domain (filesystem,
/// image processing, remote API), so the orchestrator can classify a failure
/// without parsing error strings. The thiserror crate generates Display
/// implementations from the format strings.
#[derive(Error, Debug)]
pub enum UpscaleError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UpscaleError>;

impl UpscaleError {
    /// Whether this failure is a throttling condition.
    ///
    /// The structured status code is authoritative. The substring fallback
    /// covers transports that only surface a stringified error; 503 and other
    /// overload signals deliberately do not trigger the backoff.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Api { status, message } => {
                *status == Some(429) || (status.is_none() && message.contains("429"))
            }
            Self::Http(err) => err
                .status()
                .is_some_and(|s| s == reqwest::StatusCode::TOO_MANY_REQUESTS),
            _ => false,
        }
    }
}

/// Convert anyhow errors to configuration errors.
///
/// Binary-side setup code works in anyhow; anything it hands into the
/// library is converted at the boundary rather than propagating the
/// type-erased error through the crate.
impl From<anyhow::Error> for UpscaleError {
    fn from(err: anyhow::Error) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Fallback for I/O errors raised without path context. Code that has
/// context should construct UpscaleError::FileSystem directly with the
/// specific path and operation.
impl From<std::io::Error> for UpscaleError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert image crate errors to image processing errors.
impl From<image::ImageError> for UpscaleError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_status_classifies_rate_limit() {
        let err = UpscaleError::Api {
            message: "quota exceeded".to_string(),
            status: Some(429),
        };
        assert!(err.is_rate_limited());

        let err = UpscaleError::Api {
            message: "internal error".to_string(),
            status: Some(500),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_substring_fallback_without_status() {
        let err = UpscaleError::Api {
            message: "error 429: resource exhausted".to_string(),
            status: None,
        };
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_status_overrides_message_text() {
        // A 500 whose body happens to mention 429 is not throttling.
        let err = UpscaleError::Api {
            message: "upstream returned 429".to_string(),
            status: Some(500),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_non_api_errors_are_not_rate_limited() {
        let err = UpscaleError::Configuration {
            message: "429".to_string(),
        };
        assert!(!err.is_rate_limited());
    }
}
