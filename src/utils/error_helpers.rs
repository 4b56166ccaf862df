use crate::error::{ApiError, StorageError};
use std::io;
use std::path::Path;

/// Helper functions for standardizing error conversions across the codebase.
/// Convert reqwest errors to ApiError with endpoint context
pub fn convert_request_error(error: reqwest::Error, endpoint: &str, timeout_secs: u64) -> ApiError {
    if error.is_timeout() {
        return ApiError::Timeout {
            timeout_secs,
            endpoint: endpoint.to_string(),
        };
    }

    match error.status() {
        Some(status) => ApiError::Http {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        },
        None => ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        },
    }
}

/// Convert JSON deserialization errors to ApiError with endpoint context
pub fn convert_json_error(error: reqwest::Error, endpoint: &str) -> ApiError {
    ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: format!("JSON parse error: {}", error),
    }
}

/// Convert IO errors to StorageError with the path that failed
pub fn convert_io_error(error: io::Error, path: &Path) -> StorageError {
    StorageError::FileIo {
        path: path.to_string_lossy().to_string(),
        source: error,
    }
}

/// Helper macro for standardizing map_err patterns on file operations
#[macro_export]
macro_rules! map_io_error {
    ($result:expr, $path:expr) => {
        $result.map_err(|e| $crate::utils::error_helpers::convert_io_error(e, $path))
    };
}
