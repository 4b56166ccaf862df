use crate::api::models::FieldErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("ListError: {0}")]
    List(#[from] ListError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Operation cancelled: {0}")]
    Cancelled(String),
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Errors surfaced by the REST transport, decoded once from the HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {message}")]
    Validation {
        endpoint: String,
        message: String,
        errors: FieldErrors,
    },
    #[error("Resource not found: {endpoint}")]
    NotFound { endpoint: String },
    #[error("Authentication failed")]
    Unauthorized {
        status: u16,
        endpoint: String,
        server_message: String,
    },
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("HTTP error: {status} {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Connection failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("Unexpected response body: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Field errors carried by a 422 response, if this is one.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Network failures, timeouts and 5xx responses.
    pub fn is_transport(&self) -> bool {
        match self {
            ApiError::Transport { .. } | ApiError::Timeout { .. } => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Validation { endpoint, .. }
            | ApiError::NotFound { endpoint }
            | ApiError::Unauthorized { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::Http { endpoint, .. }
            | ApiError::Transport { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration save failed: {message}")]
    ConfigSaveFailed { message: String },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
    #[error("Download directory not found")]
    DownloadDirNotFound,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Profile '{profile}' not found")]
    ProfileNotFound { profile: String },
    #[error("Unknown configuration key '{key}'")]
    UnknownKey { key: String },
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Invalid page token '{token}'")]
    InvalidPageToken { token: String },
    #[error("List controller is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(CliError::Cancelled(_)) => ErrorSeverity::Low,
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::Unauthorized { .. } => ErrorSeverity::High,
                ApiError::Validation { .. } | ApiError::NotFound { .. } => ErrorSeverity::Medium,
                e if e.is_transport() => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::List(_) => ErrorSeverity::Low,
        }
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Api(ApiError::Validation { errors, message, .. }) => {
                if errors.is_empty() {
                    format!("Validation failed: {}", message)
                } else {
                    format!("Validation failed: {}", errors.summary())
                }
            }
            AppError::Api(ApiError::NotFound { endpoint }) => {
                format!("Nothing found at {}", endpoint)
            }
            AppError::Api(ApiError::Unauthorized { .. }) => "Not authorized".to_string(),
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Api(ApiError::Unauthorized { .. }) => {
                Some("pass --token or set STOCKROOM_API_TOKEN".to_string())
            }
            AppError::Api(ApiError::Transport { .. } | ApiError::Timeout { .. }) => Some(
                "check the API URL with 'stockroom config show' and that the server is up"
                    .to_string(),
            ),
            AppError::Config(ConfigError::ProfileNotFound { .. }) => {
                Some("'stockroom config set api_url <url>' creates the profile".to_string())
            }
            AppError::Config(ConfigError::UnknownKey { .. }) => Some(
                "known keys: api_url, timeout_seconds, search_debounce_ms, download_dir"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_error() -> ApiError {
        let mut errors = FieldErrors::default();
        errors.push("email", "Email is invalid");
        ApiError::Validation {
            endpoint: "/api/customers/store".to_string(),
            message: "The given data was invalid.".to_string(),
            errors,
        }
    }

    #[test]
    fn test_api_error_display() {
        let api_err = ApiError::NotFound {
            endpoint: "/api/products/9".to_string(),
        };
        assert_eq!(
            format!("{}", api_err),
            "Resource not found: /api/products/9"
        );

        let api_err = ApiError::Http {
            status: 500,
            endpoint: "/api/roles".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(format!("{}", api_err), "HTTP error: 500 boom");
        assert_eq!(api_err.endpoint(), "/api/roles");
    }

    #[test]
    fn test_api_error_classification() {
        let err = validation_error();
        assert!(!err.is_transport());
        assert_eq!(
            err.field_errors().and_then(|e| e.first("email")),
            Some("Email is invalid")
        );

        assert!(
            ApiError::Http {
                status: 503,
                endpoint: "/api/x".to_string(),
                message: String::new(),
            }
            .is_transport()
        );
        assert!(
            !ApiError::Http {
                status: 400,
                endpoint: "/api/x".to_string(),
                message: String::new(),
            }
            .is_transport()
        );
        assert!(
            ApiError::Transport {
                endpoint: "/api/x".to_string(),
                message: "refused".to_string(),
            }
            .is_transport()
        );
        assert!(
            ApiError::NotFound {
                endpoint: "/api/x/1".to_string()
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_app_error_display_api() {
        let app_err = AppError::Api(validation_error());
        assert_eq!(app_err.severity(), ErrorSeverity::Medium);
        assert_eq!(
            app_err.display_friendly(),
            "Validation failed: email: Email is invalid"
        );

        let app_err = AppError::Api(ApiError::Timeout {
            timeout_secs: 30,
            endpoint: "/api/products".to_string(),
        });
        assert_eq!(app_err.severity(), ErrorSeverity::High);
        assert!(app_err.troubleshooting_hint().is_some());
    }

    #[test]
    fn test_validation_without_field_errors_shows_message() {
        let app_err = AppError::Api(ApiError::Validation {
            endpoint: "/api/roles/store".to_string(),
            message: "The role could not be saved.".to_string(),
            errors: FieldErrors::default(),
        });
        assert_eq!(
            app_err.display_friendly(),
            "Validation failed: The role could not be saved."
        );
    }

    #[test]
    fn test_list_error_display() {
        let app_err = AppError::from(ListError::InvalidPageToken {
            token: "abc".to_string(),
        });
        assert_eq!(
            format!("{}", app_err),
            "ListError: Invalid page token 'abc'"
        );
        assert_eq!(app_err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_config_error_hint() {
        let app_err = AppError::Config(ConfigError::UnknownKey {
            key: "colour".to_string(),
        });
        assert_eq!(app_err.severity(), ErrorSeverity::High);
        let hint = app_err.troubleshooting_hint().unwrap_or_default();
        assert!(hint.contains("api_url"));
    }
}
