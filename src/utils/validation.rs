//! Input validation for values typed on the command line or stored in the
//! configuration file.

use crate::error::CliError;

/// Validate that a URL is properly formatted
pub fn validate_url(url: &str) -> crate::Result<()> {
    if url.is_empty() {
        return Err(CliError::InvalidArguments("URL cannot be empty".to_string()).into());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CliError::InvalidArguments(format!(
            "Invalid URL '{}': URL must start with http:// or https://",
            url
        ))
        .into());
    }

    Ok(())
}

/// Resource names are interpolated into request paths as one segment.
pub fn validate_resource_name(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(CliError::InvalidArguments("Resource name cannot be empty".to_string()).into());
    }

    let url_safe = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !url_safe || name == "." || name == ".." {
        return Err(CliError::InvalidArguments(format!(
            "Invalid resource name '{}': use letters, digits, '-', '_' or '.'",
            name
        ))
        .into());
    }

    Ok(())
}

/// Split a `key=value` command-line assignment.
pub fn parse_assignment(raw: &str) -> crate::Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidArguments(format!(
            "Expected key=value, got '{}'",
            raw
        ))
        .into()),
    }
}
