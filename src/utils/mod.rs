//! Utils module - Shared utilities and helpers

/// Error conversion helpers
pub mod error_helpers;

/// Logger initialization
pub mod logging;

/// Display-width aware text helpers
pub mod text;

/// Input validation for URLs and resource names
pub mod validation;
