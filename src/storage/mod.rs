//! Storage layer for stockroom
//!
//! Handles the TOML configuration file and report downloads written to disk.

use crate::error::StorageError;

pub mod config;
pub mod download;

type Result<T> = std::result::Result<T, StorageError>;
