// src/error.rs

//! Crate-wide error type for revlock

use thiserror::Error;

/// Errors raised by lockfile I/O and the external collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Remote endpoint could not be reached (or kept failing after retries)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Command failed: {0}")]
    CommandError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
