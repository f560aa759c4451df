//! Error types for watermark cleaning.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening, cleaning, or saving a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// A part required by the package structure is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or serialization error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A shape tree does not have the structure an edit expects.
    #[error("Shape tree error: {0}")]
    ShapeTree(String),

    /// The cleaner configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
