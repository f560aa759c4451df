//! Core domain types, document-model traits, and the watermark cleaning
//! policy for PowerPoint presentations.

pub mod cleaner;
pub mod config;
pub mod document;
pub mod error;
pub mod report;
pub mod types;

pub use cleaner::WatermarkCleaner;
pub use config::{CleanerConfig, DEFAULT_CORNER_THRESHOLD, DEFAULT_TARGET_DOMAIN};
pub use document::{PresentationDocument, ShapeContainer};
pub use error::{Error, Result};
pub use report::{CleanReport, ContainerReport};
pub use types::{
    ContainerKind, CornerRegion, Link, Paragraph, PresentationFormat, Run, RunIndex, Shape,
    ShapeKind, SlideSize, TextBody,
};
