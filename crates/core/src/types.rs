//! Domain types for the shapes, text, and links the cleaner inspects.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The format of a source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected only so it can be rejected.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" | "pptm" | "potx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }

    /// Detect the format from the file header, falling back to the
    /// extension, and accept only PPTX.
    pub fn require_pptx(header: &[u8], extension: Option<&str>) -> Result<Self> {
        match Self::from_magic(header).or_else(|| extension.and_then(Self::from_extension)) {
            Some(Self::Pptx) => Ok(Self::Pptx),
            Some(Self::Ppt) => Err(Error::UnsupportedFormat(
                "legacy .ppt file; only .pptx is supported".to_string(),
            )),
            None => Err(Error::UnsupportedFormat(
                "not a PowerPoint package".to_string(),
            )),
        }
    }
}

/// Which part of the presentation a shape collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Master,
    Layout,
    Slide,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Master => "MASTER",
            Self::Layout => "LAYOUT",
            Self::Slide => "SLIDE",
        };
        f.write_str(name)
    }
}

/// Slide dimensions in EMU, shared by every slide of a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: i64,
    pub height: i64,
}

impl SlideSize {
    /// Create a slide size from width and height in EMU.
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// The bottom-right corner region for the given threshold fraction.
    pub fn corner(&self, threshold: f64) -> CornerRegion {
        CornerRegion {
            right: self.width as f64 * threshold,
            bottom: self.height as f64 * threshold,
        }
    }
}

/// The rectangle where `left >= right` and `top >= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerRegion {
    pub right: f64,
    pub bottom: f64,
}

impl CornerRegion {
    /// Whether a shape's top-left offset lies inside the region.
    ///
    /// Shapes with unknown geometry are never in the corner.
    pub fn contains(&self, shape: &Shape) -> bool {
        match (shape.left, shape.top) {
            (Some(left), Some(top)) => left as f64 >= self.right && top as f64 >= self.bottom,
            _ => false,
        }
    }
}

/// Shape variants the cleaner distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// An embedded or linked picture.
    Picture,
    /// An auto shape, including text boxes.
    AutoShape,
    /// Groups, graphic frames, connectors, and anything else.
    Other,
}

/// A hyperlink as seen by the cleaner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// No hyperlink, or a link that only carries an action and no address.
    None,
    /// A hyperlink with a resolved address.
    Address(String),
    /// A hyperlink is present but its address could not be resolved.
    Broken(String),
}

/// Read-only snapshot of one shape in a container.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Position of the shape in its container's shape collection.
    pub index: usize,
    /// Display name from the shape's non-visual properties.
    pub name: Option<String>,
    pub kind: ShapeKind,
    /// True for placeholder shapes, which inherit their geometry.
    pub placeholder: bool,
    /// Left offset in EMU, if the shape carries its own transform.
    pub left: Option<i64>,
    /// Top offset in EMU, if the shape carries its own transform.
    pub top: Option<i64>,
    /// The shape's own click hyperlink.
    pub click_link: Link,
    pub text: Option<TextBody>,
}

impl Shape {
    /// Create a shape snapshot with no geometry, link, or text.
    pub fn new(index: usize, kind: ShapeKind) -> Self {
        Self {
            index,
            name: None,
            kind,
            placeholder: false,
            left: None,
            top: None,
            click_link: Link::None,
            text: None,
        }
    }

    /// A short label for log lines.
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("#{} '{}'", self.index, name),
            None => format!("#{}", self.index),
        }
    }
}

/// Text content of a shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
}

/// A paragraph of runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

/// A contiguous span of styled text with its own optional hyperlink.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub link: Link,
}

impl Run {
    /// Create a run without a hyperlink.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: Link::None,
        }
    }

    /// Create a run hyperlinked to `address`.
    pub fn linked(text: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: Link::Address(address.into()),
        }
    }
}

/// Addresses a run inside a container's shape collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunIndex {
    pub shape: usize,
    pub paragraph: usize,
    pub run: usize,
}

impl fmt::Display for RunIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shape {} paragraph {} run {}",
            self.shape, self.paragraph, self.run
        )
    }
}
