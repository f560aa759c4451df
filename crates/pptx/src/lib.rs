//! PPTX (Office Open XML) backend for watermark cleaning.
//!
//! Opens .pptx files (ZIP archives containing XML parts), exposes slide
//! masters, layouts, and slides as editable shape containers, and writes the
//! cleaned package back out.

pub mod package;
pub mod part;
pub mod rels;
pub mod shapes;
pub mod xml;

#[cfg(test)]
mod fixture;

pub use package::PptxPackage;
pub use part::SlidePart;
