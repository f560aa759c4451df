//! Document-model seams the cleaner works against.
//!
//! A backend (such as the PPTX package reader) exposes each master, layout,
//! and slide as a [`ShapeContainer`]. The cleaner first takes a read-only
//! snapshot with [`ShapeContainer::shapes`], decides what to remove, and then
//! edits the live collection by index.

use crate::error::Result;
use crate::types::{RunIndex, Shape, SlideSize};

/// An ordered, mutable collection of shapes (a master, layout, or slide).
pub trait ShapeContainer {
    /// Human-readable identifier used in logs and reports.
    fn label(&self) -> &str;

    /// Snapshot the shape collection in document order.
    ///
    /// Snapshot indices stay valid until [`remove_shapes`](Self::remove_shapes)
    /// is called.
    fn shapes(&self) -> Result<Vec<Shape>>;

    /// Remove the shapes at the given snapshot indices. Returns the number removed.
    fn remove_shapes(&mut self, indices: &[usize]) -> Result<usize>;

    /// Detach the hyperlink from a run, keeping its text.
    fn detach_run_link(&mut self, at: RunIndex) -> Result<()>;

    /// Remove a run from its paragraph. Later runs in that paragraph shift down.
    fn remove_run(&mut self, at: RunIndex) -> Result<()>;
}

/// A presentation whose shape containers can be cleaned in place.
pub trait PresentationDocument {
    type Container: ShapeContainer;

    /// Slide dimensions, if the presentation declares them.
    fn slide_size(&self) -> Option<SlideSize>;

    fn masters_mut(&mut self) -> &mut [Self::Container];

    fn layouts_mut(&mut self) -> &mut [Self::Container];

    /// Slides in presentation order.
    fn slides_mut(&mut self) -> &mut [Self::Container];
}
