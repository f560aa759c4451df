//! Watermark cleaning policy.
//!
//! Masters and layouts get a link sweep. Slides get a corner sweep first and
//! then a link sweep:
//!
//! - **Corner sweep**: if any picture in the bottom-right corner region links
//!   to the target domain, every picture in that region is removed. Watermark
//!   frameworks pair the clickable logo with a decorative image next to it.
//! - **Link sweep**: a shape whose own click hyperlink points at the target
//!   domain is removed. Shapes that merely contain linked text keep their text;
//!   only the run hyperlinks are detached, and runs left blank are removed.

use crate::config::CleanerConfig;
use crate::document::{PresentationDocument, ShapeContainer};
use crate::error::Result;
use crate::report::{CleanReport, ContainerReport};
use crate::types::{ContainerKind, Link, RunIndex, Shape, ShapeKind, SlideSize};

/// Removes watermark shapes, links, and corner pictures from a presentation.
#[derive(Debug, Clone)]
pub struct WatermarkCleaner {
    config: CleanerConfig,
}

impl WatermarkCleaner {
    /// Create a cleaner, rejecting an invalid configuration.
    ///
    /// The target domain is normalized again here, since a deserialized
    /// config does not pass through [`CleanerConfig::with_target_domain`].
    pub fn new(config: CleanerConfig) -> Result<Self> {
        let domain = config.target_domain().to_string();
        let config = config.with_target_domain(domain);
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Clean every master, layout, and slide of `document` in place.
    ///
    /// Each container is processed inside its own error boundary: a failure
    /// is logged and recorded on that container's report, and the pass moves
    /// on to the next container.
    pub fn clean<D: PresentationDocument>(&self, document: &mut D) -> CleanReport {
        let slide_size = document.slide_size();
        let mut report = CleanReport::default();

        for (i, master) in document.masters_mut().iter_mut().enumerate() {
            report.containers.push(self.isolated(master, ContainerKind::Master, i + 1, |c, tally| {
                self.process_shape_tree(c, tally)
            }));
        }

        for (i, layout) in document.layouts_mut().iter_mut().enumerate() {
            report.containers.push(self.isolated(layout, ContainerKind::Layout, i + 1, |c, tally| {
                self.process_shape_tree(c, tally)
            }));
        }

        let slides = document.slides_mut();
        report.slide_count = slides.len();
        for (i, slide) in slides.iter_mut().enumerate() {
            report.containers.push(self.isolated(slide, ContainerKind::Slide, i + 1, |c, tally| {
                self.process_slide(c, slide_size, tally)
            }));
        }

        let (shapes, links, corners) = report.counts();
        log::info!(
            "Cleaning finished: shapes={}, links={}, corner_pictures={}",
            shapes,
            links,
            corners
        );

        report
    }

    /// Run one container step, capturing its error on the container report.
    fn isolated<C, F>(
        &self,
        container: &mut C,
        kind: ContainerKind,
        number: usize,
        step: F,
    ) -> ContainerReport
    where
        C: ShapeContainer,
        F: FnOnce(&mut C, &mut ContainerReport) -> Result<()>,
    {
        let mut tally = ContainerReport::new(kind, number, container.label());

        if let Err(e) = step(container, &mut tally) {
            log::warn!("[{} {}] Error processing shapes: {}", kind, number, e);
            tally.error = Some(e.to_string());
        }

        tally
    }

    /// Link sweep for a master or layout.
    fn process_shape_tree<C: ShapeContainer>(
        &self,
        container: &mut C,
        tally: &mut ContainerReport,
    ) -> Result<()> {
        let shapes = container.shapes()?;
        let linked = self.link_verdicts(&shapes, tally);

        let mut doomed = Vec::new();
        for (shape, &is_linked) in shapes.iter().zip(&linked) {
            if is_linked {
                log::debug!("[{}] {} carries a target-domain link", tally.kind, shape.describe());
                doomed.push(shape.index);
                continue;
            }
            self.strip_text_run_links(container, shape, tally);
        }

        if !doomed.is_empty() {
            let removed = container.remove_shapes(&doomed)?;
            tally.shapes_removed += removed;
            log::info!(
                "[{} {}] Removed {} shape(s) with target-domain link",
                tally.kind,
                tally.number,
                removed
            );
        }

        Ok(())
    }

    /// Corner sweep followed by the link sweep for a slide.
    fn process_slide<C: ShapeContainer>(
        &self,
        container: &mut C,
        slide_size: Option<SlideSize>,
        tally: &mut ContainerReport,
    ) -> Result<()> {
        let shapes = container.shapes()?;
        let linked = self.link_verdicts(&shapes, tally);

        let corner_doomed = match slide_size {
            Some(size) => self.corner_pictures(&shapes, &linked, size),
            None => {
                if shapes.iter().any(|s| s.kind == ShapeKind::Picture) {
                    tally.warn("slide size unknown, corner sweep skipped");
                }
                Vec::new()
            }
        };

        let mut link_doomed = Vec::new();
        for (shape, &is_linked) in shapes.iter().zip(&linked) {
            if corner_doomed.contains(&shape.index) {
                continue;
            }
            if is_linked {
                log::debug!("[SLIDE {}] {} carries a target-domain link", tally.number, shape.describe());
                link_doomed.push(shape.index);
                continue;
            }
            self.strip_text_run_links(container, shape, tally);
        }

        let mut doomed = corner_doomed.clone();
        doomed.extend_from_slice(&link_doomed);
        if doomed.is_empty() {
            return Ok(());
        }

        let removed = container.remove_shapes(&doomed)?;
        tally.corner_pictures_removed += corner_doomed.len();
        tally.shapes_removed += removed.saturating_sub(corner_doomed.len());

        if !corner_doomed.is_empty() {
            log::info!(
                "[SLIDE {}] Removed {} corner picture(s) due to target-domain link",
                tally.number,
                corner_doomed.len()
            );
        }
        if !link_doomed.is_empty() {
            log::info!(
                "[SLIDE {}] Removed {} shape(s) with target-domain link",
                tally.number,
                link_doomed.len()
            );
        }

        Ok(())
    }

    /// Indices of every corner picture, if any of them links to the target domain.
    fn corner_pictures(&self, shapes: &[Shape], linked: &[bool], size: SlideSize) -> Vec<usize> {
        let corner = size.corner(self.config.corner_threshold());

        let in_corner: Vec<(&Shape, bool)> = shapes
            .iter()
            .zip(linked.iter().copied())
            .filter(|(s, _)| s.kind == ShapeKind::Picture && !s.placeholder && corner.contains(s))
            .collect();

        if in_corner.iter().any(|&(_, is_linked)| is_linked) {
            in_corner.into_iter().map(|(s, _)| s.index).collect()
        } else {
            Vec::new()
        }
    }

    /// Whether each shape's own click hyperlink points at the target domain.
    ///
    /// Links inside the shape's text never count here; those are edited by
    /// [`strip_text_run_links`](Self::strip_text_run_links) instead.
    fn link_verdicts(&self, shapes: &[Shape], tally: &mut ContainerReport) -> Vec<bool> {
        shapes
            .iter()
            .map(|shape| match &shape.click_link {
                Link::Address(address) => self.config.matches(address),
                Link::Broken(reason) => {
                    tally.warn(format!(
                        "shape {} kept, click link unreadable: {}",
                        shape.describe(),
                        reason
                    ));
                    false
                }
                Link::None => false,
            })
            .collect()
    }

    /// Detach target-domain hyperlinks from a shape's text runs.
    ///
    /// Runs that are blank once their link is gone are removed. Failures on a
    /// single run are recorded as warnings and the loop continues.
    fn strip_text_run_links<C: ShapeContainer>(
        &self,
        container: &mut C,
        shape: &Shape,
        tally: &mut ContainerReport,
    ) -> usize {
        let Some(body) = &shape.text else {
            return 0;
        };

        let mut stripped = 0;
        let mut blank_runs = Vec::new();

        for (p, paragraph) in body.paragraphs.iter().enumerate() {
            for (r, run) in paragraph.runs.iter().enumerate() {
                let at = RunIndex {
                    shape: shape.index,
                    paragraph: p,
                    run: r,
                };

                match &run.link {
                    Link::Address(address) if self.config.matches(address) => {
                        match container.detach_run_link(at) {
                            Ok(()) => {
                                stripped += 1;
                                if run.text.trim().is_empty() {
                                    blank_runs.push(at);
                                }
                            }
                            Err(e) => tally.warn(format!("could not detach link at {}: {}", at, e)),
                        }
                    }
                    Link::Broken(reason) => {
                        tally.warn(format!("run link at {} kept, unreadable: {}", at, reason));
                    }
                    _ => {}
                }
            }
        }

        // Back to front so earlier run indices stay valid.
        for at in blank_runs.into_iter().rev() {
            if let Err(e) = container.remove_run(at) {
                tally.warn(format!("could not remove blank run at {}: {}", at, e));
            }
        }

        if stripped > 0 {
            log::info!(
                "[{} {}] Stripped {} hyperlink(s) from text of shape {}",
                tally.kind,
                tally.number,
                stripped,
                shape.describe()
            );
            tally.links_removed += stripped;
        }

        stripped
    }
}
