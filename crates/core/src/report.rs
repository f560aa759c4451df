//! Per-container and aggregate results of a cleaning pass.

use crate::types::ContainerKind;
use serde::Serialize;

/// What happened to one master, layout, or slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerReport {
    pub kind: ContainerKind,

    /// 1-based position among containers of the same kind.
    pub number: usize,

    pub label: String,
    pub shapes_removed: usize,
    pub links_removed: usize,
    pub corner_pictures_removed: usize,

    /// Non-fatal problems, such as hyperlinks whose address could not be resolved.
    pub warnings: Vec<String>,

    /// Set when processing stopped early; edits made before the failure remain.
    pub error: Option<String>,
}

impl ContainerReport {
    /// Create an empty report for a container.
    pub fn new(kind: ContainerKind, number: usize, label: impl Into<String>) -> Self {
        Self {
            kind,
            number,
            label: label.into(),
            shapes_removed: 0,
            links_removed: 0,
            corner_pictures_removed: 0,
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Record a non-fatal problem and log it.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("[{} {}] {}", self.kind, self.number, message);
        self.warnings.push(message);
    }

    /// Total removals in this container.
    pub fn total(&self) -> usize {
        self.shapes_removed + self.links_removed + self.corner_pictures_removed
    }

    /// Whether anything was removed or went wrong.
    pub fn is_eventful(&self) -> bool {
        self.total() > 0 || !self.warnings.is_empty() || self.error.is_some()
    }
}

/// Aggregate result of [`WatermarkCleaner::clean`](crate::WatermarkCleaner::clean).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub slide_count: usize,
    pub containers: Vec<ContainerReport>,
}

impl CleanReport {
    pub fn shapes_removed(&self) -> usize {
        self.containers.iter().map(|c| c.shapes_removed).sum()
    }

    pub fn links_removed(&self) -> usize {
        self.containers.iter().map(|c| c.links_removed).sum()
    }

    pub fn corner_pictures_removed(&self) -> usize {
        self.containers.iter().map(|c| c.corner_pictures_removed).sum()
    }

    /// The (shapes removed, links stripped, corner pictures removed) triple.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.shapes_removed(),
            self.links_removed(),
            self.corner_pictures_removed(),
        )
    }

    pub fn total(&self) -> usize {
        self.containers.iter().map(ContainerReport::total).sum()
    }

    /// Whether the pass changed anything.
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// All warnings, prefixed with the container they came from.
    pub fn warnings(&self) -> Vec<String> {
        self.containers
            .iter()
            .flat_map(|c| {
                c.warnings
                    .iter()
                    .map(move |w| format!("[{} {}] {}", c.kind, c.number, w))
            })
            .collect()
    }

    /// Containers whose processing stopped on an error.
    pub fn failures(&self) -> impl Iterator<Item = &ContainerReport> {
        self.containers.iter().filter(|c| c.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut slide = ContainerReport::new(ContainerKind::Slide, 1, "slide1");
        slide.shapes_removed = 1;
        slide.corner_pictures_removed = 2;

        let mut layout = ContainerReport::new(ContainerKind::Layout, 1, "layout1");
        layout.links_removed = 3;
        layout.error = Some("boom".to_string());

        let report = CleanReport {
            slide_count: 1,
            containers: vec![layout, slide],
        };

        assert_eq!(report.counts(), (1, 3, 2));
        assert_eq!(report.total(), 6);
        assert!(!report.is_clean());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_warnings_are_prefixed() {
        let mut slide = ContainerReport::new(ContainerKind::Slide, 4, "slide4");
        slide.warn("relationship rId9 not found");

        let report = CleanReport {
            slide_count: 4,
            containers: vec![slide],
        };

        assert_eq!(
            report.warnings(),
            vec!["[SLIDE 4] relationship rId9 not found".to_string()]
        );
        assert!(report.is_clean());
    }
}
