//! Slide masters, layouts, and slides as editable shape containers.

use crate::rels::{rel_type, rels_path_for, Relationships};
use crate::shapes;
use crate::xml::{XmlDocument, XmlElement};
use std::collections::HashSet;
use unmark_core::{Error, Result, RunIndex, Shape, ShapeContainer};

/// A slide-like part (master, layout, or slide) and its relationships.
#[derive(Debug, Clone)]
pub struct SlidePart {
    path: String,
    xml: XmlDocument,
    rels: Option<Relationships>,
    modified: bool,
    rels_modified: bool,
}

impl SlidePart {
    pub fn new(path: impl Into<String>, xml: XmlDocument, rels: Option<Relationships>) -> Self {
        Self {
            path: path.into(),
            xml,
            rels,
            modified: false,
            rels_modified: false,
        }
    }

    /// Package-relative part name, e.g. `ppt/slides/slide1.xml`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rels_path(&self) -> String {
        rels_path_for(&self.path)
    }

    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    pub fn rels(&self) -> Option<&Relationships> {
        self.rels.as_ref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn rels_modified(&self) -> bool {
        self.rels_modified
    }

    fn sp_tree(&self) -> Result<&XmlElement> {
        self.xml
            .root
            .child(b"cSld")
            .and_then(|c| c.child(b"spTree"))
            .ok_or_else(|| Error::ShapeTree(format!("{} has no p:cSld/p:spTree", self.path)))
    }

    fn sp_tree_mut(&mut self) -> Result<&mut XmlElement> {
        let path = &self.path;
        self.xml
            .root
            .child_mut(b"cSld")
            .and_then(|c| c.child_mut(b"spTree"))
            .ok_or_else(|| Error::ShapeTree(format!("{} has no p:cSld/p:spTree", path)))
    }

    /// Drop hyperlink relationships this part no longer references.
    ///
    /// Only edited parts are pruned. Returns the number of relationships removed.
    pub fn prune_orphaned_hyperlinks(&mut self) -> usize {
        if !self.modified {
            return 0;
        }
        let Some(rels) = self.rels.as_mut() else {
            return 0;
        };

        let mut referenced = HashSet::new();
        self.xml.root.collect_attribute_values(&mut referenced);

        let orphaned: Vec<String> = rels
            .of_type(rel_type::HYPERLINK)
            .filter(|rel| !referenced.contains(&rel.id))
            .map(|rel| rel.id)
            .collect();

        for id in &orphaned {
            rels.remove(id);
        }

        if !orphaned.is_empty() {
            log::debug!(
                "{}: dropped {} unreferenced hyperlink relationship(s)",
                self.path,
                orphaned.len()
            );
            self.rels_modified = true;
        }
        orphaned.len()
    }
}

impl ShapeContainer for SlidePart {
    fn label(&self) -> &str {
        &self.path
    }

    fn shapes(&self) -> Result<Vec<Shape>> {
        Ok(shapes::read_shapes(self.sp_tree()?, self.rels.as_ref()))
    }

    fn remove_shapes(&mut self, indices: &[usize]) -> Result<usize> {
        let removed = shapes::remove_shapes(self.sp_tree_mut()?, indices)?;
        if removed > 0 {
            self.modified = true;
        }
        Ok(removed)
    }

    fn detach_run_link(&mut self, at: RunIndex) -> Result<()> {
        shapes::detach_run_link(self.sp_tree_mut()?, at)?;
        self.modified = true;
        Ok(())
    }

    fn remove_run(&mut self, at: RunIndex) -> Result<()> {
        shapes::remove_run(self.sp_tree_mut()?, at)?;
        self.modified = true;
        Ok(())
    }
}
