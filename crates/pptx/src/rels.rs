//! Package relationships (`_rels/*.rels` parts) and part-name resolution.

use crate::xml::XmlDocument;
use unmark_core::{Error, Result};

/// Relationship type suffixes, shared by the transitional and strict schemas.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str = "/officeDocument";
    pub const SLIDE_MASTER: &str = "/slideMaster";
    pub const SLIDE_LAYOUT: &str = "/slideLayout";
    pub const SLIDE: &str = "/slide";
    pub const HYPERLINK: &str = "/hyperlink";
}

/// A single relationship from a source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Target reference, relative to the source part unless external.
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type URI ends with `suffix`.
    pub fn is_type(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// The relationships of one part, kept as XML so unknown content survives.
#[derive(Debug, Clone)]
pub struct Relationships {
    doc: XmlDocument,
}

impl Relationships {
    /// Parse a `.rels` part.
    pub fn parse(content: &str) -> Result<Self> {
        let doc = XmlDocument::parse(content)?;
        if !doc.root.is(b"Relationships") {
            return Err(Error::XmlError(format!(
                "expected <Relationships>, found <{}>",
                String::from_utf8_lossy(doc.root.name())
            )));
        }
        Ok(Self { doc })
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.doc
            .root
            .elements()
            .filter(|el| el.is(b"Relationship"))
            .map(|el| Relationship {
                id: el.attr(b"Id").unwrap_or_default(),
                rel_type: el.attr(b"Type").unwrap_or_default(),
                target: el.attr(b"Target").unwrap_or_default(),
                external: el
                    .attr(b"TargetMode")
                    .map_or(false, |mode| mode.eq_ignore_ascii_case("external")),
            })
    }

    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.iter().find(|rel| rel.id == id)
    }

    /// Relationships whose type ends with `suffix`, in document order.
    pub fn of_type<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = Relationship> + 'a {
        self.iter().filter(move |rel| rel.is_type(suffix))
    }

    /// Remove a relationship by id. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let positions = self
            .doc
            .root
            .positions(|el| el.is(b"Relationship") && el.attr(b"Id").as_deref() == Some(id));
        self.doc.root.remove_positions(&positions) > 0
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.doc.to_bytes()
    }
}

/// Path of the relationships part for `part`.
///
/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
///
/// Returns a package-relative name without a leading slash.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_path(absolute);
    }

    let base = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if base.is_empty() {
        normalize_path(target)
    } else {
        normalize_path(&format!("{}/{}", base, target))
    }
}

/// Collapse `.` and `..` segments and repeated slashes.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(segment),
        }
    }

    parts.join("/")
}
