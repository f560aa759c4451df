//! Editable XML tree for package parts.
//!
//! Start tags and text keep their original escaped bytes, so any markup the
//! cleaner does not touch is written back exactly as it was read.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use unmark_core::{Error, Result};

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Declaration, comments, and whitespace before the root element.
    prolog: Vec<Event<'static>>,
    pub root: XmlElement,
    epilog: Vec<Event<'static>>,
}

/// A node inside an element.
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(BytesText<'static>),
    /// Comments, CDATA, processing instructions.
    Other(Event<'static>),
}

/// An element with its original start tag.
#[derive(Debug, Clone)]
pub struct XmlElement {
    start: BytesStart<'static>,
    self_closing: bool,
    pub children: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a complete XML document.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content.trim_start_matches('\u{feff}'));

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            };

            match event {
                Event::Start(start) => {
                    stack.push(XmlElement::from_start(start.into_owned(), false));
                }
                Event::Empty(start) => {
                    let element = XmlElement::from_start(start.into_owned(), true);
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Eof => break,
                Event::Text(text) => match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Text(text.into_owned())),
                    None if root.is_none() => prolog.push(Event::Text(text.into_owned())),
                    None => epilog.push(Event::Text(text.into_owned())),
                },
                other => match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Other(other.into_owned())),
                    None if root.is_none() => prolog.push(other.into_owned()),
                    None => epilog.push(other.into_owned()),
                },
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!(
                "unclosed element <{}>",
                String::from_utf8_lossy(open.name())
            )));
        }

        let root = root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        for event in &self.prolog {
            writer.write_event(event).map_err(write_error)?;
        }
        write_element(&mut writer, &self.root)?;
        for event in &self.epilog {
            writer.write_event(event).map_err(write_error)?;
        }

        Ok(writer.into_inner())
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }

    if root.is_some() {
        return Err(Error::XmlError("multiple root elements".to_string()));
    }
    *root = Some(element);
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    if element.self_closing && element.children.is_empty() {
        return writer
            .write_event(Event::Empty(element.start.clone()))
            .map_err(write_error);
    }

    writer
        .write_event(Event::Start(element.start.clone()))
        .map_err(write_error)?;

    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(text.clone()))
                .map_err(write_error)?,
            XmlNode::Other(event) => writer.write_event(event).map_err(write_error)?,
        }
    }

    writer
        .write_event(Event::End(element.start.to_end()))
        .map_err(write_error)
}

fn write_error(e: impl std::fmt::Display) -> Error {
    Error::XmlError(format!("Failed to write XML: {}", e))
}

impl XmlElement {
    fn from_start(start: BytesStart<'static>, self_closing: bool) -> Self {
        Self {
            start,
            self_closing,
            children: Vec::new(),
        }
    }

    /// Qualified name, e.g. `p:sp`.
    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &[u8] {
        local_name(self.name())
    }

    /// Whether the local name equals `local`.
    pub fn is(&self, local: &[u8]) -> bool {
        self.local_name() == local
    }

    /// Unescaped value of the attribute with exactly this qualified name.
    pub fn attr(&self, key: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == key)
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Unescaped value of a namespace-prefixed attribute by local name
    /// (matches `r:id` but not the bare `id`).
    pub fn prefixed_attr(&self, local: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|attr| {
                let key = attr.key.as_ref();
                key.contains(&b':') && !key.starts_with(b"xmlns") && local_name(key) == local
            })
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &[u8]) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(local))
    }

    /// First child element with the given local name, mutably.
    pub fn child_mut(&mut self, local: &[u8]) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) if el.is(local) => Some(el),
            _ => None,
        })
    }

    /// Positions in `children` of the child elements matching `predicate`.
    pub fn positions<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&XmlElement) -> bool,
    {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(pos, node)| match node {
                XmlNode::Element(el) if predicate(el) => Some(pos),
                _ => None,
            })
            .collect()
    }

    /// The element at a position in `children`.
    pub fn element_at_mut(&mut self, pos: usize) -> Option<&mut XmlElement> {
        match self.children.get_mut(pos) {
            Some(XmlNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// The `n`th child element with the given local name, mutably.
    pub fn nth_child_mut(&mut self, local: &[u8], n: usize) -> Option<&mut XmlElement> {
        let pos = *self.positions(|el| el.is(local)).get(n)?;
        self.element_at_mut(pos)
    }

    /// Remove the children at the given positions. Returns how many were removed.
    pub fn remove_positions(&mut self, positions: &[usize]) -> usize {
        let mut positions: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&pos| pos < self.children.len())
            .collect();
        positions.sort_unstable();
        positions.dedup();

        for &pos in positions.iter().rev() {
            self.children.remove(pos);
        }
        positions.len()
    }

    /// Concatenated, unescaped text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Element(el) => el.collect_text(out),
                XmlNode::Text(text) => match text.unescape() {
                    Ok(s) => out.push_str(&s),
                    Err(_) => out.push_str(&String::from_utf8_lossy(text)),
                },
                XmlNode::Other(Event::CData(data)) => out.push_str(&String::from_utf8_lossy(data)),
                XmlNode::Other(_) => {}
            }
        }
    }

    /// Every attribute value in this subtree, unescaped.
    pub fn collect_attribute_values(&self, out: &mut HashSet<String>) {
        for attr in self.start.attributes().flatten() {
            if let Ok(value) = attr.unescape_value() {
                out.insert(value.into_owned());
            }
        }
        for el in self.elements() {
            el.collect_attribute_values(out);
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
