//! Reading and editing the shape tree (`p:cSld/p:spTree`) of a slide-like part.

use crate::rels::Relationships;
use crate::xml::XmlElement;
use unmark_core::{Error, Link, Paragraph, Result, Run, RunIndex, Shape, ShapeKind, TextBody};

/// Local names of the elements that count as shapes in a shape tree.
const SHAPE_ELEMENTS: &[&[u8]] = &[
    b"sp",
    b"pic",
    b"grpSp",
    b"graphicFrame",
    b"cxnSp",
    b"contentPart",
];

fn is_shape_element(element: &XmlElement) -> bool {
    let name = element.local_name();
    SHAPE_ELEMENTS.iter().any(|&shape| shape == name)
}

/// Positions in `sp_tree.children` of the top-level shapes.
pub(crate) fn shape_positions(sp_tree: &XmlElement) -> Vec<usize> {
    sp_tree.positions(is_shape_element)
}

/// Snapshot every top-level shape of a shape tree.
pub(crate) fn read_shapes(sp_tree: &XmlElement, rels: Option<&Relationships>) -> Vec<Shape> {
    sp_tree
        .elements()
        .filter(|el| is_shape_element(el))
        .enumerate()
        .map(|(index, el)| read_shape(index, el, rels))
        .collect()
}

fn read_shape(index: usize, element: &XmlElement, rels: Option<&Relationships>) -> Shape {
    let kind = match element.local_name() {
        b"pic" => ShapeKind::Picture,
        b"sp" => ShapeKind::AutoShape,
        _ => ShapeKind::Other,
    };

    let mut shape = Shape::new(index, kind);

    if let Some(nv) = non_visual(element) {
        let c_nv_pr = nv.child(b"cNvPr");
        shape.name = c_nv_pr.and_then(|c| c.attr(b"name"));
        shape.click_link = resolve_link(c_nv_pr.and_then(|c| c.child(b"hlinkClick")), rels);
        shape.placeholder = nv
            .child(b"nvPr")
            .and_then(|pr| pr.child(b"ph"))
            .is_some();
    }

    let (left, top) = offset(element);
    shape.left = left;
    shape.top = top;

    if kind == ShapeKind::AutoShape {
        shape.text = element.child(b"txBody").map(|body| read_text_body(body, rels));
    }

    shape
}

/// The `nv*Pr` container (`nvSpPr`, `nvPicPr`, `nvGrpSpPr`, ...).
fn non_visual(element: &XmlElement) -> Option<&XmlElement> {
    element.elements().find(|el| {
        let name = el.local_name();
        name.starts_with(b"nv") && name.ends_with(b"Pr")
    })
}

/// Top-left offset in EMU from the shape's own transform.
fn offset(element: &XmlElement) -> (Option<i64>, Option<i64>) {
    let xfrm = element
        .child(b"spPr")
        .or_else(|| element.child(b"grpSpPr"))
        .and_then(|pr| pr.child(b"xfrm"))
        .or_else(|| element.child(b"xfrm"));

    match xfrm.and_then(|x| x.child(b"off")) {
        Some(off) => (parse_emu(off, b"x"), parse_emu(off, b"y")),
        None => (None, None),
    }
}

fn parse_emu(element: &XmlElement, key: &[u8]) -> Option<i64> {
    element.attr(key).and_then(|v| v.trim().parse().ok())
}

fn read_text_body(body: &XmlElement, rels: Option<&Relationships>) -> TextBody {
    let paragraphs = body
        .elements()
        .filter(|el| el.is(b"p"))
        .map(|p| Paragraph {
            runs: p
                .elements()
                .filter(|el| el.is(b"r"))
                .map(|r| Run {
                    text: r.child(b"t").map(XmlElement::text).unwrap_or_default(),
                    link: resolve_link(
                        r.child(b"rPr").and_then(|pr| pr.child(b"hlinkClick")),
                        rels,
                    ),
                })
                .collect(),
        })
        .collect();

    TextBody { paragraphs }
}

/// Resolve an `a:hlinkClick` element to the address it points at.
///
/// A link without `r:id` only carries an action (such as "next slide") and has
/// no address.
fn resolve_link(hlink: Option<&XmlElement>, rels: Option<&Relationships>) -> Link {
    let Some(id) = hlink.and_then(|h| h.prefixed_attr(b"id")) else {
        return Link::None;
    };
    if id.is_empty() {
        return Link::None;
    }

    match rels {
        None => Link::Broken(format!("no relationships part to resolve {}", id)),
        Some(rels) => match rels.get(&id) {
            Some(rel) => Link::Address(rel.target),
            None => Link::Broken(format!("relationship {} not found", id)),
        },
    }
}

/// Remove the shapes at the given snapshot indices.
pub(crate) fn remove_shapes(sp_tree: &mut XmlElement, indices: &[usize]) -> Result<usize> {
    let positions = shape_positions(sp_tree);

    let targets = indices
        .iter()
        .map(|&i| {
            positions
                .get(i)
                .copied()
                .ok_or_else(|| Error::ShapeTree(format!("no shape at index {}", i)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(sp_tree.remove_positions(&targets))
}

/// Remove the `a:hlinkClick` from a run's properties.
pub(crate) fn detach_run_link(sp_tree: &mut XmlElement, at: RunIndex) -> Result<()> {
    let run = paragraph_mut(sp_tree, at)?
        .nth_child_mut(b"r", at.run)
        .ok_or_else(|| Error::ShapeTree(format!("no run at {}", at)))?;

    let props = run
        .child_mut(b"rPr")
        .ok_or_else(|| Error::ShapeTree(format!("run at {} has no properties", at)))?;

    let links = props.positions(|el| el.is(b"hlinkClick"));
    if props.remove_positions(&links) == 0 {
        return Err(Error::ShapeTree(format!("run at {} has no hyperlink", at)));
    }
    Ok(())
}

/// Remove a run element from its paragraph.
pub(crate) fn remove_run(sp_tree: &mut XmlElement, at: RunIndex) -> Result<()> {
    let paragraph = paragraph_mut(sp_tree, at)?;
    let pos = paragraph
        .positions(|el| el.is(b"r"))
        .get(at.run)
        .copied()
        .ok_or_else(|| Error::ShapeTree(format!("no run at {}", at)))?;

    paragraph.remove_positions(&[pos]);
    Ok(())
}

fn paragraph_mut(sp_tree: &mut XmlElement, at: RunIndex) -> Result<&mut XmlElement> {
    let pos = shape_positions(sp_tree)
        .get(at.shape)
        .copied()
        .ok_or_else(|| Error::ShapeTree(format!("no shape at index {}", at.shape)))?;

    sp_tree
        .element_at_mut(pos)
        .and_then(|shape| shape.child_mut(b"txBody"))
        .and_then(|body| body.nth_child_mut(b"p", at.paragraph))
        .ok_or_else(|| Error::ShapeTree(format!("no paragraph at {}", at)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const SLIDE: &str = r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r"><p:cSld><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
<p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/>
<p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"/><a:t>Hello</a:t></a:r></a:p></p:txBody></p:sp>
<p:pic><p:nvPicPr><p:cNvPr id="3" name="Logo"><a:hlinkClick r:id="rId2"/></p:cNvPr><p:cNvPicPr/><p:nvPr/></p:nvPicPr>
<p:blipFill><a:blip r:embed="rId5"/></p:blipFill><p:spPr><a:xfrm><a:off x="9000000" y="6000000"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr></p:pic>
<p:sp><p:nvSpPr><p:cNvPr id="4" name="Footer"><a:hlinkClick r:id="" action="ppaction://hlinkshowjump?jump=nextslide"/></p:cNvPr><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="10" y="20"/><a:ext cx="1" cy="1"/></a:xfrm></p:spPr>
<p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"><a:hlinkClick r:id="rId3"/></a:rPr><a:t>Made with Gamma</a:t></a:r><a:r><a:rPr><a:hlinkClick r:id="rId4"/></a:rPr><a:t></a:t></a:r><a:r><a:rPr><a:hlinkClick r:id="rId9"/></a:rPr><a:t>x</a:t></a:r></a:p></p:txBody></p:sp>
<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Table"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="1" y="2"/><a:ext cx="3" cy="4"/></p:xfrm></p:graphicFrame>
</p:spTree></p:cSld></p:sld>"#;

    const RELS: &str = r#"<Relationships xmlns="urn:rels"><Relationship Id="rId2" Type="urn:x/hyperlink" Target="https://gamma.app/logo" TargetMode="External"/><Relationship Id="rId3" Type="urn:x/hyperlink" Target="https://gamma.app/?ref=footer" TargetMode="External"/><Relationship Id="rId4" Type="urn:x/hyperlink" Target="https://gamma.app" TargetMode="External"/></Relationships>"#;

    fn sp_tree(doc: &mut XmlDocument) -> &mut XmlElement {
        doc.root
            .child_mut(b"cSld")
            .and_then(|c| c.child_mut(b"spTree"))
            .unwrap()
    }

    #[test]
    fn test_read_shapes() {
        let mut doc = XmlDocument::parse(SLIDE).unwrap();
        let rels = Relationships::parse(RELS).unwrap();
        let shapes = read_shapes(sp_tree(&mut doc), Some(&rels));

        assert_eq!(shapes.len(), 4);

        let title = &shapes[0];
        assert_eq!(title.kind, ShapeKind::AutoShape);
        assert!(title.placeholder);
        assert_eq!((title.left, title.top), (None, None));
        assert_eq!(title.text.as_ref().unwrap().paragraphs[0].runs, vec![Run::new("Hello")]);

        let logo = &shapes[1];
        assert_eq!(logo.kind, ShapeKind::Picture);
        assert_eq!(logo.name.as_deref(), Some("Logo"));
        assert_eq!((logo.left, logo.top), (Some(9_000_000), Some(6_000_000)));
        assert_eq!(logo.click_link, Link::Address("https://gamma.app/logo".to_string()));
        assert!(logo.text.is_none());

        let footer = &shapes[2];
        assert_eq!(footer.click_link, Link::None);
        let runs = &footer.text.as_ref().unwrap().paragraphs[0].runs;
        assert_eq!(runs[0], Run::linked("Made with Gamma", "https://gamma.app/?ref=footer"));
        assert_eq!(runs[1], Run::linked("", "https://gamma.app"));
        assert!(matches!(runs[2].link, Link::Broken(_)));

        let table = &shapes[3];
        assert_eq!(table.kind, ShapeKind::Other);
        assert_eq!((table.left, table.top), (Some(1), Some(2)));
    }

    #[test]
    fn test_links_without_relationships_are_broken() {
        let mut doc = XmlDocument::parse(SLIDE).unwrap();
        let shapes = read_shapes(sp_tree(&mut doc), None);
        assert!(matches!(shapes[1].click_link, Link::Broken(_)));
    }

    #[test]
    fn test_detach_and_remove_run() {
        let mut doc = XmlDocument::parse(SLIDE).unwrap();
        let tree = sp_tree(&mut doc);
        let rels = Relationships::parse(RELS).unwrap();

        let first = RunIndex { shape: 2, paragraph: 0, run: 0 };
        let second = RunIndex { shape: 2, paragraph: 0, run: 1 };

        detach_run_link(tree, first).unwrap();
        assert!(detach_run_link(tree, first).is_err());
        remove_run(tree, second).unwrap();

        let shapes = read_shapes(tree, Some(&rels));
        let runs = &shapes[2].text.as_ref().unwrap().paragraphs[0].runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], Run::new("Made with Gamma"));
        assert_eq!(runs[1].text, "x");

        let missing = RunIndex { shape: 1, paragraph: 0, run: 0 };
        assert!(matches!(remove_run(tree, missing), Err(Error::ShapeTree(_))));
    }

    #[test]
    fn test_remove_shapes() {
        let mut doc = XmlDocument::parse(SLIDE).unwrap();
        let tree = sp_tree(&mut doc);

        assert!(remove_shapes(tree, &[7]).is_err());
        assert_eq!(remove_shapes(tree, &[3, 1]).unwrap(), 2);

        let names: Vec<_> = read_shapes(tree, None)
            .into_iter()
            .filter_map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Title", "Footer"]);
        // Group properties are not shapes and survive.
        assert!(tree.child(b"nvGrpSpPr").is_some());
    }
}
