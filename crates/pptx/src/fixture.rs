//! In-memory PPTX packages for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(crate) const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

/// Shape XML plus the external hyperlinks (`rId`, URL) it refers to.
#[derive(Default)]
pub(crate) struct PartSpec {
    pub shapes: Vec<String>,
    pub links: Vec<(&'static str, &'static str)>,
}

impl PartSpec {
    pub fn new(shapes: Vec<String>, links: Vec<(&'static str, &'static str)>) -> Self {
        Self { shapes, links }
    }
}

pub(crate) fn picture(id: u32, name: &str, x: i64, y: i64, link: Option<&str>) -> String {
    let hlink = link
        .map(|rid| format!(r#"<a:hlinkClick r:id="{}"/>"#, rid))
        .unwrap_or_default();
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}">{hlink}</p:cNvPr><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rIdImg"/></p:blipFill><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="500000" cy="200000"/></a:xfrm></p:spPr></p:pic>"#
    )
}

pub(crate) fn linked_shape(id: u32, name: &str, link: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"><a:hlinkClick r:id="{link}"/></p:cNvPr><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr></p:sp>"#
    )
}

/// A text box with one paragraph; each run is (text, optional rId).
pub(crate) fn text_box(id: u32, name: &str, runs: &[(&str, Option<&str>)]) -> String {
    let runs: String = runs
        .iter()
        .map(|(text, link)| match link {
            Some(rid) => format!(
                r#"<a:r><a:rPr lang="en-US"><a:hlinkClick r:id="{rid}"/></a:rPr><a:t>{text}</a:t></a:r>"#
            ),
            None => format!(r#"<a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r>"#),
        })
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="100"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p>{runs}<a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#
    )
}

fn shape_tree_part(root: &str, extra: &str, spec: &PartSpec) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:{root} {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld>{extra}</p:{root}>"#,
        shapes = spec.shapes.concat()
    )
}

fn rels(entries: &[(String, String, String, bool)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target, external)| {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            format!(r#"<Relationship Id="{id}" Type="{REL_NS}/{kind}" Target="{target}"{mode}/>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

fn rel(id: &str, kind: &str, target: &str, external: bool) -> (String, String, String, bool) {
    (id.to_string(), kind.to_string(), target.to_string(), external)
}

fn with_links(mut base: Vec<(String, String, String, bool)>, spec: &PartSpec) -> String {
    for (id, url) in &spec.links {
        base.push(rel(id, "hyperlink", url, true));
    }
    rels(&base)
}

/// Build a package with one master, one layout, and the given slides.
///
/// `slide_size` of `None` omits `p:sldSz`.
pub(crate) fn build(
    master: PartSpec,
    layout: PartSpec,
    slides: &[PartSpec],
    slide_size: Option<(i64, i64)>,
) -> Vec<u8> {
    let mut files: Vec<(String, Vec<u8>, CompressionMethod)> = Vec::new();
    let mut add = |name: &str, content: String| {
        files.push((name.to_string(), content.into_bytes(), CompressionMethod::Deflated));
    };

    add(
        "[Content_Types].xml",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/></Types>"#
            .to_string(),
    );
    add(
        "_rels/.rels",
        rels(&[rel("rId1", "officeDocument", "ppt/presentation.xml", false)]),
    );

    let slide_ids: String = (0..slides.len())
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 10 + i))
        .collect();
    let size = slide_size
        .map(|(cx, cy)| format!(r#"<p:sldSz cx="{cx}" cy="{cy}"/>"#))
        .unwrap_or_default();
    add(
        "ppt/presentation.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst>{size}<p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
        ),
    );

    let mut pres_rels = vec![rel("rId1", "slideMaster", "slideMasters/slideMaster1.xml", false)];
    for i in 0..slides.len() {
        pres_rels.push(rel(
            &format!("rId{}", 10 + i),
            "slide",
            &format!("slides/slide{}.xml", i + 1),
            false,
        ));
    }
    add("ppt/_rels/presentation.xml.rels", rels(&pres_rels));

    add(
        "ppt/slideMasters/slideMaster1.xml",
        shape_tree_part(
            "sldMaster",
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            &master,
        ),
    );
    add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        with_links(
            vec![rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml", false)],
            &master,
        ),
    );

    add("ppt/slideLayouts/slideLayout1.xml", shape_tree_part("sldLayout", "", &layout));
    add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        with_links(
            vec![rel("rId1", "slideMaster", "../slideMasters/slideMaster1.xml", false)],
            &layout,
        ),
    );

    for (i, slide) in slides.iter().enumerate() {
        add(
            &format!("ppt/slides/slide{}.xml", i + 1),
            shape_tree_part("sld", "", slide),
        );
        add(
            &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
            with_links(
                vec![
                    rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml", false),
                    rel("rIdImg", "image", "../media/image1.png", false),
                ],
                slide,
            ),
        );
    }

    files.push((
        "ppt/media/image1.png".to_string(),
        IMAGE_BYTES.to_vec(),
        CompressionMethod::Stored,
    ));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, method) in files {
        zip.start_file(name, FileOptions::default().compression_method(method))
            .unwrap();
        zip.write_all(&data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
