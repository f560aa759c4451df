//! PPTX package: reading the ZIP container, locating masters, layouts, and
//! slides, and writing the edited package back out.

use crate::part::SlidePart;
use crate::rels::{rel_type, rels_path_for, resolve_target, Relationships};
use crate::xml::{XmlDocument, XmlElement};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use unmark_core::{Error, PresentationDocument, Result, SlideSize};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Main part used when the package relationships do not name one.
const DEFAULT_MAIN_PART: &str = "ppt/presentation.xml";

/// One ZIP entry, kept in its original order.
#[derive(Debug, Clone)]
struct ZipEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An opened PPTX package.
#[derive(Debug, Clone)]
pub struct PptxPackage {
    entries: Vec<ZipEntry>,
    slide_size: Option<SlideSize>,
    masters: Vec<SlidePart>,
    layouts: Vec<SlidePart>,
    slides: Vec<SlidePart>,
}

impl PptxPackage {
    /// Open a PPTX file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a PPTX package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;

            let name = file.name().to_string();
            // The declared size is untrusted; let the buffer grow as data arrives.
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

            entries.push(ZipEntry {
                name,
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<ZipEntry>) -> Result<Self> {
        let index: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        let reader = EntryReader {
            entries: &entries,
            index: &index,
        };

        let main_part = reader.main_part()?;
        log::debug!("Main presentation part: {}", main_part);

        let presentation = XmlDocument::parse(&reader.text(&main_part)?)?;
        let pres_rels_path = rels_path_for(&main_part);
        let pres_rels = Relationships::parse(&reader.text(&pres_rels_path)?)?;

        let slide_size = presentation.root.child(b"sldSz").and_then(|sz| {
            let cx = sz.attr(b"cx")?.trim().parse().ok()?;
            let cy = sz.attr(b"cy")?.trim().parse().ok()?;
            Some(SlideSize::new(cx, cy))
        });
        if slide_size.is_none() {
            log::warn!("{} does not declare a slide size", main_part);
        }

        let master_paths = id_list_targets(
            &presentation.root,
            b"sldMasterIdLst",
            &pres_rels,
            &main_part,
            rel_type::SLIDE_MASTER,
        )?;
        let slide_paths = id_list_targets(
            &presentation.root,
            b"sldIdLst",
            &pres_rels,
            &main_part,
            rel_type::SLIDE,
        )?;

        let masters = master_paths
            .iter()
            .map(|path| reader.part(path))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut layouts = Vec::new();
        for master in &masters {
            let Some(master_rels) = master.rels() else {
                continue;
            };
            let layout_paths = id_list_targets(
                &master.xml().root,
                b"sldLayoutIdLst",
                master_rels,
                master.path(),
                rel_type::SLIDE_LAYOUT,
            )?;
            for path in layout_paths {
                if seen.insert(path.clone()) {
                    layouts.push(reader.part(&path)?);
                }
            }
        }

        let slides = slide_paths
            .iter()
            .map(|path| reader.part(path))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Loaded {} master(s), {} layout(s), {} slide(s)",
            masters.len(),
            layouts.len(),
            slides.len()
        );

        Ok(Self {
            entries,
            slide_size,
            masters,
            layouts,
            slides,
        })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = self.write_to(BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }

    /// Write the package to `writer`, returning it when done.
    ///
    /// Entries keep their order and compression method. Parts the cleaner did
    /// not edit are copied byte for byte.
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> Result<W> {
        let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();

        for part in self
            .masters
            .iter_mut()
            .chain(self.layouts.iter_mut())
            .chain(self.slides.iter_mut())
        {
            part.prune_orphaned_hyperlinks();

            if part.is_modified() {
                replacements.insert(part.path().to_string(), part.xml().to_bytes()?);
            }
            if part.rels_modified() {
                if let Some(rels) = part.rels() {
                    replacements.insert(part.rels_path(), rels.to_bytes()?);
                }
            }
        }

        let mut zip = ZipWriter::new(writer);
        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.clone(), options)
                    .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", entry.name, e)))?;
                continue;
            }

            zip.start_file(entry.name.clone(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", entry.name, e)))?;
            let data = replacements.get(&entry.name).unwrap_or(&entry.data);
            zip.write_all(data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))
    }

    #[cfg(test)]
    pub(crate) fn entry_data(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    #[cfg(test)]
    pub(crate) fn slides(&self) -> &[SlidePart] {
        &self.slides
    }
}

impl PresentationDocument for PptxPackage {
    type Container = SlidePart;

    fn slide_size(&self) -> Option<SlideSize> {
        self.slide_size
    }

    fn masters_mut(&mut self) -> &mut [SlidePart] {
        &mut self.masters
    }

    fn layouts_mut(&mut self) -> &mut [SlidePart] {
        &mut self.layouts
    }

    fn slides_mut(&mut self) -> &mut [SlidePart] {
        &mut self.slides
    }
}

/// Read access to entries by name while the package is being assembled.
struct EntryReader<'a> {
    entries: &'a [ZipEntry],
    index: &'a HashMap<String, usize>,
}

impl EntryReader<'_> {
    fn get(&self, name: &str) -> Option<&ZipEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    fn text(&self, name: &str) -> Result<String> {
        let entry = self
            .get(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        std::str::from_utf8(&entry.data)
            .map(str::to_string)
            .map_err(|e| Error::XmlError(format!("'{}' is not valid UTF-8: {}", name, e)))
    }

    /// The presentation part named by `_rels/.rels`, or the conventional default.
    fn main_part(&self) -> Result<String> {
        if self.get("_rels/.rels").is_none() {
            return Ok(DEFAULT_MAIN_PART.to_string());
        }

        let rels = Relationships::parse(&self.text("_rels/.rels")?)?;
        let main = rels
            .iter()
            .find(|rel| rel.is_type(rel_type::OFFICE_DOCUMENT) && !rel.external)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());
        Ok(main)
    }

    /// Load a slide-like part together with its relationships, if any.
    fn part(&self, path: &str) -> Result<SlidePart> {
        let xml = XmlDocument::parse(&self.text(path)?)
            .map_err(|e| Error::XmlError(format!("{}: {}", path, e)))?;

        let rels_path = rels_path_for(path);
        let rels = match self.get(&rels_path) {
            Some(_) => Some(Relationships::parse(&self.text(&rels_path)?)?),
            None => None,
        };

        Ok(SlidePart::new(path, xml, rels))
    }
}

/// Resolve the `r:id`s of an id list (`p:sldIdLst`, ...) to part names, in list order.
///
/// When the list is absent, falls back to every relationship of `fallback_type`.
fn id_list_targets(
    root: &XmlElement,
    list: &[u8],
    rels: &Relationships,
    source_part: &str,
    fallback_type: &str,
) -> Result<Vec<String>> {
    let Some(list) = root.child(list) else {
        return Ok(rels
            .of_type(fallback_type)
            .filter(|rel| !rel.external)
            .map(|rel| resolve_target(source_part, &rel.target))
            .collect());
    };

    list.elements()
        .filter_map(|item| item.prefixed_attr(b"id"))
        .map(|id| {
            rels.get(&id)
                .map(|rel| resolve_target(source_part, &rel.target))
                .ok_or_else(|| {
                    Error::MissingPart(format!("{} references unknown relationship {}", source_part, id))
                })
        })
        .collect()
}
