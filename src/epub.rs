use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use indexmap::IndexMap;
use log::{debug, warn};
use zip::ZipArchive;

use crate::{
    error::PagerError,
    types::{Document, ManifestItem, SpineItem},
    utils::{
        DecodeBytes, NormalizeWhitespace, XmlElement, XmlReader, compression_method_check,
        get_file_in_zip_archive, resolve_container_path,
    },
};

/// A source of the content documents of a structured book
///
/// The pagination engine only needs the documents of a book, in order, with
/// their raw bytes. Anything able to produce them can back a book; the crate
/// provides [EpubContainer] for EPUB files and an implementation for a plain
/// `Vec<Document>`.
pub trait DocumentSource {
    /// Reads all content documents in book order
    fn read_documents(&mut self) -> Result<Vec<Document>, PagerError>;

    /// Returns the title of the book, if the source knows it
    fn title(&self) -> Option<String> {
        None
    }
}

impl DocumentSource for Vec<Document> {
    fn read_documents(&mut self) -> Result<Vec<Document>, PagerError> {
        Ok(self.clone())
    }
}

/// EPUB container reader
///
/// The `EpubContainer` opens the ZIP container of an EPUB publication, follows
/// `META-INF/container.xml` to the OPF package document and reads its manifest,
/// spine and title. Its job ends at handing out the content documents: it does
/// not validate the publication against the EPUB specification.
///
/// Content documents are the XHTML and HTML items of the manifest, in manifest
/// order, without the EPUB 3 navigation document.
pub struct EpubContainer<R: Read + Seek> {
    /// The structure of the epub file that actually holds it
    archive: ZipArchive<R>,

    /// The path to the OPF file inside the container
    pub package_path: String,

    /// The directory of the OPF file, empty for the container root
    pub base_path: String,

    /// The first `dc:title` of the package metadata
    pub title: Option<String>,

    /// The resources of the publication, in manifest order
    pub manifest: IndexMap<String, ManifestItem>,

    /// The reading order declared by the spine
    pub spine: Vec<SpineItem>,
}

impl<R: Read + Seek> EpubContainer<R> {
    /// Opens an EPUB container from a reader
    ///
    /// # Parameters
    /// - `reader`: The data source, usually a file or memory buffer
    ///
    /// # Return
    /// - `Ok(EpubContainer<R>)`: The container with its manifest, spine and title parsed
    /// - `Err(PagerError)`: The archive is unreadable or the package document cannot be located
    pub fn from_reader(reader: R) -> Result<Self, PagerError> {
        let mut archive = ZipArchive::new(reader)?;
        compression_method_check(&mut archive)?;

        let container =
            get_file_in_zip_archive(&mut archive, "META-INF/container.xml")?.decode()?;
        let package_path = Self::parse_container(&container)?;
        let base_path = package_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();

        let opf_file = get_file_in_zip_archive(&mut archive, &package_path)?.decode()?;
        let package = XmlReader::parse(&opf_file)?;

        let mut container = Self {
            archive,
            package_path,
            base_path,
            title: None,
            manifest: IndexMap::new(),
            spine: vec![],
        };

        let manifest_element = package.find_element_by_name("manifest").ok_or_else(|| {
            PagerError::NonCanonicalFile {
                tag: "manifest".to_string(),
            }
        })?;

        container.parse_manifest(manifest_element)?;
        match package.find_element_by_name("spine") {
            Some(spine_element) => container.parse_spine(spine_element)?,
            None => warn!("The package document has no spine."),
        }
        container.title = Self::parse_title(&package);

        Ok(container)
    }

    /// Parse the EPUB container file (META-INF/container.xml)
    ///
    /// The first `rootfile` element names the OPF package document.
    fn parse_container(data: &str) -> Result<String, PagerError> {
        let root = XmlReader::parse(data)?;
        let rootfile = root.find_element_by_name("rootfile").ok_or_else(|| {
            PagerError::NonCanonicalFile {
                tag: "rootfile".to_string(),
            }
        })?;

        rootfile.require_attr("full-path")
    }

    /// Parse the EPUB manifest section, keeping declaration order
    fn parse_manifest(&mut self, manifest_element: &XmlElement) -> Result<(), PagerError> {
        let mut manifest = IndexMap::with_capacity(manifest_element.children.len());

        for element in manifest_element.find_children_by_name("item") {
            let id = element.require_attr("id")?;
            let href = element.require_attr("href")?;
            let mime = element.require_attr("media-type")?;
            let properties = element.get_attr("properties");

            let path = resolve_container_path(&self.base_path, &href)
                .ok_or(PagerError::RealtiveLinkLeakage { path: href })?;

            if manifest.contains_key(&id) {
                warn!("Duplicate manifest id \"{}\", keeping the last declaration", id);
            }

            manifest.insert(
                id.clone(),
                ManifestItem {
                    id,
                    path,
                    mime,
                    properties,
                },
            );
        }

        self.manifest = manifest;
        Ok(())
    }

    /// Parse the EPUB spine section
    fn parse_spine(&mut self, spine_element: &XmlElement) -> Result<(), PagerError> {
        let mut spine = Vec::new();
        for element in spine_element.find_children_by_name("itemref") {
            let idref = element.require_attr("idref")?;
            let linear = element
                .get_attr("linear")
                .map(|linear| linear != "no")
                .unwrap_or(true);

            if !self.manifest.contains_key(&idref) {
                warn!("Spine item \"{}\" is not declared in the manifest", idref);
            }

            spine.push(SpineItem { idref, linear });
        }

        self.spine = spine;
        Ok(())
    }

    fn parse_title(package: &XmlElement) -> Option<String> {
        let title = package
            .find_element_by_name("metadata")
            .and_then(|metadata| metadata.find_element_by_name("title"))
            .map(|title| title.text().normalize_whitespace())
            .filter(|title| !title.is_empty());

        if title.is_none() {
            warn!("Expecting a dc:title in the package document, but it's missing.");
        }
        title
    }

    /// Returns the content documents declared by the manifest, in manifest order
    pub fn content_items(&self) -> impl Iterator<Item = &ManifestItem> {
        self.manifest
            .values()
            .filter(|item| item.is_content_document())
    }
}

impl<R: Read + Seek> DocumentSource for EpubContainer<R> {
    /// Reads every content document from the archive
    ///
    /// A document declared in the manifest but missing from the archive is an error.
    fn read_documents(&mut self) -> Result<Vec<Document>, PagerError> {
        let items = self.content_items().cloned().collect::<Vec<_>>();

        let mut documents = Vec::with_capacity(items.len());
        for item in items {
            let content = get_file_in_zip_archive(&mut self.archive, &item.path)?;
            debug!("Read document \"{}\" ({} bytes)", item.path, content.len());
            documents.push(Document::new(&item.id, &item.path, content));
        }

        Ok(documents)
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

impl EpubContainer<BufReader<File>> {
    /// Opens an EPUB container from a file path
    ///
    /// The file stays open as long as the container lives.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PagerError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}
