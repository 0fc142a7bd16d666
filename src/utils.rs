use std::{
    collections::HashMap,
    io::{Read, Seek},
};

use quick_xml::{Reader, events::BytesStart, events::Event};
use zip::{CompressionMethod, ZipArchive, result::ZipError};

use crate::error::PagerError;

/// Extracts the contents of a specified file from a ZIP archive
///
/// ## Parameters
/// - `zip_file`: A mutable reference to a ZIP archive object
/// - `file_name`: The path to the file to extract (relative to the ZIP archive root directory)
///
/// ## Return
/// - `Ok(Vec<u8>)`: The raw bytes of the file
/// - `Err(PagerError)`: The file does not exist or an error occurred during the read operation
pub fn get_file_in_zip_archive<R: Read + Seek>(
    zip_file: &mut ZipArchive<R>,
    file_name: &str,
) -> Result<Vec<u8>, PagerError> {
    let mut buffer = Vec::<u8>::new();
    match zip_file.by_name(file_name) {
        Ok(mut file) => {
            file.read_to_end(&mut buffer)?;
            Ok(buffer)
        }
        Err(ZipError::FileNotFound) => Err(PagerError::ResourceNotFound {
            resource: file_name.to_string(),
        }),
        Err(err) => Err(PagerError::from(err)),
    }
}

/// Checks that every entry of the archive is Stored or Deflated
///
/// OCF containers may only use these two methods, and they are the only
/// ones the `zip` dependency is built with.
pub fn compression_method_check<R: Read + Seek>(
    zip_archive: &mut ZipArchive<R>,
) -> Result<(), PagerError> {
    for index in 0..zip_archive.len() {
        let file = zip_archive.by_index_raw(index)?;

        match file.compression() {
            CompressionMethod::Stored | CompressionMethod::Deflated => continue,
            method => {
                return Err(PagerError::UnusableCompressionMethod {
                    file: file.name().to_string(),
                    method: method.to_string(),
                });
            }
        };
    }

    Ok(())
}

/// Resolves a manifest href against the directory of the package document
///
/// Hrefs starting with `/` are relative to the container root, other hrefs are
/// relative to `base_dir`. `.` and `..` segments are folded; a `..` that would
/// leave the container yields `None`. Fragments and queries are not expected
/// in manifest hrefs and are kept verbatim.
pub fn resolve_container_path(base_dir: &str, href: &str) -> Option<String> {
    let (mut segments, relative) = match href.strip_prefix('/') {
        Some(rest) => (Vec::new(), rest),
        None => (
            base_dir
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>(),
            href,
        ),
    };

    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }

    Some(segments.join("/"))
}

/// Provides functionality to decode byte data into strings
///
/// Container metadata files (container.xml, the OPF package document) may start
/// with a byte order mark; UTF-8, UTF-16 BE and UTF-16 LE BOMs are recognised.
/// Without a BOM the data must be UTF-8.
///
/// Page content is decoded with [std::str::from_utf8] instead, since page byte
/// ranges never start at the beginning of a file.
pub trait DecodeBytes {
    fn decode(&self) -> Result<String, PagerError>;
}

impl DecodeBytes for [u8] {
    fn decode(&self) -> Result<String, PagerError> {
        if self.is_empty() {
            return Err(PagerError::EmptyDataError);
        }

        match self {
            [0xEF, 0xBB, 0xBF, rest @ ..] => {
                String::from_utf8(rest.to_vec()).map_err(PagerError::from)
            }
            [0xFE, 0xFF, rest @ ..] => {
                let units = rest
                    .chunks_exact(2)
                    .map(|b| u16::from_be_bytes([b[0], b[1]]))
                    .collect::<Vec<u16>>();
                String::from_utf16(&units).map_err(PagerError::from)
            }
            [0xFF, 0xFE, rest @ ..] => {
                let units = rest
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect::<Vec<u16>>();
                String::from_utf16(&units).map_err(PagerError::from)
            }
            _ => String::from_utf8(self.to_vec()).map_err(PagerError::from),
        }
    }
}

impl DecodeBytes for Vec<u8> {
    fn decode(&self) -> Result<String, PagerError> {
        self.as_slice().decode()
    }
}

/// Provides functionality for normalizing whitespace characters
///
/// Runs of whitespace (spaces, tabs, newlines, non-breaking spaces) collapse
/// into a single space, leading and trailing whitespace is removed.
pub trait NormalizeWhitespace {
    fn normalize_whitespace(&self) -> String;
}

impl NormalizeWhitespace for str {
    fn normalize_whitespace(&self) -> String {
        self.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl NormalizeWhitespace for String {
    fn normalize_whitespace(&self) -> String {
        self.as_str().normalize_whitespace()
    }
}

/// Represents an element node in an XML document
#[derive(Debug)]
pub struct XmlElement {
    /// The local name of the element (excluding namespace prefix)
    pub name: String,

    /// The namespace prefix of the element
    pub prefix: Option<String>,

    /// The attributes of the element, keyed by their qualified name
    pub attributes: HashMap<String, String>,

    /// The text content directly inside the element
    pub text: Option<String>,

    /// The children of the element
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(start: &BytesStart) -> Self {
        let local_name = start.local_name();
        let name = start.name();

        let attributes = start
            .attributes()
            .flatten()
            .filter(|attr| !attr.key.as_ref().starts_with(b"xmlns"))
            .map(|attr| {
                (
                    String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                    String::from_utf8_lossy(&attr.value).to_string(),
                )
            })
            .collect();

        Self {
            name: String::from_utf8_lossy(local_name.as_ref()).to_string(),
            prefix: name
                .prefix()
                .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).to_string()),
            attributes,
            text: None,
            children: Vec::new(),
        }
    }

    /// Get the full tag name of the element
    ///
    /// If the element has a namespace prefix, return "prefix:name" format;
    /// otherwise, return only the element name.
    pub fn tag_name(&self) -> String {
        if let Some(prefix) = &self.prefix {
            format!("{}:{}", prefix, self.name)
        } else {
            self.name.clone()
        }
    }

    /// Gets the text content of the element and all its child elements
    pub fn text(&self) -> String {
        let mut result = String::new();

        if let Some(text_value) = &self.text {
            result.push_str(text_value);
        }

        for child in &self.children {
            result.push_str(&child.text());
        }

        result.trim().to_string()
    }

    /// Returns the value of the specified attribute
    pub fn get_attr(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    /// Returns the value of a required attribute
    pub fn require_attr(&self, name: &str) -> Result<String, PagerError> {
        self.get_attr(name)
            .ok_or_else(|| PagerError::MissingRequiredAttribute {
                tag: self.tag_name(),
                attribute: name.to_string(),
            })
    }

    /// Find the first element with the specified name, depth first
    pub fn find_element_by_name(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }

        self.children
            .iter()
            .find_map(|child| child.find_element_by_name(name))
    }

    /// Find all elements with the specified name among the child elements of the current element
    pub fn find_children_by_name(&self, name: &str) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// XML parser used to build an element tree of container metadata files
pub struct XmlReader {}

impl XmlReader {
    /// Parses an XML string and builds the root element
    ///
    /// ## Return
    /// - `Ok(XmlElement)`: The root element of the XML element tree
    /// - `Err(PagerError)`: The document is empty or not well-formed
    pub fn parse(content: &str) -> Result<XmlElement, PagerError> {
        if content.is_empty() {
            return Err(PagerError::EmptyDataError);
        }

        let mut reader = Reader::from_str(content);

        let mut stack = Vec::<XmlElement>::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Eof => break,

                Event::Start(e) => stack.push(XmlElement::from_start(&e)),

                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => root = Some(element),
                        }
                    }
                }

                Event::Empty(e) => {
                    let element = XmlElement::from_start(&e);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }

                Event::Text(e) => {
                    if let Some(element) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e.as_ref());
                        if !text.trim().is_empty() {
                            element
                                .text
                                .get_or_insert_with(String::new)
                                .push_str(&text);
                        }
                    }
                }

                Event::GeneralRef(e) => {
                    if let Some(element) = stack.last_mut() {
                        let entity = String::from_utf8_lossy(e.as_ref());
                        if let Some(resolved) = resolve_entity(&entity) {
                            element
                                .text
                                .get_or_insert_with(String::new)
                                .push(resolved);
                        }
                    }
                }

                // Comment, PI, Declaration, Doctype, CData
                _ => continue,
            }
        }

        root.ok_or(PagerError::EmptyDataError)
    }
}

/// Resolves the name of an entity or character reference to its character
///
/// `entity` is the text between `&` and `;`. Character references (`#233`,
/// `#xE9`), the XML predefined entities and the HTML entities common in
/// e-books are supported; any other name yields `None`.
pub fn resolve_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }

    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }

    let resolved = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "shy" => '\u{ad}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "sect" => '§',
        "para" => '¶',
        "middot" => '·',
        "laquo" => '«',
        "raquo" => '»',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201a}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bdquo" => '\u{201e}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "dagger" => '\u{2020}',
        "Dagger" => '\u{2021}',
        "times" => '×',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "eacute" => 'é',
        "egrave" => 'è',
        "agrave" => 'à',
        "ccedil" => 'ç',
        _ => return None,
    };

    Some(resolved)
}
