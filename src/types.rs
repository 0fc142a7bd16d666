use std::ops::Range;

/// A content document taken from a book container
///
/// The `Document` structure holds the raw, undecoded bytes of one marked-up
/// document of a publication together with the identifiers it is known by
/// inside its container. Documents are produced by a [DocumentSource] and are
/// never modified afterwards; page entries refer to them by position.
///
/// [DocumentSource]: crate::epub::DocumentSource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The manifest id of the document
    pub id: String,

    /// The path to the document inside the container
    pub path: String,

    /// The raw bytes of the document
    pub content: Vec<u8>,
}

impl Document {
    /// Creates a new document
    pub fn new(id: &str, path: &str, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.to_string(),
            path: path.to_string(),
            content: content.into(),
        }
    }

    /// Returns the length of the raw content in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A pagebreak marker located inside a document
///
/// Markers are self-closing `<span .../>` tags whose text contains `pagebreak`.
/// A marker may carry an explicit page number, either as a numeric `id`
/// attribute or as a numeric `title` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// The byte range of the marker tag itself
    pub span: Range<usize>,

    /// The numeric value of the `id` attribute
    ///
    /// `None` when the tag has no numeric `id` or more than one of them.
    pub id: Option<i64>,

    /// The numeric value of the `title` attribute
    ///
    /// `None` when the tag has no numeric `title` or more than one of them.
    pub label: Option<i64>,
}

/// One page of the page index
///
/// A page owns the byte range `start..end` of one document. For pages created
/// from markers, `start` is the end of the marker tag and `end` is the start of
/// the next marker in the same document, or the end of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// The page number, the key of the entry in the page index
    pub page: i64,

    /// The position of the owning document in the book's document list
    pub document: usize,

    /// The first byte of the page
    pub start: usize,

    /// The byte after the last byte of the page
    pub end: usize,
}

impl PageEntry {
    /// Returns the byte range owned by this page
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Strategy used to cut a structured book into pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PagingStrategy {
    /// Pages are delimited by pagebreak markers
    ///
    /// Documents without any marker do not contribute pages.
    #[default]
    Markers,

    /// Every document is one page
    ///
    /// The page number is the 0-based position of the document in manifest order.
    Documents,

    /// Use [PagingStrategy::Markers] if the book has at least one
    /// pagebreak marker, [PagingStrategy::Documents] otherwise
    Auto,
}

/// Default number of characters in a page of a flat text book
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Options applied when a book is loaded
///
/// ```rust
/// # use epub_pager::types::{PagingStrategy, ReaderOptions};
/// let mut options = ReaderOptions::default();
/// options.with_page_size(512).with_strategy(PagingStrategy::Auto);
///
/// assert_eq!(options.page_size, 512);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Number of characters in a page of a flat text book
    ///
    /// Pages are cut at fixed character offsets, not at word boundaries.
    pub page_size: usize,

    /// Strategy used to cut structured books into pages
    pub strategy: PagingStrategy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            strategy: PagingStrategy::default(),
        }
    }
}

impl ReaderOptions {
    /// Sets the page size of flat text books
    ///
    /// A page size of zero is raised to one character.
    pub fn with_page_size(&mut self, page_size: usize) -> &mut Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the paging strategy of structured books
    pub fn with_strategy(&mut self, strategy: PagingStrategy) -> &mut Self {
        self.strategy = strategy;
        self
    }
}

/// Represents a resource item declared in the EPUB manifest
#[derive(Debug, Clone)]
pub struct ManifestItem {
    /// The manifest id of the resource
    pub id: String,

    /// The path to the resource file within the EPUB container
    ///
    /// The path is normalized to be relative to the root of the container.
    pub path: String,

    /// The media type of the resource
    pub mime: String,

    /// Optional space-separated properties of the resource
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Checks whether the resource is a content document
    ///
    /// Content documents are XHTML or HTML resources, except the EPUB 3
    /// navigation document.
    pub fn is_content_document(&self) -> bool {
        let is_markup = matches!(self.mime.as_str(), "application/xhtml+xml" | "text/html");
        let is_nav = self
            .properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == "nav"));

        is_markup && !is_nav
    }
}

/// Represents an item in the EPUB spine
#[derive(Debug, Clone)]
pub struct SpineItem {
    /// The ID reference to a manifest item
    pub idref: String,

    /// Indicates whether this item is part of the linear reading order
    pub linear: bool,
}
