//! Books, page navigation and reading sessions
//!
//! A [Book] is either a flat text or a structured book with a page index.
//! A [Navigator] pages through one book and remembers the current page.
//! A [Session] holds the book currently open, if any.

use std::{collections::HashMap, fs, path::Path};

use log::{debug, info};

use crate::{
    epub::{DocumentSource, EpubContainer},
    error::PagerError,
    index::PageIndex,
    render::render_fragment,
    types::{Document, PageEntry, PagingStrategy, ReaderOptions},
};

/// A book split into documents and indexed by page number
///
/// The documents and their page index are fixed once the book is built, so
/// every page entry always points into an existing document.
#[derive(Debug, Clone)]
pub struct StructuredBook {
    title: String,
    documents: Vec<Document>,
    index: PageIndex,
    strategy: PagingStrategy,
}

impl StructuredBook {
    /// Indexes the documents of a book
    ///
    /// With [PagingStrategy::Auto] the markers are tried first and the book
    /// falls back to one page per document if it has none.
    pub fn new(title: String, documents: Vec<Document>, strategy: PagingStrategy) -> Self {
        let (index, strategy) = match strategy {
            PagingStrategy::Markers => (PageIndex::from_markers(&documents), strategy),
            PagingStrategy::Documents => (PageIndex::from_documents(&documents), strategy),
            PagingStrategy::Auto => {
                let index = PageIndex::from_markers(&documents);
                if index.is_empty() {
                    debug!("No pagebreak markers in \"{}\", using one page per document", title);
                    (PageIndex::from_documents(&documents), PagingStrategy::Documents)
                } else {
                    (index, PagingStrategy::Markers)
                }
            }
        };

        Self {
            title,
            documents,
            index,
            strategy,
        }
    }

    /// Reads the documents of `source` and indexes them
    pub fn from_source<S: DocumentSource>(
        mut source: S,
        fallback_title: &str,
        strategy: PagingStrategy,
    ) -> Result<Self, PagerError> {
        let documents = source.read_documents()?;
        let title = source
            .title()
            .unwrap_or_else(|| fallback_title.to_string());

        Ok(Self::new(title, documents, strategy))
    }

    /// Returns the title of the book
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the content documents, in book order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Returns the page index over the documents
    pub fn index(&self) -> &PageIndex {
        &self.index
    }

    /// Returns the strategy the index was built with, never [PagingStrategy::Auto]
    pub fn strategy(&self) -> PagingStrategy {
        self.strategy
    }

    /// Renders the text of one page entry
    fn render(&self, entry: &PageEntry) -> Result<String, PagerError> {
        let document = &self.documents[entry.document];
        render_fragment(&document.content[entry.range()]).map_err(|source| {
            PagerError::DecodeFailure {
                page: entry.page,
                source,
            }
        })
    }
}

/// A loaded book
#[derive(Debug, Clone)]
pub enum Book {
    /// A flat UTF-8 text, paged in fixed-size character chunks
    FlatText { title: String, text: String },

    /// A book made of marked-up documents, paged through a page index
    Structured(StructuredBook),
}

impl Book {
    /// Opens a book from a file path
    ///
    /// The file type is taken from the extension: `.epub` files are EPUB
    /// containers, `.txt` files and files without extension are flat text.
    /// Any other extension fails with [PagerError::UnsupportedFormat].
    ///
    /// All documents are read and indexed before this function returns; the
    /// file is closed by then.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<Self, PagerError> {
        let path = path.as_ref();
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_string());
        let kind = extension.as_ref().map(|extension| extension.to_ascii_lowercase());

        match kind.as_deref() {
            Some("epub") => {
                let container = EpubContainer::new(path)?;
                let book = StructuredBook::from_source(container, &title, options.strategy)?;
                Ok(Book::Structured(book))
            }

            None | Some("txt") => {
                let bytes = fs::read(path)?;
                let mut text = String::from_utf8(bytes)?;
                if text.starts_with('\u{feff}') {
                    text.remove(0);
                }
                Ok(Book::FlatText { title, text })
            }

            Some(_) => Err(PagerError::UnsupportedFormat {
                extension: extension.unwrap_or_default(),
            }),
        }
    }

    /// Returns the title of the book
    pub fn title(&self) -> &str {
        match self {
            Book::FlatText { title, .. } => title,
            Book::Structured(book) => &book.title,
        }
    }
}

/// Page-by-page access to a book
///
/// ```rust, no_run
/// # use epub_pager::{reader::Navigator, types::ReaderOptions};
/// # fn main() -> Result<(), epub_pager::error::PagerError> {
/// let mut navigator = Navigator::load("path/to/book.epub", &ReaderOptions::default())?;
///
/// let _first = navigator.page(0)?;
/// let _second = navigator.next_page()?;
/// println!("Now on page {:?}", navigator.current_page());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Navigator {
    book: Book,
    page_size: usize,
    current: Option<i64>,
    rendered: HashMap<i64, String>,
}

impl Navigator {
    /// Creates a navigator over a loaded book
    ///
    /// No page is current until the first successful call to [Navigator::page].
    pub fn new(book: Book, options: &ReaderOptions) -> Self {
        Self {
            book,
            page_size: options.page_size.max(1),
            current: None,
            rendered: HashMap::new(),
        }
    }

    /// Opens a book from a file path and creates a navigator over it
    pub fn load<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<Self, PagerError> {
        let book = Book::open(&path, options)?;

        match &book {
            Book::FlatText { title, text } => info!(
                "Loaded flat text \"{}\" ({} characters)",
                title,
                text.chars().count()
            ),
            Book::Structured(structured) => info!(
                "Loaded \"{}\": {} documents, {} pages ({:?})",
                structured.title,
                structured.documents.len(),
                structured.index.len(),
                structured.strategy
            ),
        }

        Ok(Self::new(book, options))
    }

    /// Returns the text of page `page`
    ///
    /// Flat text: the characters `page * page_size .. (page + 1) * page_size`,
    /// cut without regard to word boundaries. Pages past the end are empty.
    ///
    /// Structured book: a page number without an index entry yields an empty
    /// page and leaves the current page unchanged. A page whose text is blank
    /// is skipped in favour of the following page number, as long as the
    /// following number has an entry; the current page becomes the page
    /// actually returned.
    ///
    /// ## Return
    /// - `Ok(String)`: The text of the page, possibly empty
    /// - `Err(PagerError::DecodeFailure)`: The page is not valid UTF-8
    pub fn page(&mut self, page: i64) -> Result<String, PagerError> {
        let Self {
            book,
            page_size,
            current,
            rendered,
        } = self;

        match book {
            Book::FlatText { text, .. } => {
                if page < 0 {
                    debug!("Page {} is before the start of the text", page);
                    return Ok(String::new());
                }

                let start = (page as usize).saturating_mul(*page_size);
                let chunk = text.chars().skip(start).take(*page_size).collect();
                *current = Some(page);
                Ok(chunk)
            }

            Book::Structured(book) => {
                let mut number = page;
                loop {
                    let Some(entry) = book.index.get(number) else {
                        debug!("Page {} is not in the page index", number);
                        return Ok(String::new());
                    };

                    let text = match rendered.get(&number) {
                        Some(text) => text.clone(),
                        None => {
                            let text = book.render(entry)?;
                            rendered.insert(number, text.clone());
                            text
                        }
                    };

                    if !text.trim().is_empty() {
                        *current = Some(number);
                        return Ok(text);
                    }

                    debug!("Page {} is blank, skipping", number);
                    number = match number.checked_add(1) {
                        Some(next) => next,
                        None => return Ok(String::new()),
                    };
                }
            }
        }
    }

    /// Returns the page after the current page
    pub fn next_page(&mut self) -> Result<String, PagerError> {
        let current = self.current.ok_or(PagerError::NoCurrentPage)?;
        self.page(current.saturating_add(1))
    }

    /// Returns the page before the current page
    pub fn prev_page(&mut self) -> Result<String, PagerError> {
        let current = self.current.ok_or(PagerError::NoCurrentPage)?;
        self.page(current.saturating_sub(1))
    }

    /// Returns the current page number
    ///
    /// `None` until a call to [Navigator::page] has succeeded.
    pub fn current_page(&self) -> Option<i64> {
        self.current
    }

    /// Returns the page numbers of a structured book in ascending order
    ///
    /// Flat text books have no page index, so the list is empty.
    pub fn page_numbers(&self) -> Vec<i64> {
        match &self.book {
            Book::FlatText { .. } => vec![],
            Book::Structured(book) => book.index.page_numbers().collect(),
        }
    }

    pub fn title(&self) -> &str {
        self.book.title()
    }

    pub fn book(&self) -> &Book {
        &self.book
    }
}

/// The reading session of a single reader
///
/// A session holds at most one open book. Opening a book replaces the previous
/// one only when the new book loads successfully.
#[derive(Debug, Default)]
pub struct Session {
    options: ReaderOptions,
    navigator: Option<Navigator>,
}

impl Session {
    pub fn new(options: ReaderOptions) -> Self {
        Self {
            options,
            navigator: None,
        }
    }

    /// Opens a book and makes it the current book of the session
    ///
    /// On error the previously open book, if any, stays open.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Navigator, PagerError> {
        let navigator = Navigator::load(path, &self.options)?;
        Ok(self.navigator.insert(navigator))
    }

    /// Closes the current book
    pub fn unload(&mut self) {
        self.navigator = None;
    }

    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    pub fn navigator_mut(&mut self) -> Option<&mut Navigator> {
        self.navigator.as_mut()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }
}
