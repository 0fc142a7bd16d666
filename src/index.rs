//! Page index construction
//!
//! The page index maps page numbers to byte ranges of the book's documents.
//! It is built once when a book is loaded and never changes afterwards.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    scanner::scan_markers,
    types::{Document, PageEntry},
};

/// Mapping from page number to the byte range of the page
///
/// Page numbers are not contiguous: a marker with an explicit number may jump
/// over numbers that never receive an entry. Lookups are by exact page number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndex {
    entries: BTreeMap<i64, PageEntry>,
}

impl PageIndex {
    /// Builds the index from the pagebreak markers of `documents`
    ///
    /// A running page counter starts at 1 and is carried across documents in
    /// order. For every marker the counter is set to the marker's numeric `id`,
    /// or failing that to its numeric `title`, or otherwise incremented by one.
    /// The page then owns the bytes from the end of the marker tag to the start
    /// of the next marker in the same document, or to the end of the document.
    ///
    /// When several markers yield the same page number, the last one wins.
    /// Documents without markers contribute no pages.
    pub fn from_markers(documents: &[Document]) -> Self {
        let mut entries = BTreeMap::new();
        let mut counter: i64 = 1;

        for (position, document) in documents.iter().enumerate() {
            let markers = scan_markers(&document.content);
            if markers.is_empty() {
                debug!("Document \"{}\" has no pagebreak markers", document.path);
                continue;
            }

            for (index, marker) in markers.iter().enumerate() {
                counter = match (marker.id, marker.label) {
                    (Some(id), _) => id,
                    (None, Some(label)) => label,
                    (None, None) => counter.saturating_add(1),
                };

                let end = markers
                    .get(index + 1)
                    .map(|next| next.span.start)
                    .unwrap_or(document.len());

                let entry = PageEntry {
                    page: counter,
                    document: position,
                    start: marker.span.end,
                    end,
                };

                if let Some(previous) = entries.insert(counter, entry) {
                    debug!(
                        "Page {} redefined in \"{}\", replacing the entry from document #{}",
                        counter, document.path, previous.document
                    );
                }
            }
        }

        Self { entries }
    }

    /// Builds an index with one page per document
    ///
    /// The page number of a document is its 0-based position in `documents`,
    /// and the page owns the whole document.
    pub fn from_documents(documents: &[Document]) -> Self {
        let entries = documents
            .iter()
            .enumerate()
            .map(|(position, document)| {
                let page = position as i64;
                let entry = PageEntry {
                    page,
                    document: position,
                    start: 0,
                    end: document.len(),
                };
                (page, entry)
            })
            .collect();

        Self { entries }
    }

    /// Returns the entry of a page number
    pub fn get(&self, page: i64) -> Option<&PageEntry> {
        self.entries.get(&page)
    }

    pub fn contains(&self, page: i64) -> bool {
        self.entries.contains_key(&page)
    }

    /// Returns all page numbers in ascending order
    pub fn page_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    /// Returns all entries in ascending page number order
    pub fn entries(&self) -> impl Iterator<Item = &PageEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
