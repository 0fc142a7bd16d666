//! Epub pager
//!
//! A Rust library for reading e-books page by page as plain text.
//!
//! EPUB books are paged along the pagebreak markers embedded in their content
//! documents, so page numbers follow the printed edition the book was made
//! from. Flat text books are cut into pages of a fixed number of characters.
//! Every page is rendered to plain text on demand.
//!
//! ## Features
//!
//! - Read the content documents of EPUB containers in manifest order.
//! - Build a page index from `<span ... pagebreak .../>` markers, honouring explicit page numbers.
//! - Fall back to one page per document for books without markers.
//! - Render page fragments to plain text, tolerating markup cut in the middle of an element.
//!
//! ## Quick Start
//!
//! ```rust, no_run
//! # use epub_pager::{Session, types::ReaderOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(ReaderOptions::default());
//!
//! // Open a book, replacing the previous one only on success
//! let navigator = session.load("path/to/book.epub")?;
//! println!("Title: {}", navigator.title());
//! println!("Pages: {:?}", navigator.page_numbers());
//!
//! // Read pages
//! let _page = navigator.page(12)?;
//! let _next = navigator.next_page()?;
//! let _prev = navigator.prev_page()?;
//!
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through the `log` facade; install any logger to see how books
//! are indexed and which pages are skipped.

pub(crate) mod utils;

pub mod epub;
pub mod error;
pub mod index;
pub mod reader;
pub mod render;
pub mod scanner;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use reader::{Book, Navigator, Session};
pub use utils::DecodeBytes;
