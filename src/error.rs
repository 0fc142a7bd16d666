//! Error Type Definition Module
//!
//! This module defines the error types that may be encountered while opening
//! a book, indexing its pages and rendering them. All errors are uniformly
//! wrapped in the [PagerError] enumeration for convenient error handling by the caller.
//!
//! Some conditions are not errors: a page number that has no entry in the page
//! index yields an empty page, and malformed markup inside a page yields the
//! text parsed before the failure.

use thiserror::Error;

/// Types of errors that can occur while loading and paging a book
#[derive(Debug, Error)]
pub enum PagerError {
    /// ZIP archive related errors
    ///
    /// Errors occur when processing the ZIP structure of EPUB files,
    /// such as file corruption, unreadability, etc.
    #[error("Archive error: {source}")]
    ArchiveError { source: zip::result::ZipError },

    /// Page decoding error
    ///
    /// The byte range owned by a page is not valid UTF-8. Only the page
    /// in question is affected; the rest of the book stays readable.
    #[error("Decode error: Page {page} is not valid UTF-8: {source}")]
    DecodeFailure {
        page: i64,
        source: std::str::Utf8Error,
    },

    /// Data Decoding Error - Null data
    ///
    /// This error occurs when trying to decode an empty stream.
    #[error("Decode error: The data is empty.")]
    EmptyDataError,

    #[error("IO error: {source}")]
    IOError { source: std::io::Error },

    /// Missing required attribute error
    ///
    /// Triggered when an element of the container or package document lacks
    /// an attribute needed to locate the book's documents.
    #[error(
        "Missing required attribute: The \"{attribute}\" attribute is a must attribute for the \"{tag}\" element."
    )]
    MissingRequiredAttribute { tag: String, attribute: String },

    /// Navigation without a current page
    ///
    /// `next_page` and `prev_page` move relative to the current page, which
    /// only exists after a successful call to `page`.
    #[error("No current page: Call `page` before navigating relative to the current page.")]
    NoCurrentPage,

    /// Non-canonical file structure error
    ///
    /// This error is triggered when an XML element required to find the
    /// book's documents is missing.
    #[error("Non-canonical file: The \"{tag}\" elements was not found.")]
    NonCanonicalFile { tag: String },

    /// Relative link leak error
    ///
    /// This error occurs when a relative path link is outside the scope
    /// of an EPUB container.
    #[error("Relative link leakage: Path \"{path}\" is out of container range.")]
    RealtiveLinkLeakage { path: String },

    /// Unable to find the resource error
    ///
    /// This error occurs when the manifest declares a document
    /// that does not exist in the EPUB container.
    #[error("Resource not found: Unable to find resource from \"{resource}\".")]
    ResourceNotFound { resource: String },

    /// Unsupported book format error
    ///
    /// The file extension is neither an EPUB container nor flat text.
    #[error("Unsupported format: Unable to read file of type \"{extension}\".")]
    UnsupportedFormat { extension: String },

    /// Unusable compression method error
    ///
    /// This error occurs when an EPUB file uses an unsupported compression method.
    #[error(
        "Unusable compression method: The \"{file}\" file uses the unsupported \"{method}\" compression method."
    )]
    UnusableCompressionMethod { file: String, method: String },

    /// UTF-8 decoding error
    ///
    /// This error occurs when a flat text book or a container metadata file
    /// is not valid UTF-8.
    #[error("Decode error: {source}")]
    Utf8DecodeError { source: std::string::FromUtf8Error },

    /// UTF-16 decoding error
    #[error("Decode error: {source}")]
    Utf16DecodeError { source: std::string::FromUtf16Error },

    /// QuickXml error
    ///
    /// This error occurs when parsing the container or package document.
    /// Errors inside page content never surface here.
    #[error("QuickXml error: {source}")]
    QuickXmlError { source: quick_xml::Error },
}

impl From<zip::result::ZipError> for PagerError {
    fn from(value: zip::result::ZipError) -> Self {
        PagerError::ArchiveError { source: value }
    }
}

impl From<quick_xml::Error> for PagerError {
    fn from(value: quick_xml::Error) -> Self {
        PagerError::QuickXmlError { source: value }
    }
}

impl From<std::io::Error> for PagerError {
    fn from(value: std::io::Error) -> Self {
        PagerError::IOError { source: value }
    }
}

impl From<std::string::FromUtf8Error> for PagerError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        PagerError::Utf8DecodeError { source: value }
    }
}

impl From<std::string::FromUtf16Error> for PagerError {
    fn from(value: std::string::FromUtf16Error) -> Self {
        PagerError::Utf16DecodeError { source: value }
    }
}

#[cfg(test)]
impl PartialEq for PagerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::DecodeFailure { page: l_page, .. },
                Self::DecodeFailure { page: r_page, .. },
            ) => l_page == r_page,
            (
                Self::MissingRequiredAttribute {
                    tag: l_tag,
                    attribute: l_attribute,
                },
                Self::MissingRequiredAttribute {
                    tag: r_tag,
                    attribute: r_attribute,
                },
            ) => l_tag == r_tag && l_attribute == r_attribute,
            (Self::NonCanonicalFile { tag: l_tag }, Self::NonCanonicalFile { tag: r_tag }) => {
                l_tag == r_tag
            }
            (
                Self::RealtiveLinkLeakage { path: l_path },
                Self::RealtiveLinkLeakage { path: r_path },
            ) => l_path == r_path,
            (
                Self::ResourceNotFound {
                    resource: l_resource,
                },
                Self::ResourceNotFound {
                    resource: r_resource,
                },
            ) => l_resource == r_resource,
            (
                Self::UnsupportedFormat {
                    extension: l_extension,
                },
                Self::UnsupportedFormat {
                    extension: r_extension,
                },
            ) => l_extension == r_extension,
            (
                Self::UnusableCompressionMethod {
                    file: l_file,
                    method: l_method,
                },
                Self::UnusableCompressionMethod {
                    file: r_file,
                    method: r_method,
                },
            ) => l_file == r_file && l_method == r_method,
            (
                Self::Utf8DecodeError { source: l_source },
                Self::Utf8DecodeError { source: r_source },
            ) => l_source == r_source,

            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}
