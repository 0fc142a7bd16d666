//! Pagebreak marker scanning
//!
//! Locates pagebreak markers in the raw bytes of a document. A marker is a
//! self-closing `<span .../>` tag whose text contains `pagebreak`, for example
//! `<span epub:type="pagebreak" id="12" title="12"/>`. The scanner only finds and
//! parses tags; page numbers are assigned by [crate::index].

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::types::Marker;

/// Matches any self-closing span tag
static SPAN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)<span[^>]+/>").expect("valid span pattern"));

/// Matches a numeric `id` attribute
static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?-u)id=["'](\d+)["']"#).expect("valid id pattern"));

/// Matches a numeric `title` attribute
static TITLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?-u)title=["'](\d+)["']"#).expect("valid title pattern"));

const PAGEBREAK: &[u8] = b"pagebreak";

/// Scans the raw content of a document for pagebreak markers
///
/// Markers are returned in byte offset order. Span tags that do not contain
/// `pagebreak` are not markers and are skipped.
///
/// ## Parameters
/// - `content`: The raw bytes of a document; they need not be valid UTF-8
pub fn scan_markers(content: &[u8]) -> Vec<Marker> {
    SPAN_TAG_RE
        .find_iter(content)
        .filter(|tag| contains(tag.as_bytes(), PAGEBREAK))
        .map(|tag| Marker {
            span: tag.range(),
            id: unique_number(&ID_ATTR_RE, tag.as_bytes()),
            label: unique_number(&TITLE_ATTR_RE, tag.as_bytes()),
        })
        .collect()
}

/// Returns the number captured by `pattern` if it matches `tag` exactly once
///
/// No match, several matches, or a number too large for a page number all
/// yield `None`.
fn unique_number(pattern: &Regex, tag: &[u8]) -> Option<i64> {
    let mut captures = pattern.captures_iter(tag);
    let digits = captures.next()?.get(1)?;
    if captures.next().is_some() {
        return None;
    }

    std::str::from_utf8(digits.as_bytes()).ok()?.parse().ok()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use crate::scanner::scan_markers;

    #[test]
    fn test_scan_explicit_id() {
        let content = br#"<p>a</p><span id="42" class="pagebreak"/><p>b</p>"#;
        let markers = scan_markers(content);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, Some(42));
        assert_eq!(markers[0].label, None);
        assert_eq!(&content[markers[0].span.clone()], br#"<span id="42" class="pagebreak"/>"#);
    }

    /// Attribute order does not matter and single quotes are accepted
    #[test]
    fn test_scan_title_single_quotes() {
        let content = b"<span title='7' epub:type='pagebreak' />";
        let markers = scan_markers(content);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, None);
        assert_eq!(markers[0].label, Some(7));
        assert_eq!(markers[0].span, 0..content.len());
    }

    #[test]
    fn test_scan_skips_other_spans() {
        let content = br#"<span class="note"/>x<span class="pagebreak"/>y<span>z</span>"#;
        let markers = scan_markers(content);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].span.start, 21);
        assert_eq!(markers[0].id, None);
        assert_eq!(markers[0].label, None);
    }

    /// Two numeric `id=` matches make the id ambiguous, so it is dropped
    #[test]
    fn test_scan_ambiguous_id() {
        let content = br#"<span id="3" data-id="9" title="5" class="pagebreak"/>"#;
        let markers = scan_markers(content);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, None);
        assert_eq!(markers[0].label, Some(5));
    }

    /// Non-numeric ids such as `page12` are not page numbers
    #[test]
    fn test_scan_non_numeric_id() {
        let content = br#"<span id="page12" class="pagebreak"/>"#;
        let markers = scan_markers(content);

        assert_eq!(markers[0].id, None);
    }

    #[test]
    fn test_scan_overflowing_number() {
        let content = br#"<span id="99999999999999999999999" class="pagebreak"/>"#;
        let markers = scan_markers(content);

        assert_eq!(markers[0].id, None);
    }

    #[test]
    fn test_scan_order_and_invalid_utf8() {
        let mut content = br#"<span id="1" class="pagebreak"/>"#.to_vec();
        content.extend_from_slice(&[0xFF, 0xFE, b'a']);
        content.extend_from_slice(br#"<span id="2" class="pagebreak"/>"#);

        let markers = scan_markers(&content);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].id, Some(1));
        assert_eq!(markers[1].id, Some(2));
        assert!(markers[0].span.end <= markers[1].span.start);
    }

    #[test]
    fn test_scan_empty() {
        assert!(scan_markers(b"").is_empty());
        assert!(scan_markers(b"<html><body>No markers</body></html>").is_empty());
    }
}
