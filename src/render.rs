//! Fragment rendering
//!
//! Converts the markup of one page to plain text. A page is usually a slice
//! cut out of the middle of an XHTML document, so it may close elements it
//! never opened and leave others open; both are normal here. Anything the
//! parser cannot make sense of ends the page early: the text read up to that
//! point is returned.

use log::debug;
use quick_xml::{Reader, events::Event, name::LocalName};

use crate::utils::{NormalizeWhitespace, resolve_entity};

/// Elements whose boundaries start a new line
const BLOCK_ELEMENTS: &[&[u8]] = &[
    b"address",
    b"article",
    b"aside",
    b"blockquote",
    b"body",
    b"br",
    b"caption",
    b"dd",
    b"div",
    b"dl",
    b"dt",
    b"figcaption",
    b"figure",
    b"footer",
    b"h1",
    b"h2",
    b"h3",
    b"h4",
    b"h5",
    b"h6",
    b"header",
    b"hr",
    b"li",
    b"main",
    b"nav",
    b"ol",
    b"p",
    b"section",
    b"table",
    b"td",
    b"th",
    b"tr",
    b"ul",
];

/// Elements whose line breaks are kept
const PREFORMATTED_ELEMENTS: &[&[u8]] = &[b"pre"];

/// Elements whose content is never part of the page text
const HIDDEN_ELEMENTS: &[&[u8]] = &[b"head", b"script", b"style"];

fn is_one_of(name: LocalName, list: &[&[u8]]) -> bool {
    list.iter()
        .any(|candidate| name.as_ref().eq_ignore_ascii_case(candidate))
}

/// Decodes a page fragment and renders it to plain text
///
/// ## Return
/// - `Ok(String)`: The text of the fragment, one line per block
/// - `Err(Utf8Error)`: The fragment is not valid UTF-8
pub fn render_fragment(fragment: &[u8]) -> Result<String, std::str::Utf8Error> {
    let markup = std::str::from_utf8(fragment)?;
    Ok(markup_to_text(markup))
}

/// Renders markup to plain text
///
/// Block element boundaries become line breaks, other tags are dropped, entity
/// and character references are resolved and whitespace inside a line collapses
/// to single spaces. Inside `<pre>` every source line stays a line of its own.
/// Empty lines are not kept.
pub fn markup_to_text(markup: &str) -> String {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut text = TextCollector::default();

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,

            Ok(Event::Start(e)) => {
                if is_one_of(e.local_name(), HIDDEN_ELEMENTS) {
                    text.hidden_depth += 1;
                } else if is_one_of(e.local_name(), PREFORMATTED_ELEMENTS) {
                    text.break_line();
                    text.pre_depth += 1;
                } else if is_one_of(e.local_name(), BLOCK_ELEMENTS) {
                    text.break_line();
                }
            }

            Ok(Event::End(e)) => {
                if is_one_of(e.local_name(), HIDDEN_ELEMENTS) {
                    text.hidden_depth = text.hidden_depth.saturating_sub(1);
                } else if is_one_of(e.local_name(), PREFORMATTED_ELEMENTS) {
                    text.break_line();
                    text.pre_depth = text.pre_depth.saturating_sub(1);
                } else if is_one_of(e.local_name(), BLOCK_ELEMENTS) {
                    text.break_line();
                }
            }

            Ok(Event::Empty(e)) => {
                if is_one_of(e.local_name(), BLOCK_ELEMENTS) {
                    text.break_line();
                }
            }

            Ok(Event::Text(e)) => text.push_str(&String::from_utf8_lossy(e.as_ref())),

            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(e.as_ref())),

            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => text.push_char(resolved),
                    None => debug!("Dropping unknown entity &{};", entity),
                }
            }

            Err(err) => {
                debug!(
                    "Malformed markup at byte {}, keeping the text read so far: {}",
                    reader.buffer_position(),
                    err
                );
                break;
            }

            // Comment, PI, Declaration, Doctype
            _ => continue,
        }
    }

    text.finish()
}

#[derive(Default)]
struct TextCollector {
    lines: Vec<String>,
    line: String,
    hidden_depth: usize,
    pre_depth: usize,
}

impl TextCollector {
    fn push_str(&mut self, text: &str) {
        if self.hidden_depth > 0 {
            return;
        }

        if self.pre_depth == 0 {
            self.line.push_str(text);
            return;
        }

        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.line.push_str(first);
        }
        for line in lines {
            self.break_line();
            self.line.push_str(line);
        }
    }

    fn push_char(&mut self, c: char) {
        if self.hidden_depth == 0 {
            self.line.push(c);
        }
    }

    fn break_line(&mut self) {
        let line = self.line.normalize_whitespace();
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.line.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use crate::render::{markup_to_text, render_fragment};

    #[test]
    fn test_plain_text() {
        assert_eq!(markup_to_text("AAA"), "AAA");
        assert_eq!(markup_to_text(""), "");
    }

    #[test]
    fn test_blocks_become_lines() {
        let markup = "<h1>Chapter 1</h1><p>It was a <em>dark</em> night.</p><p>Stormy,<br/>too.</p>";
        assert_eq!(
            markup_to_text(markup),
            "Chapter 1\nIt was a dark night.\nStormy,\ntoo."
        );
    }

    #[test]
    fn test_whitespace_collapses() {
        let markup = "<p>\n    Two\n    lines   of\tsource\n</p>\n\n<p>  </p>";
        assert_eq!(markup_to_text(markup), "Two lines of source");
    }

    #[test]
    fn test_entities_resolved() {
        let markup = "<p>Fish &amp; chips &#8212; caf&#xE9; &lt;3&nbsp;!</p>";
        assert_eq!(markup_to_text(markup), "Fish & chips — café <3 !");
    }

    /// A fragment cut from the middle of a document starts with closing tags
    #[test]
    fn test_fragment_with_unmatched_ends() {
        let markup = "end of a sentence.</span></p>\n<p class=\"x\">Next paragraph</p></div><div><p>Open";
        assert_eq!(
            markup_to_text(markup),
            "end of a sentence.\nNext paragraph\nOpen"
        );
    }

    #[test]
    fn test_mismatched_end_names() {
        assert_eq!(markup_to_text("<p><b>bold</i> text</p>"), "bold text");
    }

    /// Verse set in `<pre>` keeps one line per source line
    #[test]
    fn test_preformatted_keeps_lines() {
        let markup = "<p>Intro</p><pre>line one\nline two\n  line three</pre><p>After</p>";
        assert_eq!(
            markup_to_text(markup),
            "Intro\nline one\nline two\nline three\nAfter"
        );
    }

    /// Markup inside `<pre>` does not merge the lines around it
    #[test]
    fn test_preformatted_with_inline_markup() {
        let markup = "<pre><b>Roses</b> are red,\n<i>violets</i> are blue</pre>";
        assert_eq!(markup_to_text(markup), "Roses are red,\nviolets are blue");
    }

    #[test]
    fn test_hidden_elements() {
        let markup = "<html><head><title>Ignored</title><style>p { color: red; }</style></head>\
                      <body><p>Shown</p><script>var x = 1;</script></body></html>";
        assert_eq!(markup_to_text(markup), "Shown");
    }

    /// Markup errors stop rendering but keep the text read so far
    #[test]
    fn test_malformed_markup_keeps_partial_text() {
        let markup = "<p>Before</p><p>After <!-- never closed <p>tail</p>";
        assert_eq!(markup_to_text(markup), "Before\nAfter");
    }

    #[test]
    fn test_truncated_tag_at_end() {
        assert_eq!(markup_to_text("<p>Complete</p><p>Half</p><sp"), "Complete\nHalf");
    }

    #[test]
    fn test_unknown_entity_dropped() {
        assert_eq!(markup_to_text("<p>a&bogus;b</p>"), "ab");
    }

    #[test]
    fn test_render_fragment_decode_failure() {
        assert!(render_fragment(&[b'<', b'p', b'>', 0xFF, b'<', b'/', b'p', b'>']).is_err());
        assert_eq!(render_fragment("<p>ok</p>".as_bytes()).unwrap(), "ok");
    }

    #[test]
    fn test_whitespace_only_fragment() {
        assert_eq!(markup_to_text("</p>\n  <p> &nbsp; </p>\n"), "");
    }
}
