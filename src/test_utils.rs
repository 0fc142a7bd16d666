//! In-memory EPUB fixtures for tests

use std::io::{Cursor, Write};

use zip::{CompressionMethod, ZipWriter, write::FileOptions};

pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Writes the given files into a ZIP archive, `mimetype` first and stored
pub(crate) fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    for (name, content) in files {
        let options = if name.ends_with(".xhtml") { deflated } else { stored };
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Builds the package document for `documents`, given as `(id, href)` pairs
/// relative to `OEBPS/`; a navigation document `nav.xhtml` is always declared
pub(crate) fn package_document(title: Option<&str>, documents: &[(&str, &str)]) -> String {
    let title = title
        .map(|title| format!("<dc:title>{title}</dc:title>"))
        .unwrap_or_default();

    let mut manifest = String::from(
        r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="css" href="style.css" media-type="text/css"/>"#,
    );
    let mut spine = String::new();
    for (id, href) in documents {
        manifest.push_str(&format!(
            r#"
    <item id="{id}" href="{href}" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="{id}"/>"#));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="pub-id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="pub-id">urn:uuid:fixture</dc:identifier>
    {title}
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    {manifest}
  </manifest>
  <spine>{spine}</spine>
</package>"#
    )
}

/// Builds a complete EPUB with the given title and `(id, href, content)` documents
pub(crate) fn epub_bytes(title: &str, documents: &[(&str, &str, &str)]) -> Vec<u8> {
    let ids = documents
        .iter()
        .map(|(id, href, _)| (*id, *href))
        .collect::<Vec<_>>();
    let opf = package_document(Some(title), &ids);
    let paths = documents
        .iter()
        .map(|(_, href, _)| format!("OEBPS/{href}"))
        .collect::<Vec<_>>();

    let mut files: Vec<(&str, &[u8])> = vec![
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
        (
            "OEBPS/nav.xhtml",
            "<html><body><nav>Contents</nav></body></html>".as_bytes(),
        ),
        ("OEBPS/style.css", "p { margin: 0; }".as_bytes()),
    ];
    for (path, (_, _, content)) in paths.iter().zip(documents) {
        files.push((path.as_str(), content.as_bytes()));
    }

    zip_bytes(&files)
}

/// Wraps body markup in a minimal XHTML document
pub(crate) fn xhtml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Chapter</title></head>
<body>{body}</body>
</html>"#
    )
}
