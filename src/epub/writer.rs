use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{Book, TocEntry};
use crate::error::{Error, Result};

/// Write a [`Book`] to an EPUB file on disk.
///
/// The archive is assembled in a sibling `.part` file and renamed over
/// `path` only once complete, so a failure never leaves a partial book.
///
/// # Example
///
/// ```no_run
/// use folio::book::{Book, Metadata};
/// use folio::epub::write_epub;
///
/// let mut book = Book::new(Metadata::new("My Book").with_author("Me"));
/// book.add_section("<p>Hello</p>", "Hello", "hello.xhtml", None)?;
/// write_epub(&book, "output.epub")?;
/// # Ok::<(), folio::Error>(())
/// ```
pub fn write_epub<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let path = path.as_ref();
    let partial = partial_path(path);

    let result = std::fs::File::create(&partial)
        .map_err(|e| packaging(format!("cannot create {}: {e}", partial.display())))
        .and_then(|file| write_epub_to_writer(book, file))
        .and_then(|()| {
            std::fs::rename(&partial, path)
                .map_err(|e| packaging(format!("cannot move book into {}: {e}", path.display())))
        });

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

/// Write a [`Book`] to any [`Write`] + [`Seek`] destination.
pub fn write_epub_to_writer<W: Write + Seek>(book: &Book, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    // 1. mimetype must be first and uncompressed
    add_file(&mut zip, "mimetype", b"application/epub+zip", stored)?;

    // 2. META-INF/container.xml
    add_file(&mut zip, "META-INF/container.xml", CONTAINER_XML.as_bytes(), deflated)?;

    // Generate identifier once for consistency between OPF and NCX
    let identifier = if book.metadata.identifier.is_empty() {
        format!("urn:uuid:{}", crate::util::uuid_v4())
    } else {
        book.metadata.identifier.clone()
    };
    let modified = book
        .metadata
        .modified
        .clone()
        .unwrap_or_else(crate::util::utc_timestamp);

    // 3. Package document, navigation document, legacy NCX
    let opf = generate_opf(book, &identifier, &modified);
    add_file(&mut zip, "OEBPS/content.opf", opf.as_bytes(), deflated)?;

    let nav = generate_nav(book);
    add_file(&mut zip, "OEBPS/nav.xhtml", nav.as_bytes(), deflated)?;

    let ncx = generate_ncx(book, &identifier);
    add_file(&mut zip, "OEBPS/toc.ncx", ncx.as_bytes(), deflated)?;

    // 4. Content documents and embedded files
    for resource in &book.resources {
        let path = format!("OEBPS/{}", resource.href);
        add_file(&mut zip, &path, &resource.data, deflated)?;
    }

    zip.finish()
        .map_err(|e| packaging(format!("cannot finish archive: {e}")))?;
    log::info!(
        "packaged {} sections, {} resources",
        book.spine.len(),
        book.resources.len()
    );
    Ok(())
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| packaging(format!("cannot add {name}: {e}")))?;
    zip.write_all(data)
        .map_err(|e| packaging(format!("cannot write {name}: {e}")))
}

fn packaging(msg: String) -> Error {
    Error::Packaging(msg)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

fn generate_opf(book: &Book, identifier: &str, modified: &str) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );

    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&book.metadata.title)
    ));

    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(identifier)
    ));

    let language = if book.metadata.language.is_empty() {
        "en"
    } else {
        &book.metadata.language
    };
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(language)
    ));

    for author in &book.metadata.authors {
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape_xml(author)
        ));
    }

    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape_xml(modified)
    ));

    // EPUB 2 readers look for the cover this way
    if let Some(cover) = &book.metadata.cover_image
        && let Some(resource) = book.get_resource(cover)
    {
        opf.push_str(&format!(
            "    <meta name=\"cover\" content=\"{}\"/>\n",
            escape_xml(&resource.id)
        ));
    }

    opf.push_str("  </metadata>\n  <manifest>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    opf.push_str(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );

    for resource in &book.resources {
        let properties = if book.metadata.cover_image.as_deref() == Some(resource.href.as_str()) {
            " properties=\"cover-image\""
        } else {
            ""
        };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            escape_xml(&resource.id),
            escape_xml(&resource.href),
            escape_xml(&resource.media_type),
            properties
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for item in &book.spine {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            escape_xml(&item.id)
        ));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_nav(book: &Book) -> String {
    let mut nav = String::new();
    nav.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <meta charset="utf-8"/>
  <title>"#,
    );
    nav.push_str(&escape_xml(&book.metadata.title));
    nav.push_str(
        r#"</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>Table of Contents</h1>
    <ol>
"#,
    );
    for entry in &book.toc {
        nav.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            escape_xml(&entry.href),
            escape_xml(&entry.title)
        ));
    }
    nav.push_str("    </ol>\n  </nav>\n</body>\n</html>\n");
    nav
}

fn generate_ncx(book: &Book, identifier: &str) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );

    ncx.push_str(&escape_xml(identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_xml(&book.metadata.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <navMap>
"#,
    );

    for (i, entry) in book.toc.iter().enumerate() {
        write_nav_point(&mut ncx, entry, i + 1);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, entry: &TocEntry, play_order: usize) {
    ncx.push_str(&format!(
        "    <navPoint id=\"navpoint-{play_order}\" playOrder=\"{play_order}\">\n"
    ));
    ncx.push_str(&format!(
        "      <navLabel><text>{}</text></navLabel>\n",
        escape_xml(&entry.title)
    ));
    ncx.push_str(&format!(
        "      <content src=\"{}\"/>\n",
        escape_xml(&entry.href)
    ));
    ncx.push_str("    </navPoint>\n");
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    use super::*;
    use crate::book::Metadata;

    fn sample_book() -> Book {
        let mut book = Book::new(
            Metadata::new("Effective Go")
                .with_language("en")
                .with_identifier("urn:uuid:test"),
        );
        book.metadata.modified = Some("2024-01-01T00:00:00Z".to_string());
        book.add_section("<p>front</p>", "", "title.xhtml", None).unwrap();
        book.add_section("<p>x</p>", "Intro & Setup", "intro-setup.xhtml", None)
            .unwrap();
        book
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut out = String::new();
        archive
            .by_name(name)
            .unwrap_or_else(|_| panic!("missing {name}"))
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_archive_layout() {
        let mut buf = Cursor::new(Vec::new());
        write_epub_to_writer(&sample_book(), &mut buf).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), zip::CompressionMethod::Stored);
        drop(first);

        assert_eq!(read_entry(&mut archive, "mimetype"), "application/epub+zip");
        for name in [
            "META-INF/container.xml",
            "OEBPS/content.opf",
            "OEBPS/nav.xhtml",
            "OEBPS/toc.ncx",
            "OEBPS/title.xhtml",
            "OEBPS/intro-setup.xhtml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn test_opf_spine_order_and_nav() {
        let mut buf = Cursor::new(Vec::new());
        write_epub_to_writer(&sample_book(), &mut buf).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();

        let opf = read_entry(&mut archive, "OEBPS/content.opf");
        let title_pos = opf.find("idref=\"item_title_xhtml\"").unwrap();
        let intro_pos = opf.find("idref=\"item_intro_setup_xhtml\"").unwrap();
        assert!(title_pos < intro_pos);
        assert!(opf.contains("<dc:identifier id=\"BookId\">urn:uuid:test</dc:identifier>"));
        assert!(opf.contains("dcterms:modified\">2024-01-01T00:00:00Z<"));

        let nav = read_entry(&mut archive, "OEBPS/nav.xhtml");
        assert!(nav.contains("<a href=\"intro-setup.xhtml\">Intro &amp; Setup</a>"));
        assert!(!nav.contains("title.xhtml"));

        let ncx = read_entry(&mut archive, "OEBPS/toc.ncx");
        assert_eq!(ncx.matches("<navPoint").count(), 1);
    }

    #[test]
    fn test_write_epub_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book.epub");

        write_epub(&sample_book(), &out).unwrap();

        assert!(out.exists());
        assert!(!dir.path().join("book.epub.part").exists());
    }

    #[test]
    fn test_write_epub_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no/such/dir/book.epub");

        let err = write_epub(&sample_book(), &out).unwrap_err();
        assert!(matches!(err, Error::Packaging(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("out/Effective Go.epub")),
            PathBuf::from("out/Effective Go.epub.part")
        );
    }
}
