//! ZIP package access and XML part decoding.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// How the text of an XML part is laid out in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Detect the encoding and the length of any byte-order mark.
    ///
    /// Without a BOM, UTF-16 is recognized by the zero high bytes of its
    /// leading ASCII characters; NUL is never legal in UTF-8 XML.
    fn sniff(bytes: &[u8]) -> (Self, usize) {
        match bytes {
            [0xEF, 0xBB, 0xBF, ..] => (TextEncoding::Utf8, 3),
            [0xFF, 0xFE, ..] => (TextEncoding::Utf16Le, 2),
            [0xFE, 0xFF, ..] => (TextEncoding::Utf16Be, 2),
            [_, 0, _, 0, ..] => (TextEncoding::Utf16Le, 0),
            [0, _, 0, _, ..] => (TextEncoding::Utf16Be, 0),
            _ => (TextEncoding::Utf8, 0),
        }
    }
}

/// Decode an XML part to a string.
///
/// Spreadsheet parts are almost always UTF-8, but some producers write
/// UTF-16. A UTF-16 part gets its declaration pointed at UTF-8, since a
/// rewritten part is always serialized as UTF-8. Malformed text is an error,
/// never a lossy decode.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    let (encoding, bom) = TextEncoding::sniff(bytes);
    let body = &bytes[bom..];
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(body)
            .map(str::to_owned)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {}", e))),
        TextEncoding::Utf16Le => decode_utf16(body, u16::from_le_bytes).map(declare_utf8),
        TextEncoding::Utf16Be => decode_utf16(body, u16::from_be_bytes).map(declare_utf8),
    }
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if body.len() % 2 != 0 {
        return Err(Error::XmlParse("truncated UTF-16 text".to_string()));
    }
    let units = body.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::XmlParse(format!("invalid UTF-16: {}", e)))
}

/// Replace a `utf-16*` encoding in the XML declaration with `UTF-8`.
///
/// The pseudo-attribute and its value are matched case-insensitively, so
/// `UTF-16LE`, `utf-16be` and `Utf-16` are all rewritten. Anything else is
/// returned as is.
fn declare_utf8(xml: String) -> String {
    match utf16_encoding_value(&xml) {
        Some((start, end)) => format!("{}UTF-8{}", &xml[..start], &xml[end..]),
        None => xml,
    }
}

/// Byte range of the encoding value in the declaration, if it names UTF-16.
fn utf16_encoding_value(xml: &str) -> Option<(usize, usize)> {
    if !xml.starts_with("<?xml") {
        return None;
    }
    let decl = &xml[..xml.find("?>")?];
    // ASCII lowercasing keeps byte offsets intact
    let key = decl.to_ascii_lowercase().find("encoding")?;

    let after_eq = decl[key + "encoding".len()..]
        .trim_start()
        .strip_prefix('=')?
        .trim_start();
    let quote = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let start = decl.len() - after_eq.len() + 1;
    let end = start + decl[start..].find(quote)?;

    decl[start..end]
        .to_ascii_lowercase()
        .starts_with("utf-16")
        .then_some((start, end))
}

/// Open a spreadsheet package from a file path.
///
/// An unreadable file is reported as [`Error::Io`]; a readable file that is
/// not a ZIP archive as [`Error::ArchiveOpen`].
pub fn open_archive(path: impl AsRef<Path>) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    read_archive(BufReader::new(file))
}

/// Read a spreadsheet package from any seekable reader.
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<ZipArchive<R>> {
    ZipArchive::new(reader).map_err(|e| Error::ArchiveOpen(e.to_string()))
}

/// List the entry names of a package in stored order.
pub fn entry_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    archive.file_names().map(String::from).collect()
}
