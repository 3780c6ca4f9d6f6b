//! Error types for the refont library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for refont operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a spreadsheet package.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file or entry operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing a ZIP archive entry.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// The input file is not a readable ZIP archive.
    #[error("Cannot open archive: {0}")]
    ArchiveOpen(String),

    /// The temporary output file could not be created.
    #[error("Cannot create temporary file: {0}")]
    TempFile(#[source] io::Error),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A matched element lacks an attribute the rewrite depends on.
    #[error("<{element}> element has no `{attribute}` attribute")]
    MissingAttribute {
        /// Local name of the element.
        element: String,
        /// Name of the missing attribute.
        attribute: String,
    },

    /// A failure while rewriting one archive entry.
    #[error("{part}: {source}")]
    Part {
        /// Entry path inside the package.
        part: String,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// A failure while converting one file.
    #[error("{}: {}", .path.display(), .source)]
    File {
        /// Path of the package on disk.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the archive entry name to an error.
    pub fn in_part(self, part: impl Into<String>) -> Self {
        Error::Part {
            part: part.into(),
            source: Box::new(self),
        }
    }

    /// Attach the file path to an error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::ZipArchive(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}
