//! # refont
//!
//! Font replacement and protection removal for XLSX spreadsheets.
//!
//! A spreadsheet package is a ZIP archive of XML parts. This library
//! rewrites the font names used by the styles and shared-strings parts and,
//! on request, strips workbook and worksheet protection. Every other part is
//! copied byte for byte, and the original file is only replaced once the new
//! package has been fully written.
//!
//! ## Quick Start
//!
//! ```no_run
//! use refont::{process_file, ConversionContext};
//!
//! let ctx = ConversionContext::new()
//!     .with_from("Geneva")
//!     .with_to("Arial")
//!     .with_unprotect(true);
//!
//! let report = process_file("report.xlsx", &ctx)?;
//! println!(
//!     "{} font(s) replaced, {} protection element(s) removed",
//!     report.summary.fonts_replaced, report.summary.protections_removed
//! );
//! # Ok::<(), refont::Error>(())
//! ```
//!
//! ## Single parts
//!
//! ```
//! use refont::xlsx::{patch_xml, PartKind};
//! use refont::ConversionContext;
//!
//! let xml = br#"<sst><si><r><rPr><rFont val="Geneva"/></rPr><t>Hi</t></r></si></sst>"#;
//! let outcome = patch_xml(xml, PartKind::SharedStrings, &ConversionContext::new())?;
//! assert_eq!(outcome.changes, 1);
//! # Ok::<(), refont::Error>(())
//! ```

pub mod container;
pub mod context;
pub mod error;
pub mod process;
pub mod xlsx;

// Re-exports
pub use context::{ConversionContext, DEFAULT_FROM_FONT, DEFAULT_TO_FONT};
pub use error::{Error, Result};
pub use process::{preview_file, process_file, ConversionReport};
pub use xlsx::{PartKind, TranscodeReport};
