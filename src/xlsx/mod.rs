//! XLSX package rewriting.
//!
//! Each entry of a package is classified by its stored path into a
//! [`PartKind`]. Classified parts are rewritten by [`patch_xml`]; everything
//! else passes through [`transcode`] untouched.
//!
//! # Example
//!
//! ```no_run
//! use refont::container::open_archive;
//! use refont::xlsx::transcode;
//! use refont::ConversionContext;
//!
//! let mut archive = open_archive("report.xlsx")?;
//! let output = std::fs::File::create("report-arial.xlsx")?;
//! let report = transcode(&mut archive, output, &ConversionContext::new())?;
//! println!("{} font(s) replaced", report.fonts_replaced);
//! # Ok::<(), refont::Error>(())
//! ```

mod part;
mod patch;
mod transcode;

pub use part::{PartKind, SHARED_STRINGS_PART, STYLES_PART, WORKBOOK_PART, WORKSHEETS_DIR};
pub use patch::{patch_xml, PatchOutcome};
pub use transcode::{transcode, TranscodeReport};
