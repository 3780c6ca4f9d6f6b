//! Entry-by-entry rewrite of a spreadsheet package.

use super::part::PartKind;
use super::patch::patch_xml;
use crate::context::ConversionContext;
use crate::error::{Error, Result};
use log::debug;
use serde::Serialize;
use std::io::{Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Summary of one package rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscodeReport {
    /// Entries written to the output package
    pub entries: usize,
    /// XML parts routed through the patcher
    pub parts_patched: usize,
    /// Font names replaced in styles and shared strings
    pub fonts_replaced: usize,
    /// Protection elements removed from the workbook and worksheets
    pub protections_removed: usize,
}

impl TranscodeReport {
    fn record(&mut self, kind: PartKind, changes: usize) {
        self.parts_patched += 1;
        if kind.rewrites_fonts() {
            self.fonts_replaced += changes;
        } else {
            self.protections_removed += changes;
        }
    }

    /// Total number of changes made to the package.
    pub fn changes(&self) -> usize {
        self.fonts_replaced + self.protections_removed
    }
}

/// Copy every entry of `archive` into a new package written to `output`.
///
/// Entries keep their names and order. Parts with a [`PartKind`] are
/// decoded, patched and recompressed; every other entry is copied raw,
/// compressed bytes included. The output package is finished before this
/// returns. The first failing entry aborts the whole rewrite.
pub fn transcode<R, W>(
    archive: &mut ZipArchive<R>,
    output: W,
    ctx: &ConversionContext,
) -> Result<TranscodeReport>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut zip = ZipWriter::new(output);
    let mut report = TranscodeReport::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        let kind = if entry.is_dir() {
            None
        } else {
            PartKind::classify(&name, ctx.unprotect)
        };

        match kind {
            None => {
                debug!("{}: copied", name);
                zip.raw_copy_file(entry)
                    .map_err(|e| Error::from(e).in_part(&name))?;
            }
            Some(kind) => {
                let mut options =
                    SimpleFileOptions::default().compression_method(match entry.compression() {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    });
                if let Some(modified) = entry.last_modified() {
                    options = options.last_modified_time(modified);
                }
                if let Some(mode) = entry.unix_mode() {
                    options = options.unix_permissions(mode);
                }

                let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|e| Error::from(e).in_part(&name))?;
                drop(entry);

                let changes = write_patched(&mut zip, &name, options, &bytes, kind, ctx)
                    .map_err(|e| e.in_part(&name))?;
                debug!("{}: {:?} part, {} change(s)", name, kind, changes);
                report.record(kind, changes);
            }
        }
        report.entries += 1;
    }

    zip.finish()?;
    Ok(report)
}

/// Upper bound on the buffer reserved up front for a part.
const MAX_CAPACITY_HINT: u64 = 16 << 20;

/// Buffer capacity for a part whose header declares `declared` bytes.
///
/// The declared size is untrusted; larger parts still grow while reading.
fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_CAPACITY_HINT) as usize
}

fn write_patched<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    options: SimpleFileOptions,
    bytes: &[u8],
    kind: PartKind,
    ctx: &ConversionContext,
) -> Result<usize> {
    let outcome = patch_xml(bytes, kind, ctx)?;
    zip.start_file(name, options)?;
    zip.write_all(&outcome.bytes)?;
    Ok(outcome.changes)
}
