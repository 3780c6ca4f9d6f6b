//! Streaming rewrite of a single XML part.
//!
//! The part is read as a sequence of quick-xml events and written back
//! event by event. Only the elements selected by the part's rule are
//! touched; everything else is copied through unchanged.

use super::part::PartKind;
use crate::container::decode_xml_bytes;
use crate::context::ConversionContext;
use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// Result of rewriting one XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Serialized part. Identical to the input when `changes == 0`.
    pub bytes: Vec<u8>,
    /// Number of font substitutions or removed elements.
    pub changes: usize,
}

impl PatchOutcome {
    /// Whether the rule left the part untouched.
    pub fn is_unchanged(&self) -> bool {
        self.changes == 0
    }
}

const FONT_ANCESTORS: &[&[u8]] = &[b"fonts", b"font"];
const WORKBOOK_LOCKS: &[&[u8]] = &[b"workbookProtection", b"fileSharing"];
const SHEET_LOCKS: &[&[u8]] = &[b"sheetProtection"];

/// The rewrite applied to one part.
#[derive(Debug)]
enum Rule<'a> {
    /// Replace `val` on `element` when it sits directly under `ancestors`.
    ReplaceFont {
        ancestors: &'static [&'static [u8]],
        element: &'static [u8],
        from: &'a str,
        to: &'a str,
    },
    /// Drop every element with one of these names, subtree included.
    Remove(&'static [&'static [u8]]),
}

impl<'a> Rule<'a> {
    fn for_kind(kind: PartKind, ctx: &'a ConversionContext) -> Self {
        match kind {
            PartKind::Style => Rule::ReplaceFont {
                ancestors: FONT_ANCESTORS,
                element: b"name",
                from: &ctx.from,
                to: &ctx.to,
            },
            PartKind::SharedStrings => Rule::ReplaceFont {
                ancestors: &[],
                element: b"rFont",
                from: &ctx.from,
                to: &ctx.to,
            },
            PartKind::Workbook => Rule::Remove(WORKBOOK_LOCKS),
            PartKind::Worksheet => Rule::Remove(SHEET_LOCKS),
        }
    }

    fn removes(&self, e: &BytesStart<'_>) -> bool {
        match self {
            Rule::Remove(names) => {
                let name = e.local_name();
                names.iter().any(|n| *n == name.as_ref())
            }
            Rule::ReplaceFont { .. } => false,
        }
    }

    /// Apply a font substitution to `e` if it is a matched element.
    ///
    /// `open` holds the local names of the elements enclosing `e`.
    fn replace_font<'b>(
        &self,
        e: BytesStart<'b>,
        open: &[Vec<u8>],
        changes: &mut usize,
    ) -> Result<BytesStart<'b>> {
        let Rule::ReplaceFont {
            ancestors,
            element,
            from,
            to,
        } = self
        else {
            return Ok(e);
        };

        if e.local_name().as_ref() != *element || !encloses(open, ancestors) {
            return Ok(e);
        }

        let mut val = None;
        for attr in e.attributes() {
            let attr = attr?;
            if is_val(attr.key) {
                val = Some(attr.unescape_value()?.into_owned());
                break;
            }
        }
        let val = val.ok_or_else(|| Error::MissingAttribute {
            element: String::from_utf8_lossy(element).into_owned(),
            attribute: "val".to_string(),
        })?;

        if val != *from || from == to {
            return Ok(e);
        }

        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut patched = BytesStart::new(tag);
        let mut replaced = false;
        for attr in e.attributes() {
            let attr = attr?;
            if !replaced && is_val(attr.key) {
                replaced = true;
                patched.push_attribute(Attribute {
                    key: attr.key,
                    value: Cow::Owned(escape(*to).into_owned().into_bytes()),
                });
            } else {
                patched.push_attribute(attr);
            }
        }
        *changes += 1;
        Ok(patched)
    }
}

/// `val` in any namespace, but not an `xmlns:val` declaration.
fn is_val(key: QName<'_>) -> bool {
    key.local_name().as_ref() == b"val" && key.prefix().map_or(true, |p| p.as_ref() != b"xmlns")
}

/// Whether the innermost open elements are exactly `ancestors`.
fn encloses(open: &[Vec<u8>], ancestors: &[&[u8]]) -> bool {
    open.len() >= ancestors.len()
        && open[open.len() - ancestors.len()..]
            .iter()
            .zip(ancestors)
            .all(|(name, expected)| name.as_slice() == *expected)
}

/// Rewrite one XML part according to the rule for `kind`.
///
/// Parts are decoded first (UTF-8 or UTF-16); rewritten parts are always
/// serialized as UTF-8. When nothing matched, the input bytes are returned
/// verbatim so an unchanged part stays byte-identical.
pub fn patch_xml(bytes: &[u8], kind: PartKind, ctx: &ConversionContext) -> Result<PatchOutcome> {
    let xml = decode_xml_bytes(bytes)?;
    let rule = Rule::for_kind(kind, ctx);
    let (patched, changes) = rewrite(&xml, &rule)?;

    if changes == 0 {
        return Ok(PatchOutcome {
            bytes: bytes.to_vec(),
            changes,
        });
    }
    Ok(PatchOutcome {
        bytes: patched,
        changes,
    })
}

fn rewrite(xml: &str, rule: &Rule<'_>) -> Result<(Vec<u8>, usize)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();

    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut skip_depth: usize = 0;
    let mut saw_root = false;
    let mut changes = 0;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,
            _ if skip_depth > 0 => match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                _ => {}
            },
            Event::Start(ref e) if rule.removes(e) => {
                saw_root = true;
                skip_depth = 1;
                changes += 1;
            }
            Event::Empty(ref e) if rule.removes(e) => {
                saw_root = true;
                changes += 1;
            }
            Event::Start(e) => {
                saw_root = true;
                let name = e.local_name().as_ref().to_vec();
                let e = rule.replace_font(e, &open, &mut changes)?;
                open.push(name);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                saw_root = true;
                let e = rule.replace_font(e, &open, &mut changes)?;
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                open.pop();
                writer.write_event(Event::End(e))?;
            }
            other => writer.write_event(other)?,
        }
        buf.clear();
    }

    if skip_depth > 0 || !open.is_empty() {
        return Err(Error::XmlParse("unexpected end of document".to_string()));
    }
    if !saw_root {
        return Err(Error::XmlParse("document has no root element".to_string()));
    }

    Ok((writer.into_inner(), changes))
}
