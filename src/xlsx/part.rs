//! Classification of package entries by their stored path.

/// Canonical path of the styles part.
pub const STYLES_PART: &str = "xl/styles.xml";

/// Canonical path of the shared strings part.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Canonical path of the workbook part.
pub const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Directory holding the worksheet parts.
pub const WORKSHEETS_DIR: &str = "xl/worksheets";

/// The XML parts that get rewritten, one rewrite rule each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// `xl/styles.xml`: font names under `<fonts>`
    Style,
    /// `xl/sharedStrings.xml`: rich text run fonts
    SharedStrings,
    /// `xl/workbook.xml`: workbook protection and file sharing
    Workbook,
    /// `xl/worksheets/*`: sheet protection
    Worksheet,
}

impl PartKind {
    /// Classify an entry name.
    ///
    /// Workbook and worksheet parts are only selected when `unprotect` is
    /// set; otherwise they are opaque like every other entry.
    pub fn classify(name: &str, unprotect: bool) -> Option<Self> {
        match name {
            STYLES_PART => Some(PartKind::Style),
            SHARED_STRINGS_PART => Some(PartKind::SharedStrings),
            WORKBOOK_PART if unprotect => Some(PartKind::Workbook),
            _ if unprotect && parent_dir(name) == WORKSHEETS_DIR => Some(PartKind::Worksheet),
            _ => None,
        }
    }

    /// Whether the rule for this kind rewrites font names.
    pub fn rewrites_fonts(self) -> bool {
        matches!(self, PartKind::Style | PartKind::SharedStrings)
    }
}

/// Directory portion of a ZIP entry name (`/`-separated, no trailing slash).
fn parent_dir(name: &str) -> &str {
    match name.trim_end_matches('/').rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}
