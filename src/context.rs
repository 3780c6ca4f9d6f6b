//! Conversion configuration.

/// Font name matched when no `from` font is given.
pub const DEFAULT_FROM_FONT: &str = "Geneva";

/// Replacement font used when no `to` font is given.
pub const DEFAULT_TO_FONT: &str = "Arial";

/// Immutable configuration for one run.
///
/// Built once from command-line options and shared by reference with every
/// file that is converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionContext {
    /// Font name to replace
    pub from: String,

    /// Replacement font name
    pub to: String,

    /// Also strip workbook and worksheet protection
    pub unprotect: bool,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM_FONT.to_string(),
            to: DEFAULT_TO_FONT.to_string(),
            unprotect: false,
        }
    }
}

impl ConversionContext {
    /// Create a context with the default fonts and protection left in place.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font name to replace.
    pub fn with_from(mut self, font: impl Into<String>) -> Self {
        self.from = font.into();
        self
    }

    /// Set the replacement font name.
    pub fn with_to(mut self, font: impl Into<String>) -> Self {
        self.to = font.into();
        self
    }

    /// Enable or disable protection stripping.
    pub fn with_unprotect(mut self, unprotect: bool) -> Self {
        self.unprotect = unprotect;
        self
    }
}
