use serde::Deserialize;

/// Render options, populated once from the document frontmatter.
/// Unset options fall back to the defaults below; nothing here is
/// mutated after rendering begins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Reuse cached execution output, keyed by content fingerprint.
    pub cache: bool,
    /// Significant digits for numeric tokens in echoed output.
    /// 0 disables rounding.
    pub digits: u32,
    /// Initial visibility of executable code listings.
    pub code_folding: CodeFolding,
    /// Prefix for echoed output lines.
    pub comment: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            cache: false,
            digits: 7,
            code_folding: CodeFolding::Show,
            comment: "#>".to_string(),
        }
    }
}

/// Whether executable code listings start visible or folded away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeFolding {
    Show,
    Hide,
}

impl Options {
    /// Parse a TOML frontmatter table into Options.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
