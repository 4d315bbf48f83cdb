use std::ops::Range;

/// One parsed unit of a literate document.
/// Blocks are owned exclusively by their Document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Narrative text, passed to the renderer as markdown.
    Prose {
        text: String,
        /// Byte span in source for error reporting.
        span: Range<usize>,
    },
    /// A fenced code block, display-only or executable.
    Code(CodeBlock),
    /// An include directive: splice the referenced file in as a
    /// display-only code block at render time.
    Include {
        /// Path as written, resolved relative to the source file.
        path: String,
        span: Range<usize>,
    },
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Language tag from the fence info string.
    pub language: Option<String>,
    /// Optional label from braced fence options, e.g. `{stan model1}`.
    pub label: Option<String>,
    /// Literal fence contents.
    pub text: String,
    /// Braced info string sets this; `eval=false` clears it.
    pub execute: bool,
    /// `echo=false` suppresses the source listing in the output.
    pub echo: bool,
    /// Byte span in source, opening fence through closing fence.
    pub span: Range<usize>,
}

impl Block {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Block::Prose { span, .. } => span,
            Block::Code(code) => &code.span,
            Block::Include { span, .. } => span,
        }
    }
}
