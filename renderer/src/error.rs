use std::fmt;
use std::ops::Range;

#[derive(Debug)]
pub enum RenderError {
    /// An include directive referenced a path that does not resolve.
    MissingFile(String),
    /// A cache entry failed fingerprint verification. The entry has been
    /// evicted; the next render recomputes it.
    CacheMismatch { fingerprint: String },
    /// The evaluator reported a failure for an executable block.
    Execution { language: String, message: String },
    /// Filesystem failure outside include resolution.
    Io(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingFile(path) => {
                write!(f, "included file not found: '{}'", path)
            }
            RenderError::CacheMismatch { fingerprint } => {
                write!(
                    f,
                    "cache entry {} failed verification and was evicted; rerun to recompute",
                    &fingerprint[..fingerprint.len().min(12)]
                )
            }
            RenderError::Execution { language, message } => {
                write!(f, "evaluation failed for language '{}': {}", language, message)
            }
            RenderError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

/// A render error enriched with the failing block's source location.
#[derive(Debug)]
pub struct DiagnosticError {
    pub error: RenderError,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
}

impl DiagnosticError {
    pub fn new(error: RenderError, span: Range<usize>, source_id: usize) -> Self {
        DiagnosticError {
            error,
            span: Some(span),
            source_id,
        }
    }
}

impl From<RenderError> for DiagnosticError {
    fn from(error: RenderError) -> Self {
        DiagnosticError {
            error,
            span: None,
            source_id: 0,
        }
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for DiagnosticError {}
