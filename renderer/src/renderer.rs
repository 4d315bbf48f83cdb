use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use weave::Document;
use weave::block::{Block, CodeBlock};
use weave::options::{CodeFolding, Options};

use crate::cache::{Fingerprint, FragmentCache};
use crate::error::{DiagnosticError, RenderError};
use crate::evaluator::Evaluator;
use crate::markdown::{escape_html, extract_title, prose_to_html};

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

/// One rendered piece of the output document, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Prose rendered to HTML.
    Markup(String),
    /// A code listing (escaped, language-tagged).
    Listing(String),
    /// Captured execution output, echoed behind the comment marker.
    Output(String),
}

impl Fragment {
    pub fn html(&self) -> &str {
        match self {
            Fragment::Markup(html) | Fragment::Listing(html) | Fragment::Output(html) => html,
        }
    }
}

/// The result of one render pass. A new pass produces a new value;
/// fragments are never mutated incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub fragments: Vec<Fragment>,
    /// Text of the document's first top-level heading, if any.
    pub title: Option<String>,
}

impl RenderedDocument {
    /// The complete HTML body: fragments concatenated in order.
    pub fn html(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            out.push_str(fragment.html());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Render pass
// ---------------------------------------------------------------------------

/// A single render pass over one document. Holds only transient
/// references; a fixed Document and Options always produce the same
/// RenderedDocument.
pub struct Renderer<'a> {
    options: &'a Options,
    base_dir: &'a Path,
    evaluator: &'a mut dyn Evaluator,
    cache: Option<FragmentCache>,
}

impl<'a> Renderer<'a> {
    pub fn new(
        options: &'a Options,
        base_dir: &'a Path,
        evaluator: &'a mut dyn Evaluator,
    ) -> Self {
        Renderer {
            options,
            base_dir,
            evaluator,
            cache: None,
        }
    }

    /// Attach a cache directory. Consulted only when the cache option is set.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache = Some(FragmentCache::new(dir));
        self
    }

    pub fn render(&mut self, document: &Document) -> Result<RenderedDocument, DiagnosticError> {
        let mut fragments = Vec::with_capacity(document.blocks.len());
        let mut title = None;

        for block in &document.blocks {
            match block {
                Block::Prose { text, .. } => {
                    if title.is_none() {
                        title = extract_title(text);
                    }
                    fragments.push(Fragment::Markup(prose_to_html(text)));
                }
                Block::Code(code) => {
                    self.code_block(code, document.source_id, &mut fragments)?;
                }
                Block::Include { path, span } => {
                    let (language, text) = self
                        .resolve_include(path)
                        .map_err(|e| DiagnosticError::new(e, span.clone(), document.source_id))?;
                    fragments.push(Fragment::Listing(listing_html(language.as_deref(), &text)));
                }
            }
        }

        Ok(RenderedDocument { fragments, title })
    }

    fn code_block(
        &mut self,
        code: &CodeBlock,
        source_id: usize,
        fragments: &mut Vec<Fragment>,
    ) -> Result<(), DiagnosticError> {
        let language = code.language.as_deref();

        if code.echo {
            let listing = match (code.execute, self.options.code_folding) {
                (true, CodeFolding::Hide) => folded_listing_html(language, &code.text),
                _ => listing_html(language, &code.text),
            };
            fragments.push(Fragment::Listing(listing));
        }

        if !code.execute {
            return Ok(());
        }

        let output = self
            .execute(code)
            .map_err(|e| DiagnosticError::new(e, code.span.clone(), source_id))?;
        if !output.is_empty() {
            fragments.push(Fragment::Output(output_html(&output)));
        }
        Ok(())
    }

    /// Run one executable block through the cache and the evaluator,
    /// returning the echoed output text.
    fn execute(&mut self, code: &CodeBlock) -> Result<String, RenderError> {
        let language = code.language.as_deref().unwrap_or("");
        let fingerprint = Fingerprint {
            language,
            code: &code.text,
            digits: self.options.digits,
            comment: &self.options.comment,
        }
        .compute();

        let cache = if self.options.cache {
            self.cache.as_ref()
        } else {
            None
        };

        if let Some(cache) = cache {
            if let Some(hit) = cache.lookup(&fingerprint)? {
                return Ok(hit);
            }
        }

        let raw = self
            .evaluator
            .evaluate(language, &code.text)
            .map_err(|e| RenderError::Execution {
                language: language.to_string(),
                message: e.message,
            })?;
        let echoed = echo_output(&raw, &self.options.comment, self.options.digits);

        if let Some(cache) = cache {
            cache.store(&fingerprint, &echoed)?;
        }
        Ok(echoed)
    }

    /// Resolve an include path relative to the document's directory and
    /// read it in full. The file handle is released before returning on
    /// every path, success or failure.
    fn resolve_include(&self, path: &str) -> Result<(Option<String>, String), RenderError> {
        let resolved = self.base_dir.join(path);
        let text = match fs::read_to_string(&resolved) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RenderError::MissingFile(path.to_string()));
            }
            Err(e) => {
                return Err(RenderError::Io(format!(
                    "cannot read '{}': {}",
                    resolved.display(),
                    e
                )));
            }
        };
        let language = resolved
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
        Ok((language, text))
    }
}

/// Render a document with the given options and evaluator, without a cache.
pub fn render(
    document: &Document,
    options: &Options,
    base_dir: &Path,
    evaluator: &mut dyn Evaluator,
) -> Result<RenderedDocument, DiagnosticError> {
    Renderer::new(options, base_dir, evaluator).render(document)
}

// ---------------------------------------------------------------------------
// Fragment construction
// ---------------------------------------------------------------------------

fn listing_html(language: Option<&str>, code: &str) -> String {
    match language {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_html(lang),
            escape_html(code)
        ),
        None => format!("<pre><code>{}</code></pre>\n", escape_html(code)),
    }
}

fn folded_listing_html(language: Option<&str>, code: &str) -> String {
    format!(
        "<details class=\"code-fold\"><summary>Code</summary>{}</details>\n",
        listing_html(language, code)
    )
}

fn output_html(text: &str) -> String {
    format!(
        "<pre><code class=\"output\">{}</code></pre>\n",
        escape_html(text)
    )
}

/// Prefix each output line with the comment marker and round bare
/// numeric tokens to the configured number of significant digits.
fn echo_output(raw: &str, comment: &str, digits: u32) -> String {
    let mut out = String::with_capacity(raw.len() + comment.len());
    for line in raw.lines() {
        out.push_str(comment);
        if !line.is_empty() {
            out.push(' ');
            push_line(&mut out, line, digits);
        }
        out.push('\n');
    }
    out
}

/// Copy a line, reformatting whitespace-delimited numeric tokens.
/// Whitespace runs are preserved byte-for-byte.
fn push_line(out: &mut String, line: &str, digits: u32) {
    let mut rest = line;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        if split == 0 {
            let ws = rest
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(rest.len());
            out.push_str(&rest[..ws]);
            rest = &rest[ws..];
        } else {
            push_token(out, &rest[..split], digits);
            rest = &rest[split..];
        }
    }
}

fn push_token(out: &mut String, token: &str, digits: u32) {
    if digits > 0 && looks_numeric(token) {
        if let Ok(value) = token.parse::<f64>() {
            if value.is_finite() {
                out.push_str(&round_sig(value, digits).to_string());
                return;
            }
        }
    }
    out.push_str(token);
}

fn looks_numeric(token: &str) -> bool {
    let digits_part = token.strip_prefix(['-', '+']).unwrap_or(token);
    digits_part.starts_with(|c: char| c.is_ascii_digit()) || digits_part.starts_with('.')
}

/// Round to `digits` significant digits.
fn round_sig(value: f64, digits: u32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits as i32 - 1 - magnitude);
    (value * factor).round() / factor
}
