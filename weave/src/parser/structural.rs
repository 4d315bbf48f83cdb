use std::ops::Range;

use crate::block::{Block, CodeBlock};
use crate::options::Options;
use crate::parser::error::{ParseError, ParseErrorKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse literate source text into render options and an ordered block list.
pub fn parse_source(
    source: &str,
    file_id: usize,
) -> Result<(Options, Vec<Block>), Vec<ParseError>> {
    let lines = split_lines(source);
    let mut scanner = Scanner::new(source, &lines, file_id);
    scanner.run();
    scanner.finish()
}

// ---------------------------------------------------------------------------
// Line table
// ---------------------------------------------------------------------------

/// One source line with its byte span (newline excluded).
struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for segment in source.split_inclusive('\n') {
        let text = segment.strip_suffix('\n').unwrap_or(segment);
        let text = text.strip_suffix('\r').unwrap_or(text);
        lines.push(Line {
            text,
            start,
            end: start + text.len(),
        });
        start += segment.len();
    }
    lines
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    source: &'a str,
    lines: &'a [Line<'a>],
    file_id: usize,
    index: usize,
    blocks: Vec<Block>,
    errors: Vec<ParseError>,
    options: Options,
    /// First line of the prose run currently being collected.
    prose_start: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str, lines: &'a [Line<'a>], file_id: usize) -> Self {
        Scanner {
            source,
            lines,
            file_id,
            index: 0,
            blocks: Vec::new(),
            errors: Vec::new(),
            options: Options::default(),
            prose_start: None,
        }
    }

    fn run(&mut self) {
        self.frontmatter();

        while self.index < self.lines.len() {
            let line = &self.lines[self.index];
            let trimmed = line.text.trim_start();

            if let Some(ticks) = fence_open(trimmed) {
                self.flush_prose(self.index);
                self.code_fence(ticks);
            } else if trimmed.starts_with("<<") {
                self.flush_prose(self.index);
                self.include_directive();
            } else {
                if self.prose_start.is_none() {
                    self.prose_start = Some(self.index);
                }
                self.index += 1;
            }
        }

        self.flush_prose(self.lines.len());
    }

    fn finish(self) -> Result<(Options, Vec<Block>), Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok((self.options, self.blocks))
        } else {
            Err(self.errors)
        }
    }

    /// Option frontmatter: a leading `---` line, a TOML table, a closing
    /// `---` line. Recognized only at the top of the document.
    fn frontmatter(&mut self) {
        let Some(open) = self
            .lines
            .iter()
            .position(|l| !l.text.trim().is_empty())
        else {
            return;
        };
        // Leading blank lines are tolerated before the frontmatter.
        if self.lines[open].text.trim() != "---" {
            return;
        }

        let close = self.lines[open + 1..]
            .iter()
            .position(|l| l.text.trim() == "---")
            .map(|p| p + open + 1);

        let Some(close) = close else {
            self.errors.push(ParseError::new(
                ParseErrorKind::UnterminatedFrontMatter,
                "option frontmatter opened but never closed",
                self.lines[open].start..self.source.len(),
                self.file_id,
            ));
            self.index = self.lines.len();
            return;
        };

        let body: Vec<&str> = self.lines[open + 1..close].iter().map(|l| l.text).collect();
        let body_span = if open + 1 < close {
            self.lines[open + 1].start..self.lines[close - 1].end
        } else {
            self.lines[open].start..self.lines[close].end
        };

        match Options::from_toml(&body.join("\n")) {
            Ok(options) => self.options = options,
            Err(err) => self.errors.push(ParseError::new(
                ParseErrorKind::InvalidOptions,
                format!("invalid option frontmatter: {}", err.message()),
                body_span,
                self.file_id,
            )),
        }

        self.index = close + 1;
    }

    /// Consume a fenced code block starting at the current line.
    fn code_fence(&mut self, ticks: usize) {
        let open = self.index;
        let open_line = &self.lines[open];
        let info = open_line.text.trim_start()[ticks..].trim();

        let close = self.lines[open + 1..]
            .iter()
            .position(|l| fence_close(l.text, ticks))
            .map(|p| p + open + 1);

        let Some(close) = close else {
            self.errors.push(ParseError::new(
                ParseErrorKind::UnterminatedFence,
                "code fence opened but never closed",
                open_line.start..self.source.len(),
                self.file_id,
            ));
            self.index = self.lines.len();
            return;
        };

        let mut text = self.lines[open + 1..close]
            .iter()
            .map(|l| l.text)
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            text.push('\n');
        }

        let span = open_line.start..self.lines[close].end;
        let fence = match parse_fence_info(info, span.clone(), self.file_id) {
            Ok(fence) => fence,
            Err(err) => {
                self.errors.push(err);
                FenceInfo::display(None)
            }
        };

        self.blocks.push(Block::Code(CodeBlock {
            language: fence.language,
            label: fence.label,
            text,
            execute: fence.execute,
            echo: fence.echo,
            span,
        }));
        self.index = close + 1;
    }

    /// Consume an include directive line: `<<path>>`.
    fn include_directive(&mut self) {
        let line = &self.lines[self.index];
        let span = line.start..line.end;
        let trimmed = line.text.trim();

        let inner = trimmed.strip_prefix("<<").unwrap_or(trimmed);
        match inner.strip_suffix(">>") {
            Some(path) if !path.trim().is_empty() => {
                self.blocks.push(Block::Include {
                    path: path.trim().to_string(),
                    span,
                });
            }
            Some(_) => {
                self.errors.push(ParseError::new(
                    ParseErrorKind::MalformedDirective,
                    "include directive has an empty path",
                    span,
                    self.file_id,
                ));
            }
            None => {
                self.errors.push(
                    ParseError::new(
                        ParseErrorKind::MalformedDirective,
                        "malformed include directive",
                        span,
                        self.file_id,
                    )
                    .with_note("expected `<<path>>` on a single line"),
                );
            }
        }
        self.index += 1;
    }

    /// Close the prose run ending just before line `until`.
    fn flush_prose(&mut self, until: usize) {
        let Some(start) = self.prose_start.take() else {
            return;
        };
        if start >= until {
            return;
        }
        let text = self.lines[start..until]
            .iter()
            .map(|l| l.text)
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            return;
        }
        self.blocks.push(Block::Prose {
            text,
            span: self.lines[start].start..self.lines[until - 1].end,
        });
    }
}

// ---------------------------------------------------------------------------
// Fences
// ---------------------------------------------------------------------------

/// Backtick count if this (already left-trimmed) line opens a fence.
fn fence_open(trimmed: &str) -> Option<usize> {
    let ticks = trimmed.chars().take_while(|c| *c == '`').count();
    if ticks >= 3 { Some(ticks) } else { None }
}

/// Whether a line closes a fence opened with `ticks` backticks:
/// at least as many backticks and nothing else.
fn fence_close(text: &str, ticks: usize) -> bool {
    let trimmed = text.trim();
    let count = trimmed.chars().take_while(|c| *c == '`').count();
    count >= ticks && trimmed.len() == count
}

struct FenceInfo {
    language: Option<String>,
    label: Option<String>,
    execute: bool,
    echo: bool,
}

impl FenceInfo {
    fn display(language: Option<String>) -> Self {
        FenceInfo {
            language,
            label: None,
            execute: false,
            echo: true,
        }
    }
}

/// Interpret a fence info string.
///
/// `lang` (or nothing) marks a display-only block. `{lang}` marks an
/// executable block; `{lang label, eval=false, echo=false}` adds a label
/// and renderer directives. Unrecognized option keys are ignored.
fn parse_fence_info(
    info: &str,
    span: Range<usize>,
    file_id: usize,
) -> Result<FenceInfo, ParseError> {
    if info.is_empty() {
        return Ok(FenceInfo::display(None));
    }

    let Some(body) = info.strip_prefix('{') else {
        let language = info.split_whitespace().next().map(str::to_string);
        return Ok(FenceInfo::display(language));
    };

    let Some(body) = body.strip_suffix('}') else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidOptions,
            "unclosed `{` in fence options",
            span,
            file_id,
        ));
    };

    let mut fence = FenceInfo {
        language: None,
        label: None,
        execute: true,
        echo: true,
    };

    for (idx, entry) in body.split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if idx == 0 && !entry.contains('=') {
            let mut words = entry.split_whitespace();
            fence.language = words.next().map(str::to_string);
            fence.label = words.next().map(str::to_string);
            continue;
        }
        match entry.split_once('=') {
            Some((key, value)) => match key.trim() {
                "eval" => fence.execute = bool_option("eval", value.trim(), &span, file_id)?,
                "echo" => fence.echo = bool_option("echo", value.trim(), &span, file_id)?,
                _ => {}
            },
            None if fence.label.is_none() => fence.label = Some(entry.to_string()),
            None => {}
        }
    }

    Ok(fence)
}

fn bool_option(
    key: &str,
    value: &str,
    span: &Range<usize>,
    file_id: usize,
) -> Result<bool, ParseError> {
    match value {
        "true" | "TRUE" => Ok(true),
        "false" | "FALSE" => Ok(false),
        _ => Err(ParseError::new(
            ParseErrorKind::InvalidOptions,
            format!("invalid value '{}' for fence option '{}'", value, key),
            span.clone(),
            file_id,
        )
        .with_note("expected true or false")),
    }
}
