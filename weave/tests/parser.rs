use weave::Document;
use weave::block::Block;
use weave::options::{CodeFolding, Options};
use weave::parser::{ParseError, ParseErrorKind, Parser};

fn parse(source: &str) -> Document {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn parse_err(source: &str) -> Vec<ParseError> {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect_err("expected parse failure")
}

#[test]
fn prose_only() {
    let doc = parse("Hello, *Bayes*.\n\nSecond paragraph.\n");
    assert_eq!(doc.blocks.len(), 1);
    let Block::Prose { text, span } = &doc.blocks[0] else {
        panic!("expected prose, got {:?}", doc.blocks[0]);
    };
    assert!(text.contains("Second paragraph."));
    assert!(!span.is_empty());
}

#[test]
fn display_fence() {
    let doc = parse("```stan\nmodel { y ~ normal(a, sigma); }\n```\n");
    assert_eq!(doc.blocks.len(), 1);
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.language.as_deref(), Some("stan"));
    assert_eq!(code.text, "model { y ~ normal(a, sigma); }\n");
    assert!(!code.execute);
    assert!(code.echo);
}

#[test]
fn bare_fence_has_no_language() {
    let doc = parse("```\nplain\n```\n");
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.language, None);
    assert!(!code.execute);
}

#[test]
fn executable_fence() {
    let doc = parse("```{r}\nfit <- lm(y ~ x)\n```\n");
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.language.as_deref(), Some("r"));
    assert!(code.execute);
    assert!(code.echo);
}

#[test]
fn fence_label_and_options() {
    let doc = parse("```{r regression, eval=FALSE, echo=false}\nx\n```\n");
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.label.as_deref(), Some("regression"));
    assert!(!code.execute);
    assert!(!code.echo);
}

#[test]
fn unknown_fence_options_are_ignored() {
    let doc = parse("```{python, warning=false}\nprint(1)\n```\n");
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert!(code.execute);
}

#[test]
fn bad_fence_option_value() {
    let errors = parse_err("```{r, eval=maybe}\nx\n```\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidOptions);
}

#[test]
fn unclosed_fence_braces() {
    let errors = parse_err("```{r\nx\n```\n");
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidOptions);
}

#[test]
fn unterminated_fence() {
    let errors = parse_err("before\n\n```stan\nmodel {}\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedFence);
    assert_eq!(errors[0].span.end, "before\n\n```stan\nmodel {}\n".len());
}

#[test]
fn longer_fence_can_contain_backticks() {
    let doc = parse("````\n```\ninner\n```\n````\n");
    assert_eq!(doc.blocks.len(), 1);
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.text, "```\ninner\n```\n");
}

#[test]
fn include_directive() {
    let doc = parse("Intro.\n\n<<models/regression.stan>>\n\nOutro.\n");
    assert_eq!(doc.blocks.len(), 3);
    let Block::Include { path, .. } = &doc.blocks[1] else {
        panic!("expected include, got {:?}", doc.blocks[1]);
    };
    assert_eq!(path, "models/regression.stan");
}

#[test]
fn malformed_directive_missing_terminator() {
    let errors = parse_err("<<models/regression.stan\n");
    assert_eq!(errors[0].kind, ParseErrorKind::MalformedDirective);
}

#[test]
fn malformed_directive_empty_path() {
    let errors = parse_err("<<>>\n");
    assert_eq!(errors[0].kind, ParseErrorKind::MalformedDirective);
}

#[test]
fn directive_inside_fence_is_literal() {
    let doc = parse("```\n<<not-an-include>>\n```\n");
    assert_eq!(doc.blocks.len(), 1);
    let Block::Code(code) = &doc.blocks[0] else {
        panic!("expected code block");
    };
    assert_eq!(code.text, "<<not-an-include>>\n");
}

#[test]
fn frontmatter_options() {
    let source = "---\ncache = true\ndigits = 3\ncode_folding = \"hide\"\ncomment = \"##\"\n---\n\nBody.\n";
    let doc = parse(source);
    assert!(doc.options.cache);
    assert_eq!(doc.options.digits, 3);
    assert_eq!(doc.options.code_folding, CodeFolding::Hide);
    assert_eq!(doc.options.comment, "##");
    assert_eq!(doc.blocks.len(), 1);
}

#[test]
fn options_default_when_no_frontmatter() {
    let doc = parse("Body.\n");
    assert_eq!(doc.options, Options::default());
}

#[test]
fn invalid_frontmatter() {
    let errors = parse_err("---\ndigits = \"many\"\n---\n\nBody.\n");
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidOptions);
}

#[test]
fn unterminated_frontmatter() {
    let errors = parse_err("---\ncache = true\n\nBody with no closing delimiter.\n");
    assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedFrontMatter);
}

#[test]
fn block_order_is_preserved() {
    let doc = parse("A\n\n```stan\nm\n```\n\nB\n\n<<f.stan>>\n");
    let kinds: Vec<&str> = doc
        .blocks
        .iter()
        .map(|b| match b {
            Block::Prose { .. } => "prose",
            Block::Code(_) => "code",
            Block::Include { .. } => "include",
        })
        .collect();
    assert_eq!(kinds, ["prose", "code", "prose", "include"]);
}

#[test]
fn all_errors_are_collected() {
    let errors = parse_err("<<a\n\nmiddle\n\n<<b\n");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind == ParseErrorKind::MalformedDirective));
}

#[test]
fn spans_cover_their_blocks() {
    let source = "prose\n\n```stan\nm\n```\n";
    let doc = parse(source);
    let Block::Code(code) = &doc.blocks[1] else {
        panic!("expected code block");
    };
    assert_eq!(&source[code.span.clone()], "```stan\nm\n```");
}
