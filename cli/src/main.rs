use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use renderer::markdown::escape_html;
use renderer::{CommandEvaluator, DiagnosticError, Renderer};
use weave::block::Block;

const SUBCOMMANDS: &[&str] = &["render", "clean", "help"];

#[derive(Parser)]
#[command(name = "weave", version, about = "Literate document renderer")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a literate document to HTML
    Render(RenderArgs),

    /// Delete the fragment cache for a document
    Clean(CleanArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Literate source file to render
    file: String,

    /// Output path (default: source path with an .html extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// List parsed blocks
    #[arg(long)]
    blocks: bool,

    /// Dump the parsed document
    #[arg(long)]
    ast: bool,

    /// Force the fragment cache on, overriding the frontmatter
    #[arg(long, conflicts_with = "no_cache")]
    cache: bool,

    /// Force the fragment cache off
    #[arg(long)]
    no_cache: bool,

    /// Cache directory (default: sibling <stem>_cache directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Interpreter mapping for executable blocks. Repeatable.
    #[arg(short, long = "evaluator", value_name = "LANG=CMD")]
    evaluator: Vec<String>,
}

#[derive(clap::Args)]
struct CleanArgs {
    /// Literate source file whose cache to delete
    file: String,

    /// Cache directory (default: sibling <stem>_cache directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

fn main() {
    // Backwards compatibility: if the first positional arg is not a known
    // subcommand, inject "render" so `weave file.md` works like
    // `weave render file.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first_pos) = args.iter().skip(1).find(|a| !a.starts_with('-')) {
        let first_pos = first_pos.clone();
        if !SUBCOMMANDS.contains(&first_pos.as_str()) {
            let pos = args.iter().position(|a| *a == first_pos).unwrap();
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Clean(clean_args) => do_clean(clean_args),
    }
}

fn do_render(args: RenderArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    // Read source
    let source = match fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    // Parse
    let parser = weave::parser::Parser::new(source, file_id);
    let document = match parser.parse() {
        Ok(d) => d,
        Err(errors) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    // --check: parse succeeded, exit
    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    // --ast: dump the parsed document
    if args.ast {
        println!("{:#?}", document);
        return;
    }

    // --blocks: print one line per block
    if args.blocks {
        for block in &document.blocks {
            match block {
                Block::Prose { text, .. } => println!("prose    {} bytes", text.len()),
                Block::Code(code) => {
                    let lang = code.language.as_deref().unwrap_or("-");
                    let kind = if code.execute { "execute" } else { "display" };
                    match &code.label {
                        Some(label) => println!("code     {} [{}] {}", kind, lang, label),
                        None => println!("code     {} [{}]", kind, lang),
                    }
                }
                Block::Include { path, .. } => println!("include  {}", path),
            }
        }
        return;
    }

    // Apply command-line overrides on top of the frontmatter options
    let mut options = document.options.clone();
    if args.cache {
        options.cache = true;
    }
    if args.no_cache {
        options.cache = false;
    }

    // Configure the external-command evaluator
    let mut evaluator = CommandEvaluator::new();
    for spec in &args.evaluator {
        match CommandEvaluator::parse_mapping(spec) {
            Some((language, argv)) => evaluator.insert(language, argv),
            None => {
                eprintln!(
                    "error: invalid evaluator mapping '{}' (expected LANG=CMD)",
                    spec
                );
                process::exit(1);
            }
        }
    }

    // Base directory for resolving includes
    let input = Path::new(&args.file);
    let base_dir = input
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| default_cache_dir(input));

    // Render
    let result = Renderer::new(&options, &base_dir, &mut evaluator)
        .with_cache_dir(cache_dir)
        .render(&document);

    let rendered = match result {
        Ok(rendered) => rendered,
        Err(error) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            emit_render_error(&writer, &config, &files, &error);
            process::exit(1);
        }
    };

    // Write the output file only after the full render succeeded
    let out_path = args
        .output
        .unwrap_or_else(|| input.with_extension("html"));
    if out_path == input {
        eprintln!(
            "error: output path '{}' equals the input; pass -o",
            out_path.display()
        );
        process::exit(1);
    }

    let page = html_page(rendered.title.as_deref(), &rendered.html());
    if let Err(e) = fs::write(&out_path, page) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    eprintln!("wrote {}", out_path.display());
}

fn do_clean(args: CleanArgs) {
    let dir = args
        .cache_dir
        .unwrap_or_else(|| default_cache_dir(Path::new(&args.file)));
    if !dir.exists() {
        eprintln!("no cache at {}", dir.display());
        return;
    }
    match fs::remove_dir_all(&dir) {
        Ok(()) => eprintln!("removed {}", dir.display()),
        Err(e) => {
            eprintln!("error: cannot remove '{}': {}", dir.display(), e);
            process::exit(1);
        }
    }
}

/// Cache directory derived from the input name: `chapter.md` caches
/// into a sibling `chapter_cache/`.
fn default_cache_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("weave");
    input
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!("{}_cache", stem))
}

fn html_page(title: Option<&str>, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title.unwrap_or("Document")),
        body
    )
}

fn emit_render_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    error: &DiagnosticError,
) {
    if let Some(span) = &error.span {
        let diagnostic = Diagnostic::new(Severity::Error)
            .with_message(error.to_string())
            .with_labels(vec![Label::primary(error.source_id, span.clone())]);
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    } else {
        eprintln!("render error: {}", error);
    }
}
