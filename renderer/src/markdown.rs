use pulldown_cmark::{Event, HeadingLevel, Options as CmarkOptions, Parser, Tag, TagEnd, html};

fn markdown_options() -> CmarkOptions {
    CmarkOptions::ENABLE_STRIKETHROUGH | CmarkOptions::ENABLE_TABLES
}

/// Render a prose block's markdown to HTML.
pub fn prose_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Extract the text of the first top-level heading, if any.
pub fn extract_title(markdown: &str) -> Option<String> {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut in_title = false;
    let mut title = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_title = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                return if title.is_empty() { None } else { Some(title) };
            }
            Event::Text(s) if in_title => title.push_str(&s),
            Event::Code(s) if in_title => title.push_str(&s),
            _ => {}
        }
    }
    None
}

/// Escape text for embedding in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
