//! Markdown rendering.
//!
//! Bodies are rendered with [pulldown-cmark](https://docs.rs/pulldown-cmark)
//! using the GitHub-flavoured extensions writers expect: tables,
//! strikethrough, task lists and footnotes. Headings get no generated ids.

use pulldown_cmark::{Options, Parser, html as md_html};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Render a Markdown body to an HTML fragment.
pub fn markdown_to_html(body: &str) -> String {
    let parser = Parser::new_ext(body, options());
    let mut html = String::with_capacity(body.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}
