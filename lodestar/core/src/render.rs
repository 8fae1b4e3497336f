use pulldown_cmark::{html, Options, Parser};

/// Render a Markdown report to HTML.
///
/// Tables and strikethrough are enabled because generated reports regularly
/// use them; everything else stays CommonMark.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
