use scraper::{Html, Selector};

/// Upper bound on extracted text passed to the language model, to stay
/// within token limits.
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Lightweight readability-like text extraction:
/// - returns `<article>` text if present
/// - otherwise `<body>` text
/// - fallback to the text of the whole document.
///
/// Whitespace runs are collapsed. The result still contains boilerplate;
/// the relevance-extraction step downstream filters it against the query.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let article_sel = Selector::parse("article").ok();
    let body_sel = Selector::parse("body").ok();

    let raw = article_sel
        .as_ref()
        .and_then(|sel| doc.select(sel).next())
        .or_else(|| body_sel.as_ref().and_then(|sel| doc.select(sel).next()))
        .map(|node| node.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|| doc.root_element().text().collect::<Vec<_>>().join(" "));

    collapse_whitespace(&raw)
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
