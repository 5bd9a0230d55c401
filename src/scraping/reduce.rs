use scraper::{Html, Selector};

/// Shrinks a page to its `<body>` markup before it is sent for extraction.
///
/// The HTML5 parser synthesizes a body for ordinary documents, so the
/// whole-document fallback only triggers for frameset pages.
pub fn reduce_to_body(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next().map(|b| b.html()));

    body.unwrap_or_else(|| document.root_element().html())
}
