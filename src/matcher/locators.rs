use scraper::Html;

use crate::utils::html::{AttrValue, DOMProcessor, ScopeProcessor, TextValue};

/// `src` of the first frame, for pages that only wrap the real content.
pub fn match_iframe(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    AttrValue::new("src")
        .in_scope("iframe")
        .process(&document.root_element())
        .filter(|src| !src.is_empty())
}

/// Text of the "file cancelled / unavailable" banner, empty on normal pages.
pub fn parse_error_page(html: &str) -> String {
    let document = Html::parse_document(html);
    TextValue::new()
        .all_nodes()
        .itr_scope(".off")
        .map(|texts| texts.join(""))
        .process(&document.root_element())
}

/// Inline `onclick` of the first `div` inside `target`.
pub(crate) fn click_handler(html: &str, target: &str) -> Option<String> {
    let processor = ScopeProcessor::<String>::try_new(
        &format!("{target} div"),
        AttrValue::new("onclick").into(),
    )?;
    let document = Html::parse_document(html);
    processor
        .process(&document.root_element())
        .filter(|handler| !handler.is_empty())
}
