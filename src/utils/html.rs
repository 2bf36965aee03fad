use scraper::{ElementRef, Selector};

use crate::error::{ScrapeError, ScrapeResult};
use crate::utils::text::sanitize_text;

/// Selectors are compile-time literals; a parse failure is a programming
/// error, not a data error.
pub fn selector(selectors: &str) -> Selector {
    Selector::parse(selectors).unwrap()
}

pub fn select_first<'a>(el: ElementRef<'a>, selectors: &str) -> Option<ElementRef<'a>> {
    el.select(&selector(selectors)).next()
}

pub fn select_all<'a>(el: ElementRef<'a>, selectors: &str) -> Vec<ElementRef<'a>> {
    el.select(&selector(selectors)).collect()
}

/// Required lookup. The selector doubles as the field name in the error so
/// markup drift points straight at the broken query.
pub fn require_first<'a>(
    el: ElementRef<'a>,
    selectors: &str,
    parser: &'static str,
) -> ScrapeResult<ElementRef<'a>> {
    select_first(el, selectors).ok_or_else(|| ScrapeError::structure(parser, selectors))
}

pub fn require_text(
    el: ElementRef<'_>,
    selectors: &str,
    parser: &'static str,
) -> ScrapeResult<String> {
    let text = text_of(require_first(el, selectors, parser)?);
    if text.is_empty() {
        return Err(ScrapeError::structure(parser, selectors));
    }
    Ok(text)
}

pub fn optional_text(el: ElementRef<'_>, selectors: &str) -> Option<String> {
    let text = text_of(select_first(el, selectors)?);
    if text.is_empty() {
        return None;
    }
    Some(text)
}

pub fn require_attr(
    el: ElementRef<'_>,
    selectors: &str,
    attr: &str,
    parser: &'static str,
) -> ScrapeResult<String> {
    require_first(el, selectors, parser)?
        .attr(attr)
        .map(|v| v.trim().to_owned())
        .ok_or_else(|| ScrapeError::structure(parser, format!("{selectors}[{attr}]")))
}

pub fn optional_attr(el: ElementRef<'_>, selectors: &str, attr: &str) -> Option<String> {
    select_first(el, selectors)?
        .attr(attr)
        .map(|v| v.trim().to_owned())
}

/// All text nodes of the subtree, whitespace-collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    sanitize_text(&el.text().collect::<Vec<_>>().join(""))
}
