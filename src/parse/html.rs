use encoding_rs::Encoding;
use scraper::{Html, Selector};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::ParseError;

/// Bytes inspected when deciding whether a body is text at all
const SNIFF_WINDOW: usize = 1024;

fn href_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    // Any element with an href, not only anchors: <link> and <area> count too.
    SELECTOR.get_or_init(|| Selector::parse("[href]").expect("static selector is valid"))
}

/// Decode a fetched body as page text.
///
/// A byte order mark selects its encoding (UTF-8, UTF-16LE or UTF-16BE).
/// Without one the body is read as UTF-8, replacing invalid sequences, unless
/// NUL bytes near the start show it is binary content rather than text.
pub fn decode_page<'a>(url: &str, body: &'a [u8]) -> Result<Cow<'a, str>, ParseError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(body) {
        let (text, _) = encoding.decode_without_bom_handling(&body[bom_len..]);
        return Ok(text);
    }

    let window = body.len().min(SNIFF_WINDOW);
    let nul_bytes = body[..window].iter().filter(|b| **b == 0).count();
    if nul_bytes > 0 {
        return Err(ParseError::Binary {
            url: url.to_string(),
            nul_bytes,
            window,
        });
    }
    Ok(String::from_utf8_lossy(body))
}

/// Absolute links on the page: `href` values that start with `http`, trimmed
pub fn extract_links(document: &Html) -> HashSet<String> {
    document
        .select(href_selector())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.starts_with("http"))
        .map(str::to_string)
        .collect()
}

/// Whether the rendered text of the page contains `needle` verbatim
pub fn contains_keyword(document: &Html, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let text: String = document.root_element().text().collect();
    text.contains(needle)
}
