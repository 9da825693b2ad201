use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

/// Element holding the task links on the category page.
pub const INDEX_CONTAINER: &str = "div#mw-pages";

/// Every link target inside the index container, in document order, first occurrence only.
///
/// Fragment-only, query-only and `javascript:` targets are skipped. A page without the
/// container yields no paths.
pub fn task_paths_from_html(html: &str) -> Vec<String> {
    let (Ok(container_sel), Ok(anchor_sel)) =
        (Selector::parse(INDEX_CONTAINER), Selector::parse("a[href]"))
    else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let Some(container) = document.select(&container_sel).next() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    container
        .select(&anchor_sel)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable(href))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

fn is_followable(href: &str) -> bool {
    if href.is_empty() {
        return false;
    }
    let lower = href.to_ascii_lowercase();
    !(lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:"))
}

/// Resolve a task path against the site root; absolute URLs pass through.
pub fn resolve_task_url(base: &Url, path: &str) -> Option<Url> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.join(trimmed).ok()
}
