use ego_tree::NodeRef;
use langid_core::{
    heading_label, is_output_caption, BlockVerdict, LabeledSnippet, LanguageRegistry, BREAK_MARKER,
};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Element holding every language section of a task page.
pub const CONTENT_CONTAINER: &str = "div#mw-content-text";

/// Marker carried in the `class` attribute of syntax-highlighted code blocks.
pub const HIGHLIGHT_CLASS_MARKER: &str = "highlighted_source";

const HEADING_TAG: &str = "h2";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("page has no {0} element")]
    MissingContainer(&'static str),
    #[error("invalid selector {0}")]
    Selector(&'static str),
}

/// Snippets kept from one page plus a verdict for every code block seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub snippets: Vec<LabeledSnippet>,
    pub verdicts: Vec<BlockVerdict>,
}

/// Pull labeled code blocks out of a task page.
///
/// A block is labeled by the nearest `h2` before it, must be in `registry`, and must not
/// follow a short "Output" caption. Blocks whose heading or caption cannot be found are
/// dropped; the rest of the page is still processed.
pub fn extract_snippets_from_html(
    html: &str,
    registry: &LanguageRegistry,
) -> Result<PageExtraction, ExtractError> {
    let container_sel = selector(CONTENT_CONTAINER)?;
    let pre_sel = selector("pre[class]")?;

    let document = Html::parse_document(html);
    let container = document
        .select(&container_sel)
        .next()
        .ok_or(ExtractError::MissingContainer(CONTENT_CONTAINER))?;

    let mut page = PageExtraction::default();
    for block in container.select(&pre_sel).filter(is_highlighted) {
        let (verdict, snippet) = judge_block(block, registry);
        page.verdicts.push(verdict);
        if let Some(snippet) = snippet {
            page.snippets.push(snippet);
        }
    }
    Ok(page)
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

fn is_highlighted(element: &ElementRef) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.contains(HIGHLIGHT_CLASS_MARKER))
}

fn judge_block(
    block: ElementRef,
    registry: &LanguageRegistry,
) -> (BlockVerdict, Option<LabeledSnippet>) {
    let Some(heading) = preceding_heading(*block) else {
        return (BlockVerdict::Mismatch, None);
    };
    let label = heading_label(&heading.text().collect::<String>());
    if !registry.contains(&label) {
        return (BlockVerdict::Unregistered, None);
    }
    let Some(caption) = preceding_caption(*block) else {
        return (BlockVerdict::Mismatch, None);
    };
    if is_output_caption(&caption) {
        return (BlockVerdict::OutputCaption, None);
    }
    let code = reconstruct_code(block);
    (BlockVerdict::Kept, Some(LabeledSnippet::new(label, &code)))
}

/// Nearest `h2` that starts before `node` in document order, ancestors included.
fn preceding_heading(node: NodeRef<'_, Node>) -> Option<ElementRef<'_>> {
    let mut current = node;
    loop {
        for sibling in current.prev_siblings() {
            if let Some(heading) = last_heading_within(sibling) {
                return Some(heading);
            }
        }
        current = current.parent()?;
        if is_tag(current, HEADING_TAG) {
            return ElementRef::wrap(current);
        }
    }
}

fn last_heading_within(node: NodeRef<'_, Node>) -> Option<ElementRef<'_>> {
    node.descendants()
        .filter(|candidate| is_tag(*candidate, HEADING_TAG))
        .last()
        .and_then(ElementRef::wrap)
}

fn is_tag(node: NodeRef<'_, Node>, tag: &str) -> bool {
    matches!(node.value(), Node::Element(element) if element.name().eq_ignore_ascii_case(tag))
}

/// Text of the closest previous sibling, skipping whitespace-only text and comments.
fn preceding_caption(node: NodeRef<'_, Node>) -> Option<String> {
    node.prev_siblings().find_map(|sibling| match sibling.value() {
        Node::Text(text) if text.trim().is_empty() => None,
        Node::Text(text) => Some(text.to_string()),
        Node::Element(_) => ElementRef::wrap(sibling).map(|el| el.text().collect()),
        _ => None,
    })
}

/// Children in order: text verbatim, `<br>` as the break marker, other elements flattened.
fn reconstruct_code(block: ElementRef) -> String {
    let parts: Vec<String> = block
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(text.to_string()),
            Node::Element(element) if element.name().eq_ignore_ascii_case("br") => {
                Some(BREAK_MARKER.to_string())
            }
            Node::Element(_) => ElementRef::wrap(child).map(|el| el.text().collect()),
            _ => None,
        })
        .collect();
    parts.join(" ")
}
