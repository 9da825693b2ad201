use crate::normalize::COMMA_SENTINEL;

/// Trailing affordance the wiki appends to section headings.
pub const EDIT_SUFFIX: &str = "[edit]";

/// Captions shorter than this that mention "output" introduce program output, not code.
pub const OUTPUT_CAPTION_MAX_LEN: usize = 10;

/// One harvested code block and its language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSnippet {
    pub label: String,
    /// Code text with commas already replaced by the sentinel.
    pub raw_text: String,
}

impl LabeledSnippet {
    pub fn new(label: impl Into<String>, code: &str) -> Self {
        Self {
            label: label.into(),
            raw_text: escape_commas(code),
        }
    }
}

pub fn escape_commas(code: &str) -> String {
    code.replace(',', COMMA_SENTINEL)
}

/// Language name from a section heading's text.
pub fn heading_label(heading_text: &str) -> String {
    let trimmed = heading_text.trim();
    trimmed
        .strip_suffix(EDIT_SUFFIX)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Best-effort test for short "Output:" style captions.
///
/// Long captions that merely mention output are treated as code captions.
pub fn is_output_caption(caption: &str) -> bool {
    let lowered = caption.to_lowercase();
    lowered.contains("output") && lowered.chars().count() < OUTPUT_CAPTION_MAX_LEN
}

/// Why a code block was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockVerdict {
    Kept,
    Unregistered,
    OutputCaption,
    /// No heading or caption could be found for the block.
    Mismatch,
}

/// Per-page extraction result handed from a worker to the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    PageFailed,
    PageScanned { verdicts: Vec<BlockVerdict> },
}

/// Aggregate counts reported at the end of a harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HarvestSummary {
    pub tasks: usize,
    pub failed_tasks: usize,
    pub snippets: usize,
    pub skipped_unregistered: usize,
    pub skipped_output: usize,
    pub skipped_mismatch: usize,
}

impl HarvestSummary {
    pub fn apply(&mut self, event: &HarvestEvent) {
        self.tasks += 1;
        match event {
            HarvestEvent::PageFailed => self.failed_tasks += 1,
            HarvestEvent::PageScanned { verdicts } => {
                for verdict in verdicts {
                    match verdict {
                        BlockVerdict::Kept => self.snippets += 1,
                        BlockVerdict::Unregistered => self.skipped_unregistered += 1,
                        BlockVerdict::OutputCaption => self.skipped_output += 1,
                        BlockVerdict::Mismatch => self.skipped_mismatch += 1,
                    }
                }
            }
        }
    }
}
