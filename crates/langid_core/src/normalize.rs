use serde::Deserialize;
use thiserror::Error;

/// Stand-in for `,` inside persisted corpus rows.
pub const COMMA_SENTINEL: &str = "!@#$%^&&^%$#@!";

/// Word that marks a line break in raw text (from `<br>` elements or file lines).
pub const BREAK_MARKER: &str = "br";

/// Token emitted in place of an interior break marker.
pub const DEFAULT_LINE_BREAK_TOKEN: &str = "\n";

/// Canonical token representation of one input.
pub type TokenSequence = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerMode {
    /// Words, isolated punctuation and line-break tokens.
    #[default]
    Tokens,
    /// Printable text with every break marker and whitespace removed, as a single token.
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub mode: NormalizerMode,
    pub line_break_token: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            mode: NormalizerMode::Tokens,
            line_break_token: DEFAULT_LINE_BREAK_TOKEN.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizerError {
    #[error("line_break_token must not be empty")]
    EmptyLineBreakToken,
    #[error("line_break_token {token:?} contains {ch:?}, which normalization would split off")]
    SplittableLineBreakToken { token: String, ch: char },
}

impl NormalizerConfig {
    /// Reject line-break tokens that would not survive a second normalization pass.
    ///
    /// Spaces and punctuation get split apart and non-printable characters get dropped,
    /// so only words and non-space whitespace such as `"\n"` are accepted.
    pub fn validate(&self) -> Result<(), NormalizerError> {
        let token = &self.line_break_token;
        if token.is_empty() {
            return Err(NormalizerError::EmptyLineBreakToken);
        }
        let bad = token
            .chars()
            .find(|ch| *ch == ' ' || ch.is_ascii_punctuation() || !is_printable(*ch));
        match bad {
            Some(ch) => Err(NormalizerError::SplittableLineBreakToken {
                token: token.clone(),
                ch,
            }),
            None => Ok(()),
        }
    }
}

/// Deterministic text-to-token transform shared by corpus building and inference.
///
/// The pipeline is:
/// 1. restore commas escaped with [`COMMA_SENTINEL`]
/// 2. drop everything outside the ASCII printable set (space, tab, CR, LF, VT, FF and graphic)
/// 3. surround each ASCII punctuation character with spaces
/// 4. collapse runs of spaces
/// 5. split on any whitespace; a space-delimited line-break token stays one piece
/// 6. turn a `br` with whitespace on both sides into the line-break token, drop empty pieces
///
/// Inputs without any visible character normalize to an empty sequence.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

enum Piece<'a> {
    Word(&'a str),
    Break,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize raw bytes; invalid UTF-8 is replaced and then discarded as non-printable.
    pub fn normalize_bytes(&self, raw: &[u8]) -> TokenSequence {
        self.normalize(&String::from_utf8_lossy(raw))
    }

    pub fn normalize(&self, raw: &str) -> TokenSequence {
        let unescaped = raw.replace(COMMA_SENTINEL, ",");
        let printable: String = unescaped.chars().filter(|ch| is_printable(*ch)).collect();
        let tokens = match self.config.mode {
            NormalizerMode::Tokens => {
                let spaced = collapse_spaces(&isolate_punctuation(&printable));
                let line_break = self.config.line_break_token.as_str();
                self.pieces(&spaced)
                    .into_iter()
                    .map(|piece| match piece {
                        Piece::Word(word) => word,
                        Piece::Break => line_break,
                    })
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            NormalizerMode::Compact => {
                let joined: String = self
                    .pieces(&collapse_spaces(&printable))
                    .into_iter()
                    .filter_map(|piece| match piece {
                        Piece::Word(word) => Some(word),
                        Piece::Break => None,
                    })
                    .collect();
                if joined.is_empty() {
                    Vec::new()
                } else {
                    vec![joined]
                }
            }
        };
        if tokens.iter().all(|token| token.trim().is_empty()) {
            return Vec::new();
        }
        tokens
    }

    fn pieces<'a>(&self, spaced: &'a str) -> Vec<Piece<'a>> {
        let line_break = self.config.line_break_token.as_str();
        let mut split: Vec<Piece<'a>> = Vec::new();
        for chunk in spaced.split(' ') {
            if !line_break.is_empty() && chunk == line_break {
                split.push(Piece::Break);
            } else {
                split.extend(chunk.split(char::is_whitespace).map(Piece::Word));
            }
        }
        // A marker only counts when whitespace sits on both sides, i.e. it is neither the
        // first nor the last piece. Adjacent markers share their separators.
        let last = split.len().saturating_sub(1);
        split
            .into_iter()
            .enumerate()
            .filter_map(|(idx, piece)| match piece {
                Piece::Word(BREAK_MARKER) if idx > 0 && idx < last => Some(Piece::Break),
                Piece::Word("") => None,
                other => Some(other),
            })
            .collect()
    }
}

/// Join the lines of a file with the break marker so line structure survives normalization.
///
/// Both `\n` and `\r\n` terminate a line; a final terminator adds no marker.
pub fn mark_line_breaks(text: &str) -> String {
    let spaced = format!(" {BREAK_MARKER} ");
    text.lines().collect::<Vec<_>>().join(&spaced)
}

pub fn is_printable(ch: char) -> bool {
    ch.is_ascii_graphic() || matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

fn isolate_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if ch.is_ascii_punctuation() {
            out.push(' ');
            out.push(ch);
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(ch);
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}
