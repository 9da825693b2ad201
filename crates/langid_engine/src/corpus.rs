use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use langid_core::LabeledSnippet;
use thiserror::Error;

use crate::persist::{ensure_output_dir, parent_dir, PersistError};

pub const CORPUS_HEADER: [&str; 2] = ["language", "code"];

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Row numbers count data rows from 1; the header line is row 0.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("io error reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corpus header should be `language,code`")]
    BadHeader,
    #[error("row {row} has {fields} fields, expected 2")]
    FieldCount { row: usize, fields: usize },
    #[error("unterminated quoted field in row {row}")]
    UnterminatedQuote { row: usize },
}

/// Append-only corpus file; every row reaches the file in a single write.
///
/// Opening truncates any previous corpus and writes the header again.
pub struct CorpusWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl CorpusWriter {
    pub fn create(path: &Path) -> Result<Self, PersistError> {
        ensure_output_dir(&parent_dir(path))?;
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(encode_record(&CORPUS_HEADER).as_bytes())?;
        out.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            out,
            rows: 0,
        })
    }

    pub fn append(&mut self, snippet: &LabeledSnippet) -> Result<(), PersistError> {
        let row = encode_record(&[snippet.label.as_str(), snippet.raw_text.as_str()]);
        self.out.write_all(row.as_bytes())?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and sync; returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize, PersistError> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(self.rows)
    }
}

/// One CSV record with minimal quoting, terminated by `\n`.
pub fn encode_record(fields: &[&str]) -> String {
    let mut line = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            line.push(DELIMITER);
        }
        if field.contains([DELIMITER, QUOTE, '\n', '\r']) {
            line.push(QUOTE);
            line.push_str(&field.replace(QUOTE, "\"\""));
            line.push(QUOTE);
        } else {
            line.push_str(field);
        }
    }
    line.push('\n');
    line
}

pub fn read_corpus(path: &Path) -> Result<Vec<LabeledSnippet>, CorpusError> {
    let text = fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_corpus(&text)
}

/// Parse corpus text back into snippets; row bodies keep their comma sentinel.
pub fn parse_corpus(text: &str) -> Result<Vec<LabeledSnippet>, CorpusError> {
    let mut records = parse_records(text)?.into_iter();
    match records.next() {
        Some(header) if header == CORPUS_HEADER => {}
        None => return Ok(Vec::new()),
        Some(_) => return Err(CorpusError::BadHeader),
    }
    records
        .enumerate()
        .map(|(idx, mut fields)| {
            if fields.len() != 2 {
                return Err(CorpusError::FieldCount {
                    row: idx + 1,
                    fields: fields.len(),
                });
            }
            let raw_text = fields.pop().unwrap_or_default();
            let label = fields.pop().unwrap_or_default();
            Ok(LabeledSnippet { label, raw_text })
        })
        .collect()
}

fn parse_records(text: &str) -> Result<Vec<Vec<String>>, CorpusError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            QUOTE if field.is_empty() => in_quotes = true,
            DELIMITER => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            _ => field.push(ch),
        }
    }
    if in_quotes {
        // records already closed include the header, so their count is the open row's number
        return Err(CorpusError::UnterminatedQuote {
            row: records.len(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    Ok(records)
}
