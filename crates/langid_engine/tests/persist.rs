use std::fs;

use langid_core::LabeledSnippet;
use langid_engine::{
    ensure_output_dir, read_corpus, AtomicFileWriter, CorpusWriter, PersistError,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("nested").join("tokens.jsonl"));

    let first = writer.write("hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "tokens.jsonl");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
    assert_eq!(fs::read_dir(temp.path().join("nested")).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.join("tokens.jsonl"));
    let result = writer.write("data");
    assert!(matches!(result, Err(PersistError::OutputDir { .. })));
    assert!(!file_path.with_file_name("tokens.jsonl").exists());
}

#[test]
fn corpus_writer_truncates_and_rewrites_header() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data").join("corpus.csv");

    let mut writer = CorpusWriter::create(&path).unwrap();
    writer
        .append(&LabeledSnippet::new("C", "int main() { return 0; }"))
        .unwrap();
    assert_eq!(writer.finish().unwrap(), 1);

    let writer = CorpusWriter::create(&path).unwrap();
    assert_eq!(writer.finish().unwrap(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "language,code\n");
}

#[test]
fn corpus_rows_read_back_with_escaped_commas() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("corpus.csv");

    let mut writer = CorpusWriter::create(&path).unwrap();
    writer
        .append(&LabeledSnippet::new("Python", "print ( a, b ) br x = \"q\""))
        .unwrap();
    writer.append(&LabeledSnippet::new("Go", "x := 1")).unwrap();
    writer.finish().unwrap();

    let rows = read_corpus(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].label, "Python");
    assert_eq!(
        rows[0].raw_text,
        "print ( a!@#$%^&&^%$#@! b ) br x = \"q\""
    );
    assert_eq!(rows[1], LabeledSnippet::new("Go", "x := 1"));
}
