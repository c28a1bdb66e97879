//! Keyword export file tests
//!
//! Covers reading and writing the catalog's tab-indented keyword files on
//! disk, including CRLF line endings and lenient indentation.

use photokw_common::keywords::indented::{read_keyword_file, write_keyword_file};
use photokw_common::{Error, KeywordPath, KeywordTree};
use tempfile::TempDir;

fn tree_of(items: &[&str]) -> KeywordTree {
    let paths: Vec<KeywordPath> = items.iter().map(|s| s.parse().unwrap()).collect();
    KeywordTree::from_paths(&paths)
}

#[test]
fn test_write_uses_crlf_line_endings() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("keywords.txt");

    write_keyword_file(&target, &tree_of(&["People|Family|Jane", "Sunset"])).unwrap();

    let bytes = std::fs::read(&target).unwrap();
    assert_eq!(bytes, b"People\r\n\tFamily\r\n\t\tJane\r\nSunset\r\n");
}

#[test]
fn test_write_then_read_gives_same_tree() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("keywords.txt");
    let tree = tree_of(&[
        "Events|2023|Summer Trip",
        "People|Family|Jane Doe",
        "People|Friends|John Smith",
        "Places|Canada|Ontario|Ottawa",
    ]);

    write_keyword_file(&target, &tree).unwrap();
    assert_eq!(read_keyword_file(&target).unwrap(), tree);
}

#[test]
fn test_read_catalog_export_with_lf_endings() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("export.txt");
    std::fs::write(&target, "People\n\tFamily\n\t\tJane Doe\n\tJohn\nTravel\n").unwrap();

    let tree = read_keyword_file(&target).unwrap();
    let paths: Vec<String> = tree.to_paths().iter().map(ToString::to_string).collect();
    assert_eq!(paths, vec!["People|Family|Jane Doe", "People|John", "Travel"]);
}

#[test]
fn test_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = read_keyword_file(&temp_dir.path().join("nope.txt")).unwrap_err();
    assert!(matches!(err, Error::KeywordFile(_)));
}
