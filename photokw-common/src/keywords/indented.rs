//! Tab-indented keyword files
//!
//! The catalog exports its keyword list as one topic per line, with the
//! nesting depth given by the number of leading tab characters:
//!
//! ```text
//! People
//! 	Family
//! 		Jane Doe
//! Places
//! ```
//!
//! Files are written with CRLF line endings.

use super::KeywordTree;
use crate::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Line terminator used when writing keyword files
pub const LINE_ENDING: &str = "\r\n";

/// Depth-first pre-order rendering, children in sorted topic order
pub fn tree_to_lines(tree: &KeywordTree) -> Vec<String> {
    let mut lines = Vec::new();
    push_lines(tree, 0, &mut lines);
    lines
}

fn push_lines(tree: &KeywordTree, depth: usize, lines: &mut Vec<String>) {
    for (topic, node) in tree.iter() {
        lines.push(format!("{}{}", "\t".repeat(depth), topic));
        if let Some(child) = node {
            push_lines(child, depth + 1, lines);
        }
    }
}

/// Parse tab-indented lines back into a tree
///
/// A line deeper than the line before it attaches below that line's topic,
/// however many tabs deeper it is. A line no deeper than the previous one but
/// deeper than the enclosing topic is a sibling. Blank lines are skipped.
pub fn lines_to_tree<S: AsRef<str>>(lines: &[S]) -> KeywordTree {
    let entries: Vec<(usize, &str)> = lines
        .iter()
        .map(|line| line.as_ref().trim_end_matches(['\r', '\n']))
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let depth = line.chars().take_while(|c| *c == '\t').count();
            (depth, line.trim())
        })
        .collect();

    let (tree, _) = parse_level(&entries, 0, None);
    tree
}

/// Consume one level of entries starting from `pos`
///
/// Parsing stops at the first entry no deeper than `parent_depth`. Returns
/// the parsed level and the position of the first unconsumed entry.
fn parse_level(
    entries: &[(usize, &str)],
    mut pos: usize,
    parent_depth: Option<usize>,
) -> (KeywordTree, usize) {
    let mut tree = KeywordTree::new();
    // depth and topic of the last line consumed at this level
    let mut last: Option<(usize, &str)> = None;

    while pos < entries.len() {
        let (depth, topic) = entries[pos];

        if parent_depth.is_some_and(|parent| depth <= parent) {
            break;
        }

        match last {
            Some((last_depth, parent)) if depth > last_depth => {
                let (child, next) = parse_level(entries, pos, Some(last_depth));
                tree.add_branch(parent.to_string(), child);
                pos = next;
            }
            _ => {
                tree.add_leaf(topic.to_string());
                last = Some((depth, topic));
                pos += 1;
            }
        }
    }

    (tree, pos)
}

/// Render a tree as keyword file text (CRLF line endings)
pub fn render(tree: &KeywordTree) -> String {
    let mut text = tree_to_lines(tree).join(LINE_ENDING);
    if !text.is_empty() {
        text.push_str(LINE_ENDING);
    }
    text
}

/// Read a keyword export file into a tree
pub fn read_keyword_file(path: &Path) -> Result<KeywordTree> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::KeywordFile(format!("failed to read {}: {}", path.display(), e))
    })?;
    let lines: Vec<&str> = content.lines().collect();
    let tree = lines_to_tree(&lines);
    debug!("Read {} top-level keywords from {}", tree.len(), path.display());
    Ok(tree)
}

/// Write a tree as a keyword export file
pub fn write_keyword_file(path: &Path, tree: &KeywordTree) -> Result<()> {
    std::fs::write(path, render(tree))?;
    Ok(())
}
