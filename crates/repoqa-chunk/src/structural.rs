//! Syntax-aware splitting with tree-sitter.
//!
//! Breadth-first walk over the syntax tree. A node whose kind is one of the
//! language's terminal kinds becomes a chunk spanning its exact byte range and
//! its subtree is not visited, so nested declarations never produce fragments
//! of an already emitted chunk.

use std::collections::{HashSet, VecDeque};

use tracing::warn;
use tree_sitter::{Node, Parser};

use crate::language::Language;

/// If more than this fraction of syntax nodes are error nodes, the tree is
/// not trusted.
const ERROR_THRESHOLD: f64 = 0.30;

/// Splits `content` at the language's terminal nodes.
///
/// Returns `None` when the language has no grammar or the source does not
/// parse; the caller then falls back to the recursive splitter. An empty
/// vector means the tree was fine but contained no split points.
pub fn split(content: &str, language: Language) -> Option<Vec<String>> {
    let grammar = language.grammar()?;
    let mut parser = Parser::new();
    parser.set_language(&grammar).ok()?;
    let tree = parser.parse(content, None)?;
    let root = tree.root_node();

    let (total, errors) = count_nodes(root);
    if total > 0 && (errors as f64 / total as f64) > ERROR_THRESHOLD {
        warn!(
            ?language,
            "syntax error rate {:.0}% exceeds threshold, not splitting structurally",
            (errors as f64 / total as f64) * 100.0
        );
        return None;
    }

    let terminals = language.terminal_kinds();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut chunks = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if terminals.contains(&node.kind()) {
            if let Some(text) = content.get(node.start_byte()..node.end_byte()) {
                if !text.trim().is_empty() && seen.insert(text) {
                    chunks.push(text.to_string());
                }
            }
            continue;
        }
        let mut cursor = node.walk();
        queue.extend(node.children(&mut cursor));
    }
    Some(chunks)
}

/// Count total nodes and error nodes in a tree.
fn count_nodes(root: Node) -> (usize, usize) {
    let mut total = 0usize;
    let mut errors = 0usize;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        total += 1;
        if node.is_error() {
            errors += 1;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    (total, errors)
}
