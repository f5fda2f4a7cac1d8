//! Generic recursive splitter used when structural splitting is unavailable.
//!
//! The text is cut at the first separator it contains, separators staying
//! attached to the start of the following piece. Pieces still longer than
//! `max_size` are cut again with the next separator; the rest are merged
//! greedily up to `max_size`, carrying at most `overlap` characters of
//! trailing pieces into the next chunk. Every emitted chunk is a substring of
//! the input.

use std::collections::VecDeque;

use crate::language::SplitterConfig;

/// Boundaries tried in order: blank lines, lines, statement terminators,
/// words, characters.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", "; ", " ", ""];

pub fn split(text: &str, config: SplitterConfig) -> Vec<String> {
    let mut out = Vec::new();
    split_into(text, SEPARATORS, config, &mut out);
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_into(text: &str, separators: &[&str], config: SplitterConfig, out: &mut Vec<String>) {
    let position = separators
        .iter()
        .position(|s| s.is_empty() || text.contains(s))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let rest = separators.get(position + 1..).unwrap_or(&[]);

    let mut small: Vec<&str> = Vec::new();
    for piece in split_keep(text, separator) {
        if char_len(piece) < config.max_size {
            small.push(piece);
            continue;
        }
        if !small.is_empty() {
            merge(&small, config, out);
            small.clear();
        }
        if rest.is_empty() {
            push_trimmed(piece, out);
        } else {
            split_into(piece, rest, config, out);
        }
    }
    if !small.is_empty() {
        merge(&small, config, out);
    }
}

/// Splits before every occurrence of `separator`; an empty separator splits
/// into characters.
fn split_keep<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Greedy merge of consecutive pieces. Pieces are contiguous slices of the
/// same text, so their concatenation is itself a substring of it.
fn merge(pieces: &[&str], config: SplitterConfig, out: &mut Vec<String>) {
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;
    for &piece in pieces {
        let len = char_len(piece);
        if total + len > config.max_size && !window.is_empty() {
            push_trimmed(&window.iter().copied().collect::<String>(), out);
            while total > config.overlap || (total + len > config.max_size && total > 0) {
                let Some(front) = window.pop_front() else { break };
                total -= char_len(front);
            }
        }
        window.push_back(piece);
        total += len;
    }
    if !window.is_empty() {
        push_trimmed(&window.iter().copied().collect::<String>(), out);
    }
}

fn push_trimmed(s: &str, out: &mut Vec<String>) {
    let trimmed = s.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
