use std::collections::BTreeSet;

/// Outcome of parsing a selection expression such as `1,3,5-7`.
///
/// `indices` is deduplicated and ascending, every value within `[1, max]`.
/// Invalid tokens are never fatal; they land in `dropped` so the caller can
/// tell the operator what was ignored instead of silently swallowing typos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub indices: Vec<usize>,
    pub dropped: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Parses a comma-separated list of 1-based indices and `start-end` ranges.
///
/// A range is kept only when both halves parse and `1 <= start <= end <= max`;
/// a malformed or out-of-bound range is dropped whole, never partially
/// applied. Empty tokens (doubled or trailing commas) are ignored without
/// being reported.
pub fn parse_selection(expression: &str, max_value: usize) -> Selection {
    let mut indices = BTreeSet::new();
    let mut dropped = Vec::new();

    for part in expression.split(',') {
        let token = part.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once('-') {
            match (start.trim().parse::<usize>(), end.trim().parse::<usize>()) {
                (Ok(start), Ok(end)) if start >= 1 && start <= end && end <= max_value => {
                    indices.extend(start..=end);
                }
                _ => dropped.push(token.to_string()),
            }
        } else {
            match token.parse::<usize>() {
                Ok(index) if index >= 1 && index <= max_value => {
                    indices.insert(index);
                }
                _ => dropped.push(token.to_string()),
            }
        }
    }

    Selection {
        indices: indices.into_iter().collect(),
        dropped,
    }
}
