//! Text-content pseudo-classes: `:contains(...)` and friends.
//!
//! The selectors crate has no notion of text content, so these are cut out
//! of the selector string before CSS parsing and checked afterwards against
//! each candidate element. Every filter must hold for an element to match.

use crate::dom::{ArenaDom, ArenaNodeId, text};

/// Which text a filter looks at, and how it compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainsKind {
    /// All descendant text; case-insensitive, whitespace-normalized.
    Contains,
    /// Direct text children; case-insensitive, whitespace-normalized.
    ContainsOwn,
    /// All descendant text; case-sensitive, raw.
    WholeText,
    /// Direct text children; case-sensitive, raw.
    WholeOwnText,
    /// Script/style data; case-insensitive, raw.
    ContainsData,
}

/// A single text filter extracted from a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsFilter {
    pub kind: ContainsKind,
    pub needle: String,
}

/// Longest names first, so `:contains(` never shadows `:containsOwn(`.
const PSEUDO_CLASSES: &[(&str, ContainsKind)] = &[
    (":containsWholeOwnText(", ContainsKind::WholeOwnText),
    (":containsWholeText(", ContainsKind::WholeText),
    (":containsData(", ContainsKind::ContainsData),
    (":containsOwn(", ContainsKind::ContainsOwn),
    (":contains(", ContainsKind::Contains),
];

impl ContainsFilter {
    fn new(kind: ContainsKind, arg: &str) -> Self {
        let needle = match kind {
            ContainsKind::Contains | ContainsKind::ContainsOwn => {
                text::normalize_whitespace(arg).to_lowercase()
            }
            ContainsKind::ContainsData => arg.to_lowercase(),
            ContainsKind::WholeText | ContainsKind::WholeOwnText => arg.to_string(),
        };
        Self { kind, needle }
    }

    /// Check the filter against an element.
    pub fn matches(&self, dom: &ArenaDom, id: ArenaNodeId) -> bool {
        match self.kind {
            ContainsKind::Contains => text::text(dom, id).to_lowercase().contains(&self.needle),
            ContainsKind::ContainsOwn => {
                text::own_text(dom, id).to_lowercase().contains(&self.needle)
            }
            ContainsKind::WholeText => text::whole_text(dom, id).contains(&self.needle),
            ContainsKind::WholeOwnText => text::whole_own_text(dom, id).contains(&self.needle),
            ContainsKind::ContainsData => {
                text::whole_own_text(dom, id).to_lowercase().contains(&self.needle)
            }
        }
    }
}

/// Byte offset of the `)` closing an argument list, honoring nesting.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            ')' => return Some(i),
            _ => {}
        }
    }
    None
}

fn take_one(selector: &str) -> Option<(String, ContainsFilter)> {
    PSEUDO_CLASSES.iter().find_map(|&(prefix, kind)| {
        let start = selector.find(prefix)?;
        let arg_start = start + prefix.len();
        let arg_len = closing_paren(&selector[arg_start..])?;
        let arg = &selector[arg_start..arg_start + arg_len];
        let rest = format!(
            "{}{}",
            &selector[..start],
            &selector[arg_start + arg_len + 1..]
        );
        Some((rest, ContainsFilter::new(kind, arg)))
    })
}

/// Split a selector into its CSS part and its text filters.
///
/// Unterminated pseudo-classes are left in place for the CSS parser to
/// reject.
pub fn strip_contains(selector: &str) -> (String, Vec<ContainsFilter>) {
    let mut rest = selector.to_string();
    let mut filters = Vec::new();
    while let Some((next, filter)) = take_one(&rest) {
        rest = next;
        filters.push(filter);
    }
    (rest, filters)
}
