//! Result snippets and match counting over page text.
//!
//! Text is NFKC-folded first, like the tokenizer does, so a term found in the
//! index is also found here. Offsets and window sizes count characters.

use regex::{Regex, RegexBuilder};
use search_core::tokenizer::normalize;

/// Characters of context kept before the first match.
const BEFORE: usize = 100;
/// Characters kept from the start of the first match.
const AFTER: usize = 200;

/// Lowercased whitespace split of the query. Repeated words are kept, each
/// one counts toward the match count.
pub fn query_terms(query: &str) -> Vec<String> {
    normalize(query).to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Window of `content` around the earliest occurrence of any term, with every
/// whole-word occurrence wrapped in `**`. Starts with `...` when the window
/// does not start at the beginning of the content.
pub fn build_snippet(content: &str, terms: &[String]) -> String {
    let content = normalize(content);
    let offset = first_occurrence(&content, terms).map_or(0, |byte| content[..byte].chars().count());
    let total = content.chars().count();
    let start = offset.saturating_sub(BEFORE);
    let end = offset.saturating_add(AFTER).min(total);
    let window = &content[byte_index(&content, start)..byte_index(&content, end)];

    let marked = match whole_word_pattern(terms) {
        Some(rx) => rx.replace_all(window, "**$0**").into_owned(),
        None => window.to_string(),
    };
    if start > 0 {
        format!("...{marked}")
    } else {
        marked
    }
}

/// Whole-word, case-insensitive occurrences of every term in `title` and `content`.
pub fn count_matches(title: &str, content: &str, terms: &[String]) -> usize {
    let text = normalize(&format!("{title} {content}"));
    terms
        .iter()
        .filter_map(|t| whole_word_pattern(std::slice::from_ref(t)))
        .map(|rx| rx.find_iter(&text).count())
        .sum()
}

/// Byte position of the earliest case-insensitive occurrence of any term.
fn first_occurrence(content: &str, terms: &[String]) -> Option<usize> {
    terms
        .iter()
        .filter(|t| !t.is_empty())
        .filter_map(|t| {
            RegexBuilder::new(&regex::escape(t))
                .case_insensitive(true)
                .build()
                .ok()?
                .find(content)
                .map(|m| m.start())
        })
        .min()
}

fn whole_word_pattern(terms: &[String]) -> Option<Regex> {
    let alternation = terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    if alternation.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Byte index of the `chars`-th character, or the end of `s`.
fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}
