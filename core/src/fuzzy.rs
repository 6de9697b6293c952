use crate::edit_distance::levenshtein;
use serde::Serialize;
use std::collections::HashMap;

/// Largest edit distance accepted for a correction.
pub const MAX_EDIT_DISTANCE: usize = 2;
/// Queries shorter than this never get suggestions.
const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermSuggestion {
    pub term: String,
    pub edit_distance: usize,
    /// Number of documents containing `term`.
    pub frequency: u32,
}

/// Vocabulary with per-term document counts, used to rank typo corrections.
#[derive(Debug, Default)]
pub struct FuzzyMatcher {
    frequencies: HashMap<String, u32>,
}

impl FuzzyMatcher {
    pub fn new() -> Self { Self::default() }

    /// Register one document containing `term`. Call once per (term, document).
    pub fn add_term(&mut self, term: &str) {
        match self.frequencies.get_mut(term) {
            Some(count) => *count += 1,
            None => { self.frequencies.insert(term.to_string(), 1); }
        }
    }

    pub fn frequency(&self, term: &str) -> u32 {
        self.frequencies.get(term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize { self.frequencies.len() }

    pub fn is_empty(&self) -> bool { self.frequencies.is_empty() }

    /// Candidate corrections for `term`, closest first, then most common.
    pub fn find_suggestions(&self, term: &str, max_suggestions: usize) -> Vec<TermSuggestion> {
        let term_len = term.chars().count();
        if term_len < MIN_QUERY_LEN {
            return Vec::new();
        }
        if let Some(&frequency) = self.frequencies.get(term) {
            return vec![TermSuggestion { term: term.to_string(), edit_distance: 0, frequency }];
        }

        let mut suggestions: Vec<TermSuggestion> = self
            .frequencies
            .iter()
            .filter(|(candidate, _)| candidate.chars().count().abs_diff(term_len) <= MAX_EDIT_DISTANCE)
            .filter_map(|(candidate, &frequency)| {
                let edit_distance = levenshtein(term, candidate, MAX_EDIT_DISTANCE);
                (edit_distance <= MAX_EDIT_DISTANCE).then(|| TermSuggestion {
                    term: candidate.clone(),
                    edit_distance,
                    frequency,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            a.edit_distance
                .cmp(&b.edit_distance)
                .then(b.frequency.cmp(&a.frequency))
                .then_with(|| a.term.cmp(&b.term))
        });
        suggestions.truncate(max_suggestions);
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(terms: &[(&str, u32)]) -> FuzzyMatcher {
        let mut m = FuzzyMatcher::new();
        for (term, docs) in terms {
            for _ in 0..*docs { m.add_term(term); }
        }
        m
    }

    #[test]
    fn short_terms_get_nothing() {
        let m = matcher(&[("go", 1)]);
        assert!(m.find_suggestions("go", 5).is_empty());
        assert!(m.find_suggestions("ab", 5).is_empty());
    }

    #[test]
    fn exact_hit_is_returned_alone() {
        let m = matcher(&[("rust", 3), ("rusty", 1), ("bust", 2)]);
        let s = m.find_suggestions("rust", 5);
        assert_eq!(s, vec![TermSuggestion { term: "rust".into(), edit_distance: 0, frequency: 3 }]);
    }

    #[test]
    fn ranks_by_distance_then_frequency() {
        let m = matcher(&[("rust", 1), ("bust", 4), ("dust", 2), ("trusts", 9), ("robust", 7)]);
        let s = m.find_suggestions("rost", 5);
        let ranked: Vec<(&str, usize)> = s.iter().map(|s| (s.term.as_str(), s.edit_distance)).collect();
        // "trusts" is three edits away
        assert_eq!(ranked, vec![("rust", 1), ("robust", 2), ("bust", 2), ("dust", 2)]);
    }

    #[test]
    fn truncates_to_max() {
        let m = matcher(&[("cat", 1), ("bat", 1), ("hat", 1), ("mat", 1)]);
        let s = m.find_suggestions("rat", 2);
        assert_eq!(s.len(), 2);
        // equal distance and frequency fall back to term order
        assert_eq!(s[0].term, "bat");
        assert_eq!(s[1].term, "cat");
    }

    #[test]
    fn counts_documents() {
        let m = matcher(&[("index", 2)]);
        assert_eq!(m.frequency("index"), 2);
        assert_eq!(m.frequency("missing"), 0);
        assert_eq!(m.len(), 1);
    }
}
