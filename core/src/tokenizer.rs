use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

/// Token position inside a field. Title positions are stored as `-(index + 1)`,
/// body positions as `index`, so a single list carries both provenance and count.
pub type Position = i32;

/// Tokens must be strictly longer than this to be indexed.
const MIN_TOKEN_LEN: usize = 2;

lazy_static! {
    static ref NON_TERM: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "the","a","an","and","or","but","in","on","at","to","for",
            "of","with","by","is","are","was","were","be","been","being",
            "have","has","had","do","does","did","will","would","could",
            "should","may","might","can","this","that","these","those",
            "from","up","out","down","off","over","under","again","further",
            "then","once","here","there","when","where","why","how","all",
            "any","both","each","few","more","most","other","some","such",
            "no","nor","not","only","own","same","so","than","too","very"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Whether an encoded position came from a title field.
#[inline]
pub fn is_title_position(pos: Position) -> bool { pos < 0 }

/// NFKC compatibility folding applied before tokenizing. Anything that matches
/// text against index terms should see the same form.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect()
}

/// Tokenize text into index terms: NFKC, lowercase, strip everything outside
/// `[a-z0-9]`, split on whitespace, drop short tokens and stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize(text).to_lowercase();
    let cleaned = NON_TERM.replace_all(&normalized, " ");
    cleaned
        .split_whitespace()
        .filter(|t| t.len() > MIN_TOKEN_LEN && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

/// Tokenize and group positions per term, in first-occurrence order.
///
/// Positions index the filtered token stream. With `is_title` set they are
/// encoded negatively (see [`Position`]).
pub fn tokenize_with_positions(text: &str, is_title: bool) -> Vec<(String, Vec<Position>)> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut grouped: Vec<(String, Vec<Position>)> = Vec::new();
    for (index, token) in tokenize(text).into_iter().enumerate() {
        let index = index as Position;
        let pos = if is_title { -index - 1 } else { index };
        match slots.get(&token) {
            Some(&slot) => grouped[slot].1.push(pos),
            None => {
                slots.insert(token.clone(), grouped.len());
                grouped.push((token, vec![pos]));
            }
        }
    }
    grouped
}
