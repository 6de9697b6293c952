use search_core::tokenizer::{tokenize, tokenize_with_positions};

#[test]
fn it_lowercases_and_strips_punctuation() {
    let words = tokenize("Hello, WORLD! Rust-lang's crates.io");
    assert_eq!(words, vec!["hello", "world", "rust", "lang", "crates"]);
}

#[test]
fn it_filters_stopwords_and_short_tokens() {
    let words = tokenize("The quick brown fox and the lazy dog is on it");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(!words.contains(&"on".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn it_keeps_digits() {
    assert_eq!(tokenize("HTTP 404 in 2024"), vec!["http", "404", "2024"]);
}

#[test]
fn it_folds_compatibility_forms() {
    // full-width letters fold to ASCII under NFKC
    assert_eq!(tokenize("Ｒｕｓｔ"), vec!["rust"]);
    // accented letters are not in [a-z0-9] and split the word
    assert_eq!(tokenize("café crème"), vec!["caf"]);
}

#[test]
fn empty_and_blank_input() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("  \n\t ").is_empty());
    assert!(tokenize_with_positions("", true).is_empty());
}

#[test]
fn positions_follow_first_occurrence() {
    let grouped = tokenize_with_positions("index search index ranking search", false);
    let terms: Vec<&str> = grouped.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(terms, vec!["index", "search", "ranking"]);
    assert_eq!(grouped[0].1, vec![0, 2]);
    assert_eq!(grouped[1].1, vec![1, 4]);
}
