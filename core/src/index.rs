use crate::fuzzy::FuzzyMatcher;
use crate::tokenizer::{is_title_position, tokenize, tokenize_with_positions, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub type TermId = u32;
pub type DocId = u32;

/// Multiplier for postings whose term occurs in the document title.
pub const TITLE_BOOST: f64 = 2.0;
/// Score lost per edit when a query term is replaced by a correction.
pub const FUZZY_PENALTY_PER_EDIT: f64 = 0.2;
/// Corrections tried per unknown query term.
const FUZZY_CANDIDATES: usize = 3;
/// Suggestions returned by [`InvertedIndex::suggestions`].
pub const DEFAULT_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// External identity, the page URL for crawled documents.
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
    /// Title positions are negative, body positions non-negative.
    pub positions: Vec<Position>,
    pub title_boost: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub matched_terms: BTreeSet<String>,
    /// Query term -> correction used for it. Shared by every hit of a query.
    pub corrections: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_documents: u32,
    pub total_terms: usize,
    pub average_terms_per_document: usize,
}

/// `(1 + ln tf) * ln(n / df)`; zero when the term is absent.
pub fn tf_idf(tf: u32, df: u32, n: u32) -> f64 {
    if df == 0 || tf == 0 {
        return 0.0;
    }
    let tf = 1.0 + f64::from(tf).ln();
    let idf = (f64::from(n) / f64::from(df)).ln();
    tf * idf
}

/// In-memory inverted index with TF-IDF ranking and typo correction.
///
/// Documents get dense ids in insertion order. Adding a document whose id is
/// already present reuses its dense id and appends a second set of postings.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    postings: Vec<Vec<Posting>>, // indexed by TermId, insertion order
    docs: Vec<Document>,         // indexed by DocId
    doc_ids: HashMap<String, DocId>,
    num_docs: u32,
    fuzzy: FuzzyMatcher,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn add_document(&mut self, doc: Document) {
        // title first, so a term's positions read title then body
        let mut merged: Vec<(String, Vec<Position>)> = tokenize_with_positions(&doc.title, true);
        let mut slots: HashMap<String, usize> =
            merged.iter().enumerate().map(|(i, (t, _))| (t.clone(), i)).collect();
        for (term, positions) in tokenize_with_positions(&doc.content, false) {
            match slots.get(&term) {
                Some(&slot) => merged[slot].1.extend(positions),
                None => {
                    slots.insert(term.clone(), merged.len());
                    merged.push((term, positions));
                }
            }
        }

        let doc_id = match self.doc_ids.get(&doc.id) {
            Some(&id) => {
                self.docs[id as usize] = doc;
                id
            }
            None => {
                let id = self.docs.len() as DocId;
                self.doc_ids.insert(doc.id.clone(), id);
                self.docs.push(doc);
                id
            }
        };
        self.num_docs += 1;

        let distinct_terms = merged.len();
        for (term, positions) in merged {
            let tid = self.term_id(&term);
            let title_boost = positions.iter().any(|&p| is_title_position(p));
            self.postings[tid as usize].push(Posting {
                doc_id,
                term_frequency: positions.len() as u32,
                positions,
                title_boost,
            });
            self.df[tid as usize] += 1;
            self.fuzzy.add_term(&term);
        }
        tracing::debug!(doc = %self.docs[doc_id as usize].id, doc_id, distinct_terms, "indexed document");
    }

    fn term_id(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = self.df.len() as TermId;
        self.dictionary.insert(term.to_string(), tid);
        self.df.push(0);
        self.postings.push(Vec::new());
        tid
    }

    pub fn search(&self, query: &str, max_results: usize, fuzzy: bool) -> Vec<ScoredDocument> {
        let mut seen = HashSet::new();
        let terms: Vec<String> = tokenize(query).into_iter().filter(|t| seen.insert(t.clone())).collect();
        if terms.is_empty() || self.num_docs == 0 {
            return Vec::new();
        }

        let mut acc = Accumulator::default();
        let mut corrections: BTreeMap<String, String> = BTreeMap::new();
        for term in &terms {
            if let Some(&tid) = self.dictionary.get(term) {
                self.accumulate(tid, 1.0, term, &mut acc);
                continue;
            }
            if !fuzzy {
                continue;
            }
            for suggestion in self.fuzzy.find_suggestions(term, FUZZY_CANDIDATES) {
                let Some(&tid) = self.dictionary.get(&suggestion.term) else { continue };
                let penalty = 1.0 - FUZZY_PENALTY_PER_EDIT * suggestion.edit_distance as f64;
                self.accumulate(tid, penalty, &suggestion.term, &mut acc);
                // suggestions arrive best first
                corrections.entry(term.clone()).or_insert_with(|| suggestion.term.clone());
            }
        }

        let mut ranked: Vec<(DocId, f64)> = acc.scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.docs[a.0 as usize].id.cmp(&self.docs[b.0 as usize].id))
        });
        ranked.truncate(max_results);

        ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let doc = &self.docs[doc_id as usize];
                ScoredDocument {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    score,
                    matched_terms: acc.matched.remove(&doc_id).unwrap_or_default(),
                    corrections: corrections.clone(),
                }
            })
            .collect()
    }

    fn accumulate(&self, tid: TermId, weight: f64, matched_as: &str, acc: &mut Accumulator) {
        let df = self.df[tid as usize];
        for posting in &self.postings[tid as usize] {
            let boost = if posting.title_boost { TITLE_BOOST } else { 1.0 };
            let score = tf_idf(posting.term_frequency, df, self.num_docs) * boost * weight;
            *acc.scores.entry(posting.doc_id).or_insert(0.0) += score;
            acc.matched.entry(posting.doc_id).or_default().insert(matched_as.to_string());
        }
    }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.dictionary.get(term).map(|&tid| self.postings[tid as usize].as_slice())
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.dictionary.get(term).map_or(0, |&tid| self.df[tid as usize])
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.doc_ids.get(id).map(|&d| &self.docs[d as usize])
    }

    /// Number of `add_document` calls, re-ingested ids included.
    pub fn num_docs(&self) -> u32 { self.num_docs }

    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn stats(&self) -> IndexStats {
        let total_postings: usize = self.postings.iter().map(Vec::len).sum();
        IndexStats {
            total_documents: self.num_docs,
            total_terms: self.dictionary.len(),
            average_terms_per_document: if self.num_docs > 0 { total_postings / self.num_docs as usize } else { 0 },
        }
    }

    pub fn suggestions(&self, term: &str) -> Vec<String> {
        let term = term.trim().to_lowercase();
        self.fuzzy
            .find_suggestions(&term, DEFAULT_SUGGESTIONS)
            .into_iter()
            .map(|s| s.term)
            .collect()
    }
}

#[derive(Default)]
struct Accumulator {
    scores: HashMap<DocId, f64>,
    matched: HashMap<DocId, BTreeSet<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, content: &str) -> Document {
        Document { id: id.into(), title: title.into(), content: content.into() }
    }

    #[test]
    fn postings_merge_title_and_body() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc("d1", "Rust guide", "rust is fast, rust is safe"));
        let p = idx.postings("rust").unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].term_frequency, 3);
        assert_eq!(p[0].positions, vec![-1, 0, 2]);
        assert!(p[0].title_boost);
        let fast = idx.postings("fast").unwrap();
        assert!(!fast[0].title_boost);
        assert_eq!(idx.document_frequency("rust"), 1);
    }

    #[test]
    fn tf_idf_edges() {
        assert_eq!(tf_idf(3, 0, 10), 0.0);
        assert_eq!(tf_idf(1, 10, 10), 0.0);
        assert!((tf_idf(1, 1, 10) - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn title_hit_outranks_body_hit() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc("a", "Tokio runtime", "an async executor"));
        idx.add_document(doc("b", "Executors", "tokio drives futures"));
        idx.add_document(doc("c", "Unrelated", "nothing here matters"));
        let hits = idx.search("tokio", 10, false);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!((hits[0].score - 2.0 * hits[1].score).abs() < 1e-9);
    }

    #[test]
    fn reingest_appends_postings() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc("u", "Page", "crawler content"));
        idx.add_document(doc("u", "Page", "crawler content"));
        let p = idx.postings("crawler").unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].doc_id, p[1].doc_id);
        assert_eq!(idx.num_docs(), 2);
    }

    #[test]
    fn suggestions_use_vocabulary() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc("a", "Search", "inverted index ranking"));
        assert_eq!(idx.suggestions("Indx"), vec!["index".to_string()]);
        assert!(idx.suggestions("ix").is_empty());
    }
}
