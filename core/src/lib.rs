pub mod edit_distance;
pub mod fuzzy;
pub mod index;
pub mod page;
pub mod tokenizer;

pub use fuzzy::{FuzzyMatcher, TermSuggestion};
pub use index::{tf_idf, DocId, Document, IndexStats, InvertedIndex, Posting, ScoredDocument, TermId};
pub use page::WebPage;
