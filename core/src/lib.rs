pub mod corpus;
pub mod index;
pub mod normalize;
pub mod persist;
pub mod query;

/// Document identity is its 0-based ordinal in the corpus snapshot.
pub type DocId = u32;

pub use corpus::{read_corpus_file, Document, FieldValue, FieldWeights};
pub use index::{IndexBuilder, IndexEntry, SearchIndex};
pub use query::{Combinator, Hit, ScoreMode, SearchError, RESULT_LIMIT};
