//! Vector index and retrieval

mod index;
mod retriever;

pub use index::{cosine_similarity, euclidean_distance, similarity, IndexEntry, VectorIndex};
pub use retriever::Retriever;
