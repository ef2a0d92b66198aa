//! Vector retrieval: the index, its persistence, and query-time search

pub mod handle;
pub mod index;
pub(crate) mod mmr;
pub mod retriever;
pub mod store;

pub use handle::IndexHandle;
pub use index::{IndexDescriptor, RetrievedChunk, VectorIndex};
pub use retriever::Retriever;
