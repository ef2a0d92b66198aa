//! Core data types

pub mod document;
pub mod response;

pub use document::{Chunk, Document, DocumentFormat};
pub use response::{Answer, Citation, StructuredResponse, REFUSAL_TEXT};
