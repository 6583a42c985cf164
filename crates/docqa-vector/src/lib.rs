//! docqa-vector
//!
//! The collection store: named, isolated sets of embedded chunks searched by
//! brute-force cosine similarity, optionally mirrored to disk.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod persist;
pub mod similarity;
pub mod store;

pub use persist::JsonlPersistence;
pub use similarity::{cosine_similarity, similarity_score};
pub use store::CollectionStore;
