/// Building and persisting an index from source references.
pub mod index;

/// Answering questions against a persisted index.
pub mod query;
