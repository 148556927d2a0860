//! Embedding model clients.
//!
//! Every client is pinned to a single model at construction so that all vectors
//! it produces share the same dimensionality.

pub mod error;

#[cfg(feature = "fe-local")]
pub mod fastembed;

#[cfg(feature = "openai")]
pub mod openai;
