//! The core module defines the retrieval pipeline of sefer.
//! It provides the traits and models upstream adapters need to implement.

pub mod chunk;
pub mod embedder;
pub mod generator;
pub mod provider;
pub mod retriever;
pub mod service;
pub mod source;
pub mod vector;
