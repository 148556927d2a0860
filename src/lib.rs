//! Retrieval augmented answering over a fixed corpus of scripture.
//!
//! Source texts are fetched, chunked and embedded into a [VectorIndex][core::vector::VectorIndex]
//! which is then searched to ground generated answers.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
