//! Module containing concrete implementations from the [core](crate::core) module.

/// Text embedder implementations.
pub mod embedder;

/// Answer generator implementations.
pub mod generator;

/// Text source implementations.
pub mod source;

/// Application state configuration.
pub mod state;
