pub mod recursive;

pub use recursive::Recursive;

#[derive(Debug, thiserror::Error)]
pub enum ChunkerError {
    #[error("{0}")]
    Config(String),
}

/// Amount of characters (unicode scalar values) in `input`.
#[inline(always)]
pub fn char_count(input: &str) -> usize {
    input.chars().count()
}
