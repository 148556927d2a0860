use std::error::Error as _;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum SeferErr {
    #[error("fetch; {0}")]
    Fetch(String),

    #[error("no usable source text; {0}")]
    EmptyCorpus(String),

    #[error("embedding; {0}")]
    Embedding(String),

    #[error("embedding client; {0}")]
    EmbeddingClient(#[from] sefer_embedders::error::EmbeddingError),

    #[error("index is empty")]
    EmptyIndex,

    #[error("corrupt index; {0}")]
    CorruptIndex(String),

    #[error("incompatible index; {0}")]
    IncompatibleIndex(String),

    #[error("provider mismatch; {0}")]
    ProviderMismatch(String),

    #[error("generation; {0}")]
    Generation(String),

    #[error("chunker: {0}")]
    Chunker(#[from] chunx::ChunkerError),

    #[error("Invalid provider; {0}")]
    InvalidProvider(String),

    #[error("parse configuration: {0}")]
    ParseConfig(String),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Http client; {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl SeferErr {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) | Self::EmptyCorpus(_) | Self::Reqwest(_) => "fetch",
            Self::Chunker(_) => "chunking",
            Self::Embedding(_) | Self::EmbeddingClient(_) => "embedding",
            Self::EmptyIndex
            | Self::CorruptIndex(_)
            | Self::IncompatibleIndex(_)
            | Self::ProviderMismatch(_)
            | Self::SerdeJson(_) => "index",
            Self::Generation(_) => "generation",
            Self::InvalidProvider(_) | Self::ParseConfig(_) => "config",
            Self::IO(_) => "io",
        }
    }
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct SeferError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: SeferErr,
}

impl SeferError {
    pub fn new(file: &'static str, line: u32, column: u32, error: SeferErr) -> SeferError {
        SeferError {
            file,
            line,
            column,
            error,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }

    pub fn stage(&self) -> &'static str {
        self.error.stage()
    }

    pub fn print(&self) {
        let location = self.location();

        error!("{location} | {} | {self}", self.stage());

        if self.error.source().is_some() {
            error!("Causes:");
        }

        let mut src = self.error.source();
        while let Some(source) = src {
            error!(" - {source}");
            src = source.source();
        }
    }
}

#[macro_export]
macro_rules! err {
    ($ty:ident $(, $l:literal $(,)? $($args:expr),* )?) => {
        Err($crate::error::SeferError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::SeferErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::SeferError::new(file!(), line!(), column!(), e.into()))?
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Result<(), SeferError> {
        err!(EmptyIndex)
    }

    fn corrupt() -> Result<(), SeferError> {
        err!(CorruptIndex, "count {} != {}", 1, 2)
    }

    fn io() -> Result<(), SeferError> {
        map_err!(std::fs::read("__sefer_does_not_exist__"));
        Ok(())
    }

    #[test]
    fn err_macro_records_location() {
        let error = empty().unwrap_err();
        assert!(error.location().starts_with(file!()));
        assert!(matches!(error.error, SeferErr::EmptyIndex));
    }

    #[test]
    fn err_macro_formats_message() {
        let error = corrupt().unwrap_err();
        assert_eq!("corrupt index; count 1 != 2", error.to_string());
        assert_eq!("index", error.stage());
    }

    #[test]
    fn map_err_converts_source() {
        let error = io().unwrap_err();
        assert!(matches!(error.error, SeferErr::IO(_)));
        assert_eq!("io", error.stage());
    }

    #[test]
    fn stages_are_named() {
        assert_eq!("fetch", SeferErr::Fetch(String::new()).stage());
        assert_eq!("fetch", SeferErr::EmptyCorpus(String::new()).stage());
        assert_eq!("embedding", SeferErr::Embedding(String::new()).stage());
        assert_eq!("generation", SeferErr::Generation(String::new()).stage());
        assert_eq!("config", SeferErr::InvalidProvider(String::new()).stage());
        assert_eq!("index", SeferErr::ProviderMismatch(String::new()).stage());
    }
}
