use crate::error::SeferError;
use serde::{Deserialize, Serialize};

/// One logical unit of source text, e.g. a single chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Human readable label of where the text came from, e.g. `Genesis 1`.
    pub label: String,

    /// Plain text, markup already removed.
    pub text: String,
}

impl SourceUnit {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Obtains plain text for a reference. The reference format is opaque to the core
/// and interpreted only by the implementation.
#[async_trait::async_trait]
pub trait TextSource {
    fn id(&self) -> &'static str;

    /// Fetch and clean the unit identified by `reference`.
    /// Any failure here is considered a fetch failure of this single unit.
    async fn fetch(&self, reference: &str) -> Result<SourceUnit, SeferError>;
}
