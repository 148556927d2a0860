use crate::core::source::{SourceUnit, TextSource};
use crate::err;
use crate::error::SeferError;
use std::path::Path;

/// Reads units from UTF-8 text files. References are file paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

#[async_trait::async_trait]
impl TextSource for FsSource {
    fn id(&self) -> &'static str {
        "fs"
    }

    async fn fetch(&self, reference: &str) -> Result<SourceUnit, SeferError> {
        let path = Path::new(reference);

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => return err!(Fetch, "{reference}: {e}"),
        };

        if text.trim().is_empty() {
            return err!(Fetch, "{reference}: file is empty");
        }

        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| reference.to_string());

        Ok(SourceUnit::new(label, text))
    }
}
