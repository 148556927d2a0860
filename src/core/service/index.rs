use crate::core::chunk::ChunkConfig;
use crate::core::provider::{DynEmbedder, DynTextSource};
use crate::core::source::SourceUnit;
use crate::core::vector::{BuildOptions, VectorIndex};
use crate::err;
use crate::error::SeferError;
use futures_util::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Outcome of a successful [IndexService::build].
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Amount of references fetched successfully.
    pub units_ok: usize,

    /// References that could not be fetched and the reason why.
    pub units_failed: Vec<(String, String)>,

    /// Amount of chunks in the index.
    pub chunks: usize,

    pub dimensions: usize,

    /// Where the index was written to.
    pub path: PathBuf,
}

impl std::fmt::Display for BuildReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Indexed {} chunks ({} dimensions) from {} units into {}",
            self.chunks,
            self.dimensions,
            self.units_ok,
            self.path.display()
        )?;
        if !self.units_failed.is_empty() {
            writeln!(f, "Skipped {} units:", self.units_failed.len())?;
            for (reference, reason) in self.units_failed.iter() {
                writeln!(f, " - {reference}: {reason}")?;
            }
        }
        Ok(())
    }
}

/// Fetches, chunks and embeds a corpus into a persisted [VectorIndex].
#[derive(Clone)]
pub struct IndexService {
    source: DynTextSource,
    embedder: DynEmbedder,
    chunking: ChunkConfig,
    options: BuildOptions,
    fetch_concurrency: usize,
}

impl IndexService {
    pub fn new(source: DynTextSource, embedder: DynEmbedder) -> Self {
        Self {
            source,
            embedder,
            chunking: ChunkConfig::default(),
            options: BuildOptions::default(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_build_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    /// Fetch every reference, at most `fetch_concurrency` at a time.
    ///
    /// Returns the units in reference order, and the references that failed
    /// along with the reason.
    pub async fn fetch_units(
        &self,
        references: &[String],
    ) -> (Vec<SourceUnit>, Vec<(String, String)>) {
        let mut results = futures_util::stream::iter(references.iter().cloned().enumerate())
            .map(|(i, reference)| {
                let source = self.source.clone();
                async move {
                    let result = source.fetch(&reference).await;
                    (i, reference, result)
                }
            })
            .buffer_unordered(self.fetch_concurrency)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(i, _, _)| *i);

        let mut units = vec![];
        let mut failed = vec![];

        for (_, reference, result) in results {
            match result {
                Ok(unit) => units.push(unit),
                Err(e) => {
                    warn!("Skipping '{reference}'; {e}");
                    failed.push((reference, e.to_string()));
                }
            }
        }

        (units, failed)
    }

    /// Build an index from `references` and save it to `path`.
    ///
    /// Units that fail to fetch are skipped. Nothing is written if no text
    /// could be obtained at all or if any later stage fails.
    pub async fn build(
        &self,
        references: &[String],
        path: impl AsRef<Path>,
    ) -> Result<BuildReport, SeferError> {
        let path = path.as_ref();

        info!(
            "Fetching {} units from '{}'",
            references.len(),
            self.source.id()
        );

        let (units, units_failed) = self.fetch_units(references).await;

        if units.is_empty() {
            return err!(
                EmptyCorpus,
                "none of the {} references could be fetched",
                references.len()
            );
        }

        info!(
            "Fetched {} units, {} failed",
            units.len(),
            units_failed.len()
        );

        let chunks = self.chunking.chunk(&units)?;

        if chunks.is_empty() {
            return err!(EmptyCorpus, "{} units produced no chunks", units.len());
        }

        info!("Chunked {} units into {} chunks", units.len(), chunks.len());

        let index = VectorIndex::build(self.embedder.as_ref(), chunks, self.options).await?;

        index.save(path).await?;

        Ok(BuildReport {
            units_ok: units.len(),
            units_failed,
            chunks: index.len(),
            dimensions: index.manifest().dimensions,
            path: path.to_path_buf(),
        })
    }
}
