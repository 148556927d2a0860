use crate::core::chunk::Chunk;
use crate::core::embedder::{Embedder, ModelIdentity};
use crate::error::{SeferErr, SeferError};
use crate::{err, map_err};
use chrono::{DateTime, Utc};
use futures_util::{StreamExt, TryStreamExt};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Current layout version of a persisted index.
pub const INDEX_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.json";

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_CONCURRENCY: usize = 4;

/// The metric an index ranks its entries by. Smaller is always closer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Distance {
    /// `1 - cosine similarity`. Zero magnitude vectors have a similarity of 0.
    #[default]
    Cosine,

    Euclidean,
}

impl Distance {
    pub fn calculate(self, vec1: &[f64], vec2: &[f64]) -> f64 {
        match self {
            Distance::Cosine => 1.0 - cosine_similarity(vec1, vec2),
            Distance::Euclidean => euclidean_distance(vec1, vec2),
        }
    }
}

impl FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            _ => Err(format!("unknown distance '{s}', expected 'cosine' or 'euclidean'")),
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

fn cosine_similarity(vec1: &[f64], vec2: &[f64]) -> f64 {
    let dot_product: f64 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();

    let magnitude1: f64 = vec1.iter().map(|x| x.powi(2)).sum::<f64>().sqrt();
    let magnitude2: f64 = vec2.iter().map(|x| x.powi(2)).sum::<f64>().sqrt();

    if magnitude1 == 0.0 || magnitude2 == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude1 * magnitude2)
}

fn euclidean_distance(vec1: &[f64], vec2: &[f64]) -> f64 {
    vec1.iter()
        .zip(vec2.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: Vec<f64>,
    pub chunk: Chunk,
}

/// Describes a persisted index. Written next to the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    pub version: u32,

    /// ID of the embedder the vectors were produced with.
    pub provider: String,

    /// Embedding model the vectors were produced with.
    pub model: String,

    pub dimensions: usize,

    pub distance: Distance,

    /// Amount of entries.
    pub count: usize,

    /// Hex encoded SHA-256 of the entries file.
    pub checksum: String,

    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn identity(&self) -> ModelIdentity {
        ModelIdentity {
            provider: self.provider.clone(),
            model: self.model.clone(),
            dimensions: self.dimensions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub distance: Distance,

    /// Amount of texts sent to the embedder at once.
    pub batch_size: usize,

    /// Maximum amount of batches being embedded at the same time.
    pub concurrency: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            distance: Distance::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// An entry found by [VectorIndex::search].
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub entry: &'a IndexEntry,

    /// Distance to the query under the index metric.
    pub distance: f64,
}

/// Exact nearest neighbour index over embedded chunks.
///
/// Built once from a full set of chunks, never modified afterwards.
/// Entries keep the order of the chunks they were built from.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk with `embedder` and store the results in input order.
    ///
    /// Either every chunk gets embedded or no index is produced.
    pub async fn build(
        embedder: &(dyn Embedder + Send + Sync),
        chunks: Vec<Chunk>,
        options: BuildOptions,
    ) -> Result<Self, SeferError> {
        if options.batch_size == 0 {
            return err!(ParseConfig, "batch size must be greater than 0");
        }

        let identity = embedder.identity();

        info!(
            "Embedding {} chunks with {identity}, batch size {}",
            chunks.len(),
            options.batch_size
        );

        let dimensions = identity.dimensions;

        let texts = chunks
            .chunks(options.batch_size)
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let batches: Vec<Vec<Vec<f64>>> = futures_util::stream::iter(texts)
            .map(move |owned| async move {
                let batch = owned.iter().map(String::as_str).collect::<Vec<_>>();
                let vectors = embedder.embed(&batch).await?;
                debug!("Embedded batch of {}", batch.len());
                check_batch(batch.len(), &vectors, dimensions)?;
                Ok::<_, SeferError>(vectors)
            })
            .buffered(options.concurrency.max(1))
            .try_collect()
            .await?;

        let entries = batches
            .into_iter()
            .flatten()
            .zip(chunks)
            .map(|(vector, chunk)| IndexEntry { vector, chunk })
            .collect::<Vec<_>>();

        let checksum = checksum(&map_err!(serde_json::to_vec(&entries)));

        let manifest = IndexManifest {
            version: INDEX_VERSION,
            provider: identity.provider,
            model: identity.model,
            dimensions: identity.dimensions,
            distance: options.distance,
            count: entries.len(),
            checksum,
            created_at: Utc::now(),
        };

        info!("Built index with {} entries", entries.len());

        Ok(Self { manifest, entries })
    }

    /// Return up to `k` entries closest to `query`, nearest first.
    /// Entries at equal distance keep their insertion order.
    pub fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchHit<'_>>, SeferError> {
        if k == 0 {
            return Ok(vec![]);
        }

        if self.entries.is_empty() {
            return err!(EmptyIndex);
        }

        if query.len() != self.manifest.dimensions {
            return err!(
                IncompatibleIndex,
                "query has {} dimensions, index has {}",
                query.len(),
                self.manifest.dimensions
            );
        }

        let distance = self.manifest.distance;

        let mut ranked = self
            .entries
            .par_iter()
            .map(|entry| distance.calculate(query, &entry.vector))
            .enumerate()
            .collect::<Vec<_>>();

        ranked.sort_by(|(_, a), (_, b)| a.total_cmp(b));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(i, distance)| SearchHit {
                entry: &self.entries[i],
                distance,
            })
            .collect())
    }

    /// Persist the index to the directory at `path`, replacing anything already there.
    ///
    /// The files are written to a sibling staging directory first and moved
    /// to `path` once complete.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SeferError> {
        let path = path.as_ref();
        let staging = staging_path(path)?;

        let entries = map_err!(serde_json::to_vec(&self.entries));
        let mut manifest = self.manifest.clone();
        manifest.checksum = checksum(&entries);
        let manifest = map_err!(serde_json::to_vec_pretty(&manifest));

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                map_err!(tokio::fs::create_dir_all(parent).await);
            }
        }

        if tokio::fs::try_exists(&staging).await.unwrap_or(false) {
            map_err!(tokio::fs::remove_dir_all(&staging).await);
        }

        map_err!(tokio::fs::create_dir(&staging).await);
        map_err!(tokio::fs::write(staging.join(ENTRIES_FILE), entries).await);
        map_err!(tokio::fs::write(staging.join(MANIFEST_FILE), manifest).await);

        replace_dir(&staging, path).await?;

        info!(
            "Saved index with {} entries to {}",
            self.entries.len(),
            path.display()
        );

        Ok(())
    }

    /// Load the index persisted at `path`, verifying it is internally consistent.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SeferError> {
        let path = path.as_ref();

        let manifest = read_index_file(path, MANIFEST_FILE).await?;
        let manifest: IndexManifest = match serde_json::from_slice(&manifest) {
            Ok(m) => m,
            Err(e) => return err!(CorruptIndex, "invalid manifest: {e}"),
        };

        if manifest.version != INDEX_VERSION {
            return err!(
                CorruptIndex,
                "unsupported version {}, expected {INDEX_VERSION}",
                manifest.version
            );
        }

        let entries = read_index_file(path, ENTRIES_FILE).await?;

        if checksum(&entries) != manifest.checksum {
            return err!(CorruptIndex, "checksum mismatch");
        }

        let entries: Vec<IndexEntry> = match serde_json::from_slice(&entries) {
            Ok(e) => e,
            Err(e) => return err!(CorruptIndex, "invalid entries: {e}"),
        };

        if entries.len() != manifest.count {
            return err!(
                CorruptIndex,
                "manifest count {} does not match {} entries",
                manifest.count,
                entries.len()
            );
        }

        if let Some(i) = entries
            .iter()
            .position(|e| e.vector.len() != manifest.dimensions)
        {
            return err!(
                CorruptIndex,
                "entry {i} has {} dimensions, manifest declares {}",
                entries[i].vector.len(),
                manifest.dimensions
            );
        }

        info!(
            "Loaded index with {} entries from {}",
            entries.len(),
            path.display()
        );

        Ok(Self { manifest, entries })
    }

    /// Load the index at `path` and make sure it was built with `identity`.
    pub async fn load_for(
        path: impl AsRef<Path>,
        identity: &ModelIdentity,
    ) -> Result<Self, SeferError> {
        let index = Self::load(path).await?;
        index.ensure_compatible(identity)?;
        Ok(index)
    }

    /// Error if vectors produced by `identity` are not comparable to the ones in this index.
    pub fn ensure_compatible(&self, identity: &ModelIdentity) -> Result<(), SeferError> {
        let manifest = &self.manifest;

        if identity.dimensions != manifest.dimensions {
            return err!(
                IncompatibleIndex,
                "embedder produces {} dimensions, index has {}",
                identity.dimensions,
                manifest.dimensions
            );
        }

        if identity.provider != manifest.provider || identity.model != manifest.model {
            return err!(
                ProviderMismatch,
                "index was built with {}/{}, got {}/{}",
                manifest.provider,
                manifest.model,
                identity.provider,
                identity.model
            );
        }

        Ok(())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_batch(expected: usize, vectors: &[Vec<f64>], dimensions: usize) -> Result<(), SeferError> {
    if vectors.len() != expected {
        return err!(
            Embedding,
            "expected {expected} vectors, embedder returned {}",
            vectors.len()
        );
    }

    if let Some(v) = vectors.iter().find(|v| v.len() != dimensions) {
        return err!(
            Embedding,
            "expected vectors of {dimensions} dimensions, embedder returned {}",
            v.len()
        );
    }

    Ok(())
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn staging_path(path: &Path) -> Result<PathBuf, SeferError> {
    sibling_path(path, "staging")
}

/// `.{name}.{suffix}` next to `path`.
fn sibling_path(path: &Path, suffix: &str) -> Result<PathBuf, SeferError> {
    let Some(name) = path.file_name() else {
        return err!(ParseConfig, "invalid index path '{}'", path.display());
    };
    let mut sibling = std::ffi::OsString::from(".");
    sibling.push(name);
    sibling.push(".");
    sibling.push(suffix);
    Ok(path.with_file_name(sibling))
}

/// Move the directory `from` to `to`. An existing `to` is kept aside until
/// the move succeeds and put back if it fails.
async fn replace_dir(from: &Path, to: &Path) -> Result<(), SeferError> {
    let previous = sibling_path(to, "previous")?;

    if tokio::fs::try_exists(&previous).await.unwrap_or(false) {
        map_err!(tokio::fs::remove_dir_all(&previous).await);
    }

    let replacing = tokio::fs::try_exists(to).await.unwrap_or(false);

    if replacing {
        map_err!(tokio::fs::rename(to, &previous).await);
    }

    if let Err(e) = tokio::fs::rename(from, to).await {
        if replacing {
            if let Err(restore) = tokio::fs::rename(&previous, to).await {
                warn!(
                    "Could not restore previous index from {}; {restore}",
                    previous.display()
                );
            }
        }
        return Err(SeferError::new(file!(), line!(), column!(), SeferErr::IO(e)));
    }

    if replacing {
        map_err!(tokio::fs::remove_dir_all(&previous).await);
    }

    Ok(())
}

async fn read_index_file(dir: &Path, file: &str) -> Result<Vec<u8>, SeferError> {
    match tokio::fs::read(dir.join(file)).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && dir.is_dir() => {
            err!(CorruptIndex, "missing {file} in {}", dir.display())
        }
        Err(e) => Err(SeferError::new(file!(), line!(), column!(), SeferErr::IO(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test::{temp_dir, FailingEmbedder, FixedEmbedder, SequenceEmbedder};

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(*t, "test", i))
            .collect()
    }

    async fn three_vectors(distance: Distance) -> VectorIndex {
        let embedder = FixedEmbedder::new(&[
            ("north", vec![0.0, 1.0]),
            ("east", vec![1.0, 0.0]),
            ("north east", vec![1.0, 1.0]),
        ]);

        let options = BuildOptions {
            distance,
            ..Default::default()
        };

        VectorIndex::build(&embedder, chunks(&["north", "east", "north east"]), options)
            .await
            .unwrap()
    }

    fn texts<'a>(hits: &[SearchHit<'a>]) -> Vec<&'a str> {
        hits.iter().map(|h| h.entry.chunk.text.as_str()).collect()
    }

    #[test]
    fn cosine_handles_zero_magnitude() {
        assert_eq!(1.0, Distance::Cosine.calculate(&[0.0, 0.0], &[1.0, 0.0]));
        assert!(Distance::Cosine.calculate(&[2.0, 0.0], &[1.0, 0.0]).abs() < 1e-12);
    }

    #[test]
    fn distance_from_str() {
        assert_eq!(Distance::Cosine, "cosine".parse().unwrap());
        assert_eq!(Distance::Euclidean, "l2".parse().unwrap());
        assert!("manhattan".parse::<Distance>().is_err());
    }

    #[tokio::test]
    async fn search_returns_nearest_first() {
        let index = three_vectors(Distance::Cosine).await;

        let hits = index.search(&[0.9, 0.1], 2).unwrap();

        assert_eq!(vec!["east", "north east"], texts(&hits));
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[tokio::test]
    async fn search_euclidean() {
        let index = three_vectors(Distance::Euclidean).await;

        let hits = index.search(&[0.0, 2.0], 2).unwrap();

        assert_eq!(vec!["north", "north east"], texts(&hits));
        assert_eq!(1.0, hits[0].distance);
    }

    #[tokio::test]
    async fn search_k_larger_than_index() {
        let index = three_vectors(Distance::Cosine).await;
        assert_eq!(3, index.search(&[1.0, 0.0], 10).unwrap().len());
    }

    #[tokio::test]
    async fn search_ties_keep_insertion_order() {
        let embedder = FixedEmbedder::new(&[("a", vec![1.0, 0.0]), ("b", vec![1.0, 0.0])]);
        let index = VectorIndex::build(&embedder, chunks(&["a", "b", "a"]), BuildOptions::default())
            .await
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();

        let positions = hits
            .iter()
            .map(|h| h.entry.chunk.metadata.index)
            .collect::<Vec<_>>();
        assert_eq!(vec![0, 1, 2], positions);
    }

    #[tokio::test]
    async fn search_k_zero_is_empty() {
        let index = three_vectors(Distance::Cosine).await;
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_empty_index() {
        let embedder = FixedEmbedder::new(&[]);
        let index = VectorIndex::build(&embedder, vec![], BuildOptions::default())
            .await
            .unwrap();

        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());

        let err = index.search(&[1.0, 0.0], 1).unwrap_err();
        assert!(matches!(err.error, SeferErr::EmptyIndex));
    }

    #[tokio::test]
    async fn search_wrong_dimensions() {
        let index = three_vectors(Distance::Cosine).await;
        let err = index.search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err.error, SeferErr::IncompatibleIndex(_)));
    }

    #[tokio::test]
    async fn build_preserves_order_across_batches() {
        let embedder = SequenceEmbedder::default();
        let input = (0..25).map(|i| i.to_string()).collect::<Vec<_>>();
        let input = input.iter().map(String::as_str).collect::<Vec<_>>();

        let options = BuildOptions {
            batch_size: 3,
            concurrency: 4,
            ..Default::default()
        };

        let index = VectorIndex::build(&embedder, chunks(&input), options)
            .await
            .unwrap();

        assert_eq!(25, index.len());
        assert_eq!(25, index.manifest().count);
        for (i, entry) in index.entries().iter().enumerate() {
            assert_eq!(i as f64, entry.vector[0]);
            assert_eq!(i.to_string(), entry.chunk.text);
        }
        assert_eq!(9, embedder.calls());
    }

    #[tokio::test]
    async fn build_fails_as_a_whole() {
        let embedder = FailingEmbedder::after(1);

        let options = BuildOptions {
            batch_size: 1,
            concurrency: 1,
            ..Default::default()
        };

        let err = VectorIndex::build(&embedder, chunks(&["a", "b", "c"]), options)
            .await
            .unwrap_err();

        assert_eq!("embedding", err.stage());
    }

    #[tokio::test]
    async fn build_rejects_wrong_dimensions() {
        let embedder = FixedEmbedder::new(&[("a", vec![1.0, 0.0])]).with_size(3);

        let err = VectorIndex::build(&embedder, chunks(&["a"]), BuildOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err.error, SeferErr::Embedding(_)));
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let dir = temp_dir();
        let path = dir.join("index");
        let index = three_vectors(Distance::Euclidean).await;

        index.save(&path).await.unwrap();
        let loaded = VectorIndex::load(&path).await.unwrap();

        assert_eq!(index.manifest(), loaded.manifest());
        assert_eq!(index.entries(), loaded.entries());

        let query = [0.7, 0.2];
        assert_eq!(
            texts(&index.search(&query, 3).unwrap()),
            texts(&loaded.search(&query, 3).unwrap())
        );

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn save_replaces_existing_index() {
        let dir = temp_dir();
        let path = dir.join("index");

        three_vectors(Distance::Cosine).await.save(&path).await.unwrap();

        let embedder = FixedEmbedder::new(&[("only", vec![1.0, 0.0])]);
        let index = VectorIndex::build(&embedder, chunks(&["only"]), BuildOptions::default())
            .await
            .unwrap();
        index.save(&path).await.unwrap();

        let loaded = VectorIndex::load(&path).await.unwrap();
        assert_eq!(1, loaded.len());
        assert!(!staging_path(&path).unwrap().exists());
        assert!(!sibling_path(&path, "previous").unwrap().exists());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn failed_replace_keeps_existing_index() {
        let dir = temp_dir();
        let path = dir.join("index");

        three_vectors(Distance::Cosine).await.save(&path).await.unwrap();

        let err = replace_dir(&dir.join("does-not-exist"), &path)
            .await
            .unwrap_err();
        assert_eq!("io", err.stage());

        let loaded = VectorIndex::load(&path).await.unwrap();
        assert_eq!(3, loaded.len());
        assert!(!sibling_path(&path, "previous").unwrap().exists());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn build_on_spawned_task() {
        let embedder = std::sync::Arc::new(SequenceEmbedder::default());
        let options = BuildOptions {
            batch_size: 2,
            ..Default::default()
        };

        let index = tokio::spawn(async move {
            VectorIndex::build(embedder.as_ref(), chunks(&["1", "2", "3"]), options).await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(3, index.len());
        assert_eq!(3.0, index.entries()[2].vector[0]);
    }

    #[tokio::test]
    async fn load_detects_tampered_entries() {
        let dir = temp_dir();
        let path = dir.join("index");
        three_vectors(Distance::Cosine).await.save(&path).await.unwrap();

        let entries = path.join(ENTRIES_FILE);
        let content = tokio::fs::read_to_string(&entries).await.unwrap();
        tokio::fs::write(&entries, content.replace("north", "south"))
            .await
            .unwrap();

        let err = VectorIndex::load(&path).await.unwrap_err();
        assert!(matches!(err.error, SeferErr::CorruptIndex(_)));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn load_detects_bad_manifest() {
        let dir = temp_dir();
        let path = dir.join("index");
        let index = three_vectors(Distance::Cosine).await;
        index.save(&path).await.unwrap();

        tokio::fs::write(path.join(MANIFEST_FILE), b"{ not json")
            .await
            .unwrap();
        let err = VectorIndex::load(&path).await.unwrap_err();
        assert!(matches!(err.error, SeferErr::CorruptIndex(_)));

        let mut manifest = index.manifest().clone();
        manifest.count = 4;
        manifest.checksum = checksum(&serde_json::to_vec(index.entries()).unwrap());
        tokio::fs::write(
            path.join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .await
        .unwrap();
        let err = VectorIndex::load(&path).await.unwrap_err();
        assert!(matches!(err.error, SeferErr::CorruptIndex(_)));

        tokio::fs::remove_file(path.join(MANIFEST_FILE)).await.unwrap();
        let err = VectorIndex::load(&path).await.unwrap_err();
        assert!(matches!(err.error, SeferErr::CorruptIndex(_)));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn load_missing_directory_is_io() {
        let err = VectorIndex::load(temp_dir().join("nothing"))
            .await
            .unwrap_err();
        assert!(matches!(err.error, SeferErr::IO(_)));
    }

    #[tokio::test]
    async fn load_for_checks_identity() {
        let dir = temp_dir();
        let path = dir.join("index");
        let index = three_vectors(Distance::Cosine).await;
        index.save(&path).await.unwrap();

        let identity = index.manifest().identity();
        VectorIndex::load_for(&path, &identity).await.unwrap();

        let other_size = ModelIdentity {
            dimensions: 3,
            ..identity.clone()
        };
        let err = VectorIndex::load_for(&path, &other_size).await.unwrap_err();
        assert!(matches!(err.error, SeferErr::IncompatibleIndex(_)));

        let other_model = ModelIdentity {
            model: "other".to_string(),
            ..identity
        };
        let err = VectorIndex::load_for(&path, &other_model).await.unwrap_err();
        assert!(matches!(err.error, SeferErr::ProviderMismatch(_)));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
