use crate::core::source::SourceUnit;
use crate::error::SeferError;
use crate::map_err;
use chunx::recursive::DEFAULT_DELIMS;
use chunx::Recursive;
use serde::{Deserialize, Serialize};

/// Placed between units when they are chunked as one text.
/// Belongs to the unit preceding it for label attribution.
const UNIT_JOINER: &str = "\n\n";

const DEFAULT_CHUNK_SIZE: usize = 350;
const DEFAULT_CHUNK_OVERLAP: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Label of the unit the chunk originates from.
    pub source: String,

    /// Position of the chunk in its unit, or in the whole corpus when concatenated.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata {
                source: source.into(),
                index,
            },
        }
    }
}

/// How units are fed to the chunker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChunkMode {
    /// Every unit is chunked on its own. Chunks never cross unit boundaries.
    #[default]
    PerUnit,

    /// Units are joined with a blank line and chunked as a single text.
    /// A chunk is labeled with the unit its first character belongs to.
    Concatenated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkConfig {
    /// Maximum amount of characters in a chunk.
    pub size: usize,

    /// Amount of characters shared by consecutive chunks.
    pub overlap: usize,

    pub mode: ChunkMode,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            mode: ChunkMode::PerUnit,
        }
    }
}

impl ChunkConfig {
    pub fn new(size: usize, overlap: usize) -> Self {
        Self {
            size,
            overlap,
            mode: ChunkMode::PerUnit,
        }
    }

    pub fn concatenated(mut self) -> Self {
        self.mode = ChunkMode::Concatenated;
        self
    }

    /// Split `units` into chunks, preserving unit order and labels.
    pub fn chunk(&self, units: &[SourceUnit]) -> Result<Vec<Chunk>, SeferError> {
        let chunker = map_err!(Recursive::new(self.size, self.overlap, DEFAULT_DELIMS));

        let chunks = match self.mode {
            ChunkMode::PerUnit => units
                .iter()
                .flat_map(|unit| {
                    chunker
                        .chunk(&unit.text)
                        .into_iter()
                        .enumerate()
                        .map(|(i, text)| Chunk::new(text, &unit.label, i))
                })
                .collect(),
            ChunkMode::Concatenated => chunk_concatenated(&chunker, units),
        };

        Ok(chunks)
    }
}

fn chunk_concatenated(chunker: &Recursive<'_>, units: &[SourceUnit]) -> Vec<Chunk> {
    let mut text = String::new();

    // Exclusive end offset of every unit in `text`, joiner included
    let mut bounds = Vec::with_capacity(units.len());

    for (i, unit) in units.iter().enumerate() {
        text.push_str(&unit.text);
        if i + 1 < units.len() {
            text.push_str(UNIT_JOINER);
        }
        bounds.push(text.len());
    }

    chunker
        .spans(&text)
        .into_iter()
        .enumerate()
        .map(|(i, span)| {
            let unit = bounds.partition_point(|end| *end <= span.start);
            Chunk::new(&text[span], &units[unit].label, i)
        })
        .collect()
}
