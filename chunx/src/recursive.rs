use super::{char_count, ChunkerError};
use std::ops::Range;
use tracing::debug;

/// Default delimiters for the [recursive chunker][Recursive], coarsest first.
///
/// Paragraphs, lines, verse stops (sof pasuq), sentence and clause punctuation,
/// words and finally single characters.
pub const DEFAULT_DELIMS: &[&str] = &[
    "\n\n", "\n", "׃", ". ", "? ", "! ", "; ", ", ", " ", "",
];

const RECURSIVE_DEFAULT_SIZE: usize = 350;
const RECURSIVE_DEFAULT_OVERLAP: usize = 40;

/// A chunker based on langchain's
/// [RecursiveCharacterSplitter](https://dev.to/eteimz/understanding-langchains-recursivecharactertextsplitter-2846).
///
/// Given a size, an overlap and a set of delimiters, recursively splits the input using the delimiters.
///
/// The input is first split with the first delimiter present in it. Pieces are merged together
/// as long as they fit; every piece larger than allowed is split again with the next delimiter
/// in the chain until small enough pieces can be assembled. The empty delimiter splits into
/// single characters and is the last resort.
///
/// Sizes are measured in characters, not bytes.
///
/// Every chunk consists of a core of at most `size - overlap` characters, preceded by the
/// `overlap` characters of the input that come right before the core. Cores never overlap
/// and together cover the whole (trimmed) input, so chunk `i + 1` always starts `overlap`
/// characters before chunk `i` ends.
///
/// Whitespace-only cores are attached to a neighbouring core when it has room for them.
///
/// If the delimiters do not end with `""`, a piece that cannot be split any further is
/// emitted whole and will be larger than `size`.
#[derive(Debug, Clone)]
pub struct Recursive<'a> {
    /// Target maximum amount of characters in a chunk.
    pub size: usize,

    /// Amount of characters shared between consecutive chunks.
    pub overlap: usize,

    /// The delimiters to use when splitting.
    pub delims: &'a [&'a str],
}

impl<'delim> Recursive<'delim> {
    /// Create a new `Recursive` chunker.
    /// Errors if `size` is 0, if `overlap` is not less than `size`
    /// or if no delimiters are given.
    pub fn new(size: usize, overlap: usize, delims: &'delim [&'delim str]) -> Result<Self, ChunkerError> {
        if size == 0 {
            return Err(ChunkerError::Config(
                "size must be greater than 0".to_string(),
            ));
        }

        if overlap >= size {
            return Err(ChunkerError::Config(
                "overlap must be less than size".to_string(),
            ));
        }

        if delims.is_empty() {
            return Err(ChunkerError::Config(
                "at least one delimiter is required".to_string(),
            ));
        }

        Ok(Self {
            size,
            overlap,
            delims,
        })
    }

}

impl Default for Recursive<'_> {
    fn default() -> Self {
        Self {
            size: RECURSIVE_DEFAULT_SIZE,
            overlap: RECURSIVE_DEFAULT_OVERLAP,
            delims: DEFAULT_DELIMS,
        }
    }
}

impl Recursive<'_> {
    /// Chunk the input. Every chunk is a slice of `input`.
    pub fn chunk<'input>(&self, input: &'input str) -> Vec<&'input str> {
        self.spans(input)
            .into_iter()
            .map(|span| &input[span])
            .collect()
    }

    /// Byte ranges into `input` of every chunk, overlap included.
    pub fn spans(&self, input: &str) -> Vec<Range<usize>> {
        let start = input.len() - input.trim_start().len();
        let trimmed = input[start..].trim_end();

        if trimmed.is_empty() {
            return vec![];
        }

        let budget = self.size - self.overlap;

        let mut cores = vec![];
        self.split_cores(trimmed, start, 0, budget, &mut cores);
        let cores = absorb_blank(input, cores, budget);

        let spans = cores
            .into_iter()
            .enumerate()
            .map(|(i, core)| {
                if i == 0 {
                    return core;
                }
                back_off(input, start, core.start, self.overlap)..core.end
            })
            .collect::<Vec<_>>();

        debug!(
            "Chunked {} chunks, avg chunk size: {}",
            spans.len(),
            spans
                .iter()
                .fold(0, |acc, span| acc + char_count(&input[span.clone()]))
                / spans.len()
        );

        spans
    }

    /// Split `text` into cores and push their byte ranges (offset by `base`) into `cores`.
    ///
    /// `idx` - The index of the first delimiter to try.
    ///
    /// The first delimiter from `idx` onward found in `text` is used to split it into pieces.
    /// Pieces are appended to the current core until the next one would make it larger
    /// than `budget`, at which point the core is pushed and a new one is started.
    /// Pieces that are larger than `budget` by themselves get another round of splitting
    /// with the next delimiters.
    fn split_cores(
        &self,
        text: &str,
        base: usize,
        idx: usize,
        budget: usize,
        cores: &mut Vec<Range<usize>>,
    ) {
        let found = self.delims[idx..]
            .iter()
            .position(|delim| delim.is_empty() || text.contains(delim));

        let Some(pos) = found else {
            // Nothing left to split with
            cores.push(base..base + text.len());
            return;
        };

        let delim = self.delims[idx + pos];
        let next = idx + pos + 1;

        let pieces: Vec<&str> = if delim.is_empty() {
            text.split_inclusive(|_: char| true).collect()
        } else {
            text.split_inclusive(delim).collect()
        };

        let mut current: Option<Range<usize>> = None;
        let mut current_size = 0;
        let mut offset = base;

        for piece in pieces {
            let range = offset..offset + piece.len();
            offset = range.end;

            let size = char_count(piece);

            if let Some(ref mut core) = current {
                if current_size + size <= budget {
                    core.end = range.end;
                    current_size += size;
                    continue;
                }
            }

            if size <= budget {
                if let Some(core) = current.replace(range) {
                    cores.push(core);
                }
                current_size = size;
                continue;
            }

            if let Some(core) = current.take() {
                cores.push(core);
            }
            current_size = 0;

            if next >= self.delims.len() {
                cores.push(range);
            } else {
                self.split_cores(piece, range.start, next, budget, cores);
            }
        }

        if let Some(core) = current {
            cores.push(core);
        }
    }
}

/// Attach whitespace-only cores to a neighbouring core with enough room left,
/// preferring the preceding one.
fn absorb_blank(input: &str, cores: Vec<Range<usize>>, budget: usize) -> Vec<Range<usize>> {
    let mut out: Vec<(Range<usize>, usize)> = Vec::with_capacity(cores.len());
    let mut carry: Option<(Range<usize>, usize)> = None;

    for mut core in cores {
        let mut size = char_count(&input[core.clone()]);

        if let Some((blank, blank_size)) = carry.take() {
            if blank_size + size <= budget {
                core.start = blank.start;
                size += blank_size;
            } else {
                out.push((blank, blank_size));
            }
        }

        if input[core.clone()].trim().is_empty() {
            match out.last_mut() {
                Some((last, last_size)) if *last_size + size <= budget => {
                    last.end = core.end;
                    *last_size += size;
                }
                _ => carry = Some((core, size)),
            }
            continue;
        }

        out.push((core, size));
    }

    if let Some(blank) = carry {
        out.push(blank);
    }

    out.into_iter().map(|(core, _)| core).collect()
}

/// Byte index `amount` characters before `pos`, never going below `floor`.
fn back_off(input: &str, floor: usize, pos: usize, amount: usize) -> usize {
    input[floor..pos]
        .char_indices()
        .rev()
        .take(amount)
        .last()
        .map(|(i, _)| floor + i)
        .unwrap_or(pos)
}
