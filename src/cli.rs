use crate::{
    app::{source::sefaria::chapter_references, state::AppState},
    core::{
        chunk::ChunkConfig,
        generator::PromptTemplate,
        provider::ProviderFactory,
        retriever::DEFAULT_K,
        vector::{BuildOptions, Distance},
    },
    err, map_err,
    error::SeferError,
};
use clap::{Args, Subcommand};
use std::{ops::RangeInclusive, path::PathBuf};

/// Amount of characters shown after fetching a unit.
const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Subcommand)]
pub enum Execute {
    /// Fetch a single unit from Sefaria and write its plain text to a file.
    Fetch(FetchArg),

    /// Build an index from Sefaria references or local text files.
    Index(IndexArg),

    /// Answer a question using an index.
    Ask(AskArg),
}

#[derive(Debug, Args, Clone)]
pub struct FetchArg {
    /// Sefaria reference, e.g. `Genesis 1`.
    pub reference: String,

    /// File to write the text to.
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct IndexArg {
    /// Sefaria references to index. Can be repeated.
    #[arg(long, short)]
    pub reference: Vec<String>,

    /// Book to index chapters of, used with `--chapters`.
    #[arg(long, short)]
    pub book: Option<String>,

    /// Chapter range of `--book`, e.g. `1-50`.
    #[arg(long, short)]
    pub chapters: Option<String>,

    /// Local text files to index instead of Sefaria references. Can be repeated.
    #[arg(long, short)]
    pub file: Vec<PathBuf>,

    /// Directory to write the index to.
    #[arg(long, short, default_value = "index")]
    pub out: PathBuf,

    #[arg(long, default_value = "350")]
    pub chunk_size: usize,

    #[arg(long, default_value = "40")]
    pub chunk_overlap: usize,

    /// Chunk all units as one text instead of each on its own.
    #[arg(long, action)]
    pub concatenate: bool,

    /// `cosine` or `euclidean`.
    #[arg(long, default_value = "cosine")]
    pub distance: Distance,

    /// Amount of chunks embedded per request.
    #[arg(long, default_value = "32")]
    pub batch_size: usize,
}

#[derive(Debug, Args, Clone)]
pub struct AskArg {
    pub question: String,

    /// Directory of the index to search.
    #[arg(long, short, default_value = "index")]
    pub index: PathBuf,

    /// Amount of chunks to use as context.
    #[arg(short, default_value_t = DEFAULT_K)]
    pub k: usize,

    /// Language to answer in.
    #[arg(long)]
    pub language: Option<String>,
}

pub async fn run(command: Execute, state: AppState) -> Result<(), SeferError> {
    match command {
        Execute::Fetch(FetchArg { reference, out }) => {
            let source = state.providers.source.get_provider("sefaria")?;
            let unit = source.fetch(&reference).await?;

            map_err!(tokio::fs::write(&out, &unit.text).await);

            println!("Saved '{}' to {}", unit.label, out.display());
            println!();
            println!("{}", unit.text.chars().take(PREVIEW_CHARS).collect::<String>());
        }
        Execute::Index(arg) => {
            let mut chunking = ChunkConfig::new(arg.chunk_size, arg.chunk_overlap);
            if arg.concatenate {
                chunking = chunking.concatenated();
            }

            let options = BuildOptions {
                distance: arg.distance,
                batch_size: arg.batch_size,
                ..Default::default()
            };

            let (source, references) = references(&arg)?;

            let report = state
                .index_service(source, chunking, options)?
                .build(&references, &arg.out)
                .await?;

            print!("{report}");
        }
        Execute::Ask(AskArg {
            question,
            index,
            k,
            language,
        }) => {
            let mut service = state.query_service(&index).await?;
            if let Some(language) = language {
                service = service.with_prompt(PromptTemplate::new(language));
            }

            let answer = service.answer(&question, k).await?;

            println!("--- Retrieved Context ---");
            println!();
            println!("{}", answer.context);
            println!();
            println!("--- Answer ---");
            println!();
            println!("{}", answer.answer);
        }
    }

    Ok(())
}

/// The text source and the references to build an index from.
fn references(arg: &IndexArg) -> Result<(&'static str, Vec<String>), SeferError> {
    if !arg.file.is_empty() {
        let files = arg
            .file
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        return Ok(("fs", files));
    }

    let mut references = arg.reference.clone();

    match (&arg.book, &arg.chapters) {
        (Some(book), Some(chapters)) => {
            references.extend(chapter_references(book, parse_chapters(chapters)?))
        }
        (Some(_), None) | (None, Some(_)) => {
            return err!(ParseConfig, "`--book` and `--chapters` must be used together")
        }
        (None, None) => {}
    }

    if references.is_empty() {
        return err!(
            ParseConfig,
            "nothing to index; pass --reference, --book with --chapters, or --file"
        );
    }

    Ok(("sefaria", references))
}

/// Parse `a-b` or `a` into an inclusive chapter range.
fn parse_chapters(input: &str) -> Result<RangeInclusive<usize>, SeferError> {
    let parse = |n: &str| match n.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => err!(ParseConfig, "invalid chapter '{n}' in '{input}'"),
    };

    let range = match input.split_once('-') {
        Some((start, end)) => parse(start)?..=parse(end)?,
        None => {
            let chapter = parse(input)?;
            chapter..=chapter
        }
    };

    if range.is_empty() {
        return err!(ParseConfig, "empty chapter range '{input}'");
    }

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StartArgs;
    use clap::Parser;

    fn index_arg(args: &[&str]) -> IndexArg {
        let args = StartArgs::parse_from(["sefer", "index"].iter().chain(args));
        match args.command {
            Execute::Index(arg) => arg,
            _ => panic!("expected index command"),
        }
    }

    #[test]
    fn chapters_parse() {
        assert_eq!(1..=50, parse_chapters("1-50").unwrap());
        assert_eq!(3..=3, parse_chapters("3").unwrap());
        assert!(parse_chapters("5-1").is_err());
        assert!(parse_chapters("0-2").is_err());
        assert!(parse_chapters("one").is_err());
    }

    #[test]
    fn book_chapters_become_references() {
        let arg = index_arg(&["--book", "Genesis", "--chapters", "1-3", "-r", "Exodus 1"]);

        let (source, references) = references(&arg).unwrap();

        assert_eq!("sefaria", source);
        assert_eq!(
            vec!["Exodus 1", "Genesis 1", "Genesis 2", "Genesis 3"],
            references
        );
    }

    #[test]
    fn files_use_fs_source() {
        let arg = index_arg(&["--file", "a.txt", "--file", "b.txt", "--distance", "euclidean"]);

        let (source, references) = references(&arg).unwrap();

        assert_eq!("fs", source);
        assert_eq!(vec!["a.txt", "b.txt"], references);
        assert_eq!(Distance::Euclidean, arg.distance);
    }

    #[test]
    fn nothing_to_index() {
        assert!(references(&index_arg(&[])).is_err());
        assert!(references(&index_arg(&["--book", "Genesis"])).is_err());
    }

    #[test]
    fn ask_defaults() {
        let args = StartArgs::parse_from(["sefer", "ask", "מי ברא את העולם?"]);
        let Execute::Ask(arg) = args.command else {
            panic!("expected ask command");
        };

        assert_eq!(5, arg.k);
        assert_eq!(PathBuf::from("index"), arg.index);
    }
}
