use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a report run can fail. None of these are recovered from: the
/// binary logs the error and exits.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no stopword file given (use --stopwords)")]
    MissingStopwords,
    #[error("problem opening or reading from stopwords file {}: {source}", path.display())]
    Stopwords { path: PathBuf, source: io::Error },
    #[error("problem opening or reading from input file {}: {reason}", path.display())]
    Input { path: PathBuf, reason: String },
    #[error("parts {} and {} would both be labelled '{label}'", first.display(), second.display())]
    DuplicateLabel {
        label: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("part {} would be labelled '{label}', which is reserved for a report artifact", path.display())]
    ReservedLabel { label: String, path: PathBuf },
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("need at least one word to draw word cloud '{label}', got 0")]
    EmptyCloud { label: String },
    #[error("cannot write image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("cannot fit a topic model over an empty vocabulary")]
    EmptyVocabulary,
    #[error("topic model returned {found} topics, {requested} were requested")]
    TopicCount { requested: usize, found: usize },
    #[error("{stage} has {found} entries but the corpus has {expected}")]
    Misaligned {
        stage: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("cannot write report {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}
