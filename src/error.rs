use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Error)]
pub enum EvalError {
    /// A file could not be opened or created. The underlying error is kept as-is.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended part-way through a four-line record.
    #[error("truncated record at line {line}: expected four lines per record")]
    TruncatedRecord { line: usize },

    #[error("invalid record at line {line}: {msg}")]
    InvalidRecord { line: usize, msg: String },

    #[error("cannot derive a numeric order key from identifier '{id}'")]
    OrderKey { id: String },

    /// The trimmer output holds a read the answer stream never produced.
    #[error("identifier '{id}' from the trimmer output is absent from the answer stream")]
    UnknownIdentifier { id: String },

    #[error("mate identifiers disagree with the answer: expected '{expected}', found '{found}'")]
    MateMismatch { expected: String, found: String },

    #[error("paired files have different record counts (diverged after {pairs} pairs)")]
    UnequalPairCounts { pairs: u64 },

    #[error("expected one or two files, got {0}")]
    FileCount(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
