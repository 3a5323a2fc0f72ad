use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for the conversion pipeline.
///
/// Writer failures are contained by [`Glossary::write`](crate::glossary::Glossary::write),
/// which logs them and returns `None` instead of propagating; everything else
/// surfaces through `Result`.
#[derive(Debug, Error)]
pub enum GlossaryError {
    /// No format could be derived from the filename or an explicit hint.
    #[error("cannot resolve a format for {0:?}")]
    FormatResolution(PathBuf),

    /// Illegal glossary mode transition, e.g. an indirect read while
    /// streaming readers are still attached.
    #[error("invalid glossary state: {0}")]
    State(String),

    /// The format exists but lacks read or write support.
    #[error("{format} format has no {operation} support")]
    Unsupported {
        format: String,
        operation: &'static str,
    },

    /// A reader failed to open its source.
    #[error("failed to open {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A reader hit unparseable input. The whole read fails; entry-level
    /// skipping is the filter chain's job, not the reader's.
    #[error("malformed entry at {path:?} line {line}")]
    Parse { path: PathBuf, line: u64 },

    /// A writer failed during emission.
    #[error("write failed: {0}")]
    Write(String),

    /// The external compression tool failed or is missing.
    #[error("archive tool failed for {path:?}: {message}")]
    Archive { path: PathBuf, message: String },

    /// An entry was constructed with no words.
    #[error("entry must have at least one word")]
    EmptyEntry,

    /// Spill-run encode/decode failure during streaming sort.
    #[error("spill codec error")]
    Spill(#[from] bincode::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GlossaryError>;
