//! Error types for indexing
//!
//! Every error is scoped to one contract/spec pair. The batch driver logs and
//! skips the pair; the single-pair CLI turns it into a non-zero exit.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// An input file is absent or unreadable
    #[error("cannot read input {}: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        source: io::Error,
    },

    /// The output artifact could not be written
    #[error("cannot write output {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to serialize index records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid scanner pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("cannot read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("cannot parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    /// Wrap an IO error raised while reading an input file
    pub fn missing_input(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IndexError::MissingInput {
            path: path.into(),
            source,
        }
    }
}
