//! Indexer configuration
//!
//! Loaded from an optional YAML file with camelCase keys:
//!
//! ```yaml
//! inputDirectory: ContractsAndProperties
//! outputDirectory: DataIndex/raw_index
//! jobs: 4
//! ```
//!
//! Command-line flags override whatever the file says.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_DIR: &str = "ContractsAndProperties";
pub const DEFAULT_OUTPUT_DIR: &str = "DataIndex/raw_index";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexerConfig {
    /// Where `<stem>_index.json` artifacts are written
    pub output_directory: PathBuf,

    /// Directory holding `<stem>.sol` / `<stem>.spec` pairs
    pub input_directory: PathBuf,

    /// Worker threads for batch mode
    pub jobs: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            input_directory: PathBuf::from(DEFAULT_INPUT_DIR),
            jobs: 1,
        }
    }
}

impl IndexerConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> IndexResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| IndexError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| IndexError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, otherwise start from defaults
    pub fn load(path: Option<&Path>) -> IndexResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn with_overrides(
        mut self,
        input_directory: Option<PathBuf>,
        output_directory: Option<PathBuf>,
        jobs: Option<usize>,
    ) -> Self {
        if let Some(dir) = input_directory {
            self.input_directory = dir;
        }
        if let Some(dir) = output_directory {
            self.output_directory = dir;
        }
        if let Some(jobs) = jobs {
            self.jobs = jobs;
        }
        self
    }

    /// Number of workers to actually spawn (never zero)
    pub fn worker_count(&self) -> usize {
        self.jobs.max(1)
    }
}
