//! Error types for pnor-core
//!
//! Most operations of the engines degrade failures into empty data or a
//! per-partition outcome rather than returning these errors. They surface
//! from the lower-level helpers (`read_version`, the tool runner, config
//! loading) for callers that want to know what went wrong.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// pnor-core errors
#[derive(Debug, Error)]
pub enum Error {
    /// The flash tool could not be started or waited on
    #[error("Failed to run '{program}': {source}")]
    ToolSpawn {
        /// Program that failed to run
        program: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The flash tool reported a non-zero status
    #[error("'{command}' failed with return code {status}")]
    ToolFailed {
        /// Command line
        command: String,
        /// Exit status
        status: i32,
    },

    /// The flash tool exceeded its deadline and was killed
    #[error("'{command}' timed out after {secs}s")]
    ToolTimeout {
        /// Command line
        command: String,
        /// Deadline in seconds
        secs: u64,
    },

    /// The scratch directory for a partition read could not be created
    #[error("Failed to create temp dir: {0}")]
    TempDir(#[source] io::Error),

    /// Reading a partition image from disk failed
    #[error("Failed to read {}: {source}", path.display())]
    ImageRead {
        /// Dump file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be read
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for pnor-core operations
pub type Result<T> = std::result::Result<T, Error>;
