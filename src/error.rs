use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no input files to merge")]
    NoInput,

    #[error("output file {0:?} already exists, use --force to overwrite it")]
    OutputExists(PathBuf),

    #[error("unable to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to scan directory {path:?}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} is {size} bytes, over the limit of {limit} bytes")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

impl MergeError {
    /// Path the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            MergeError::NoInput => None,
            MergeError::OutputExists(path)
            | MergeError::Read { path, .. }
            | MergeError::Write { path, .. }
            | MergeError::Scan { path, .. }
            | MergeError::TooLarge { path, .. } => Some(path.as_path()),
        }
    }
}
