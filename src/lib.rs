//! Entry point functions
//!
//! Concatenates text files, given explicitly or found by a recursive
//! directory scan, into a single output file:
//!
//! ```no_run
//! use mdmerge::{InputSource, MergeConfig};
//!
//! let config = MergeConfig::new(InputSource::Directory("docs".into()), "all_docs.md");
//! let result = mdmerge::merge(&config)?;
//! println!("{} files, {} bytes", result.files_merged, result.bytes_written);
//! # Ok::<(), mdmerge::MergeError>(())
//! ```
pub mod config;
mod error;
mod folders;
mod merger;

pub use config::{InputSource, MergeConfig, MergeOptions, Settings};
pub use error::{MergeError, Result};
pub use folders::{collect_paths, resolve_inputs};
pub use merger::{merge, render, MergeResult, MergeWriter};
