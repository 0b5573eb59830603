//! Filesystem rule corpus.
//!
//! Scans a rules directory recursively for Sigma YAML files and serves them
//! through the [`sigsim_core::RuleCorpus`] seam. Files that fail to parse are
//! kept as malformed records so the batch can report and skip them.

mod core;
mod error;


pub use self::core::DirectoryCorpus;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
