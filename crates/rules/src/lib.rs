//! Sigma rule corpus access.
//!
//! This crate provides:
//! - Sigma YAML parsing into [`sigsim_core::DetectionRule`]
//! - A filesystem corpus that loads a rules directory recursively
//! - An in-memory corpus for callers that already hold parsed rules

pub mod loader;
pub mod memory;
pub mod sigma;

pub use loader::{DirectoryCorpus, LoadResult, LoadStatus, RuleError};
pub use memory::MemoryCorpus;
pub use sigma::{parse_rule, parse_rule_file};
