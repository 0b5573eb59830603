//! Loader errors and the per-file scan report.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("cannot read rule: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a Sigma document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Neither the document nor its file name gave an id.
    #[error("rule has no id")]
    MissingId,
}

pub type Result<T> = std::result::Result<T, RuleError>;

/// What a directory scan did with one file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loaded { rule_id: String },
    Hidden,
    NotYaml,
    /// An earlier file (in path order) already supplied this id.
    DuplicateId { rule_id: String },
    /// Kept in the corpus as a malformed record.
    Malformed { reason: String },
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}
