use thiserror::Error;

/// Failure to enumerate or query the rule corpus.
///
/// Always fatal for a batch: without candidates there is nothing to rank.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// An environment variable that is set but cannot be read as its type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

/// A single corpus record that could not be turned into a [`crate::DetectionRule`].
///
/// Unlike [`CorpusError`] this only disqualifies the one record.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed rule '{source_id}': {reason}")]
pub struct MalformedRule {
    /// Where the record came from (file path, document id, ...).
    pub source_id: String,
    pub reason: String,
}

impl MalformedRule {
    pub fn new(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }
}
