//! The corpus collaborator seam.

use crate::error::{CorpusError, MalformedRule};
use crate::rule::DetectionRule;

/// One enumerated corpus entry: a parsed rule or the reason it could not be parsed.
pub type CorpusRecord = Result<DetectionRule, MalformedRule>;

/// Read access to a stored rule corpus.
///
/// Implementations are shared read-only across scoring workers.
pub trait RuleCorpus: Send + Sync {
    /// Enumerate every record in stable corpus order.
    ///
    /// An `Err` means the corpus itself could not be read; individual bad
    /// records are reported inline as `Err(MalformedRule)`.
    fn rules(&self) -> Result<Vec<CorpusRecord>, CorpusError>;

    /// Point lookup by rule id.
    fn get(&self, id: &str) -> Result<Option<DetectionRule>, CorpusError> {
        Ok(self
            .rules()?
            .into_iter()
            .filter_map(Result::ok)
            .find(|rule| rule.id == id))
    }
}
