//! In-memory corpus.

use sigsim_core::{CorpusError, CorpusRecord, DetectionRule, MalformedRule, RuleCorpus};

/// A corpus backed by records the caller already holds.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    records: Vec<CorpusRecord>,
}

impl MemoryCorpus {
    pub fn new(rules: Vec<DetectionRule>) -> Self {
        Self {
            records: rules.into_iter().map(Ok).collect(),
        }
    }

    /// Build from raw records, malformed entries included.
    pub fn from_records(records: Vec<CorpusRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, rule: DetectionRule) {
        self.records.push(Ok(rule));
    }

    pub fn push_malformed(&mut self, malformed: MalformedRule) {
        self.records.push(Err(malformed));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RuleCorpus for MemoryCorpus {
    fn rules(&self) -> Result<Vec<CorpusRecord>, CorpusError> {
        Ok(self.records.clone())
    }
}
