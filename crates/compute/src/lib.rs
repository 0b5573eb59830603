//! Rule-signature extraction and similarity scoring.
//!
//! Data flow: a [`DetectionRule`](sigsim_core::DetectionRule) is reduced to a
//! [`Signature`] (field-name set + value list), pairs of signatures are scored
//! by the field and value scorers, and the [`CompositeRanker`] combines,
//! filters and orders the scores. [`BatchOrchestrator`] fans a target rule out
//! over a whole corpus on a bounded worker pool.

pub mod batch;
pub mod config;
pub mod ranking;
pub mod signature;
pub mod similarity;

pub use batch::{BatchError, BatchOrchestrator, BatchOutcome, BatchReport, CancelToken};
pub use config::{ConfigError, GatePreset, ScoringConfig, StepDown, ValueScoring, WeightPreset, Weights};
pub use ranking::{ComparisonDetails, ComparisonResult, CompositeRanker, Profile, Scored, ValueMatch};
pub use signature::{extract, Signature};
pub use similarity::{
    content_similarity, field_similarity, is_meaningful_match, is_meaningful_match_with,
    value_similarity,
};
