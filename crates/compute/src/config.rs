//! Scoring configuration: weight presets, thresholds and value-scoring constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sigsim_core::config::ScoringSettings;

/// Misconfiguration detected before any scoring starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid weight '{name}': {value} (must be finite and >= 0)")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("weight sum {0} must be in (0, 1]")]
    WeightSum(f64),

    #[error("threshold {0} must be in [0, 1]")]
    Threshold(f64),

    #[error("top_n must be at least 1")]
    TopN,

    #[error("value scoring constant '{name}' = {value} must be in [0, 1]")]
    ValueScoring { name: &'static str, value: f64 },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("step-down step {step} must be in (0, 1] and floor {floor} in [0, 1]")]
    StepDown { step: f64, floor: f64 },
}

// ── Weights ─────────────────────────────────────────────────────────

/// Relative weights of the component scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub value: f64,
    pub field: f64,
    /// Weight of the flattened detection-text ratio; 0 disables that scorer.
    pub content: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.value + self.field + self.content
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("value", self.value),
            ("field", self.field),
            ("content", self.content),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let sum = self.sum();
        // Float sums like 0.7 + 0.2 + 0.1 land a hair under or over 1.0.
        if sum <= 0.0 || sum > 1.0 + 1e-9 {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Named weight presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WeightPreset {
    /// value 0.8, field 0.2.
    #[default]
    ValueField,
    /// detection content 0.7, field 0.2, value 0.1.
    ContentFieldValue,
}

impl WeightPreset {
    pub fn weights(self) -> Weights {
        match self {
            WeightPreset::ValueField => Weights {
                value: 0.8,
                field: 0.2,
                content: 0.0,
            },
            WeightPreset::ContentFieldValue => Weights {
                value: 0.1,
                field: 0.2,
                content: 0.7,
            },
        }
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightPreset::ValueField => write!(f, "value-field"),
            WeightPreset::ContentFieldValue => write!(f, "content-field-value"),
        }
    }
}

impl FromStr for WeightPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value-field" => Ok(WeightPreset::ValueField),
            "content-field-value" => Ok(WeightPreset::ContentFieldValue),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

// ── Meaningful-match gate ───────────────────────────────────────────

/// Gate presets for 3-5 character strings in a prefix relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GatePreset {
    /// Prefix matches need a combined score above 0.6.
    #[default]
    Loose,
    /// Prefix matches need a combined score above 0.5.
    Strict,
}

impl GatePreset {
    pub fn prefix_gate(self) -> f64 {
        match self {
            GatePreset::Loose => 0.6,
            GatePreset::Strict => 0.5,
        }
    }
}

impl fmt::Display for GatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatePreset::Loose => write!(f, "loose"),
            GatePreset::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for GatePreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loose" => Ok(GatePreset::Loose),
            "strict" => Ok(GatePreset::Strict),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

// ── Value scoring constants ─────────────────────────────────────────

/// Constants of the per-pair value score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueScoring {
    /// Bonus when one value contains the other at a length ratio >= `full_bonus_ratio`.
    pub substring_bonus: f64,
    /// Bonus between `min_bonus_ratio` and `full_bonus_ratio`.
    pub reduced_bonus: f64,
    pub full_bonus_ratio: f64,
    pub min_bonus_ratio: f64,
    /// Subtracted when the values share a word or number token but got no bonus.
    pub token_penalty: f64,
    /// Score a 3-5 char prefix match must exceed.
    pub prefix_gate: f64,
}

impl Default for ValueScoring {
    fn default() -> Self {
        Self::with_gate(GatePreset::default())
    }
}

impl ValueScoring {
    pub fn with_gate(gate: GatePreset) -> Self {
        Self {
            substring_bonus: 0.1,
            reduced_bonus: 0.05,
            full_bonus_ratio: 0.5,
            min_bonus_ratio: 0.3,
            token_penalty: 0.3,
            prefix_gate: gate.prefix_gate(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("substring_bonus", self.substring_bonus),
            ("reduced_bonus", self.reduced_bonus),
            ("full_bonus_ratio", self.full_bonus_ratio),
            ("min_bonus_ratio", self.min_bonus_ratio),
            ("token_penalty", self.token_penalty),
            ("prefix_gate", self.prefix_gate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValueScoring { name, value });
            }
        }
        Ok(())
    }
}

// ── Threshold step-down ─────────────────────────────────────────────

/// Lowers the threshold of a first-match search that found nothing.
///
/// Levels run from the configured threshold down by `step`, stopping at
/// `floor` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepDown {
    pub step: f64,
    pub floor: f64,
}

impl Default for StepDown {
    fn default() -> Self {
        Self {
            step: 0.1,
            floor: 0.2,
        }
    }
}

impl StepDown {
    /// Thresholds below `start` to retry with, highest first.
    pub fn levels(&self, start: f64) -> Vec<f64> {
        (1..)
            .map(|k| start - k as f64 * self.step)
            .take_while(|level| *level >= self.floor - 1e-9)
            .map(|level| level.max(0.0))
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let step_ok = self.step.is_finite() && self.step > 0.0 && self.step <= 1.0;
        if !step_ok || !(0.0..=1.0).contains(&self.floor) {
            return Err(ConfigError::StepDown {
                step: self.step,
                floor: self.floor,
            });
        }
        Ok(())
    }
}

// ── Top-level scoring config ────────────────────────────────────────

/// Everything the ranker needs: weights, cut-offs and value-scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: Weights,
    /// Minimum weighted score to keep (inclusive).
    pub threshold: f64,
    pub top_n: usize,
    pub value_scoring: ValueScoring,
    /// Only consulted by first-match searches; off unless set.
    #[serde(default)]
    pub step_down: Option<StepDown>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: WeightPreset::default().weights(),
            threshold: 0.5,
            top_n: 10,
            value_scoring: ValueScoring::default(),
            step_down: None,
        }
    }
}

impl ScoringConfig {
    pub fn from_preset(preset: WeightPreset) -> Self {
        Self {
            weights: preset.weights(),
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_gate(mut self, gate: GatePreset) -> Self {
        self.value_scoring.prefix_gate = gate.prefix_gate();
        self
    }

    pub fn with_step_down(mut self, step_down: StepDown) -> Self {
        self.step_down = Some(step_down);
        self
    }

    /// Build and validate from environment-derived settings.
    pub fn from_settings(settings: &ScoringSettings) -> Result<Self, ConfigError> {
        let preset: WeightPreset = settings.preset.parse()?;
        let gate: GatePreset = settings.gate.parse()?;
        let config = Self::from_preset(preset)
            .with_gate(gate)
            .with_threshold(settings.threshold)
            .with_top_n(settings.top_n);
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could produce scores outside [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if self.top_n == 0 {
            return Err(ConfigError::TopN);
        }
        if let Some(step_down) = &self.step_down {
            step_down.validate()?;
        }
        self.value_scoring.validate()
    }
}
