use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use sigsim_core::Config;

/// Rank the rules of a Sigma corpus by similarity to one target rule.
///
/// Flags override the environment (`RULES_DIR`, `SIMILARITY_THRESHOLD`, ...),
/// which in turn overrides built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "sigsim-compare", about = "Find Sigma rules similar to a target rule")]
pub struct CliArgs {
    /// Sigma rule (YAML) to compare against the corpus
    pub target: PathBuf,

    /// Corpus root, scanned recursively for *.yml / *.yaml
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    /// Weight preset: value-field or content-field-value
    #[arg(long)]
    pub preset: Option<String>,

    /// Meaningful-match gate preset: loose or strict
    #[arg(long)]
    pub gate: Option<String>,

    /// Minimum weighted similarity to report (inclusive)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Maximum number of results
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Scoring worker threads (0 = one per core)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Abort the batch after this many seconds (0 = no deadline)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Stop at the first candidate that reaches the threshold
    #[arg(long)]
    pub first: bool,

    /// With --first: lower the threshold by 0.1 (down to 0.2) until a match is found
    #[arg(long, requires = "first")]
    pub step_down: bool,

    /// Ask the Ollama server for a short summary of every result
    #[arg(long)]
    pub summarize: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CliArgs {
    /// Layer explicit flags over the environment-derived config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.rules_dir {
            config.corpus.rules_dir = dir.clone();
        }
        if let Some(preset) = &self.preset {
            config.scoring.preset = preset.clone();
        }
        if let Some(gate) = &self.gate {
            config.scoring.gate = gate.clone();
        }
        if let Some(threshold) = self.threshold {
            config.scoring.threshold = threshold;
        }
        if let Some(top_n) = self.top_n {
            config.scoring.top_n = top_n;
        }
        if let Some(workers) = self.workers {
            config.scoring.max_workers = workers;
        }
        if let Some(secs) = self.timeout_secs {
            config.scoring.batch_timeout_secs = secs;
        }
        if self.summarize {
            config.ollama.enabled = true;
        }
    }
}
