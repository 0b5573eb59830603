use std::env;
use std::path::PathBuf;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnvError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, keeping `default` only when it is unset.
fn profiled_env_parse<T: FromStr>(profile: &str, key: &str, default: T) -> Result<T, EnvError> {
    match profiled_env_opt(profile, key) {
        Some(raw) => raw.trim().parse().map_err(|_| EnvError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> Result<bool, EnvError> {
    match profiled_env_opt(profile, key) {
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(EnvError::Invalid {
                key: key.to_string(),
                value: v,
            }),
        },
        None => Ok(default),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub corpus: CorpusConfig,
    pub scoring: ScoringSettings,
    pub ollama: OllamaConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SIGSIM_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    ///
    /// A key that is set but does not parse is an error, never a silent default.
    pub fn from_env() -> Result<Self, EnvError> {
        let profile = env_or("SIGSIM_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, EnvError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            corpus: CorpusConfig::from_env_profiled(p),
            scoring: ScoringSettings::from_env_profiled(p)?,
            ollama: OllamaConfig::from_env_profiled(p)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  corpus:   rules_dir={}", self.corpus.rules_dir.display());
        tracing::info!(
            "  scoring:  preset={}, gate={}, threshold={}, top_n={}, workers={}",
            self.scoring.preset,
            self.scoring.gate,
            self.scoring.threshold,
            self.scoring.top_n,
            self.scoring.resolved_workers()
        );
        tracing::info!(
            "  ollama:   enabled={}, url={}, model={}",
            self.ollama.enabled,
            self.ollama.url,
            self.ollama.model
        );
    }
}

// ── Corpus ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub rules_dir: PathBuf,
}

impl CorpusConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────

/// Raw scoring knobs as read from the environment.
///
/// Validation happens when these are turned into a scoring configuration,
/// not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Weight preset name, e.g. `value-field`.
    pub preset: String,
    /// Meaningful-match gate preset, `loose` or `strict`.
    pub gate: String,
    pub threshold: f64,
    pub top_n: usize,
    /// Worker threads; 0 means one per available core.
    pub max_workers: usize,
    /// Whole-batch deadline in seconds; 0 disables it.
    pub batch_timeout_secs: u64,
}

impl ScoringSettings {
    fn from_env_profiled(p: &str) -> Result<Self, EnvError> {
        Ok(Self {
            preset: profiled_env_or(p, "SCORING_PRESET", "value-field"),
            gate: profiled_env_or(p, "GATE_PRESET", "loose"),
            threshold: profiled_env_parse(p, "SIMILARITY_THRESHOLD", 0.5)?,
            top_n: profiled_env_parse(p, "TOP_N", 10)?,
            max_workers: profiled_env_parse(p, "MAX_WORKERS", 0)?,
            batch_timeout_secs: profiled_env_parse(p, "BATCH_TIMEOUT_SECS", 0)?,
        })
    }

    /// Worker count with `0` resolved to the number of available cores.
    pub fn resolved_workers(&self) -> usize {
        if self.max_workers > 0 {
            self.max_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }
}

// ── Ollama (summaries) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub enabled: bool,
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Result<Self, EnvError> {
        Ok(Self {
            enabled: profiled_env_bool(p, "OLLAMA_ENABLED", false)?,
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.1"),
            timeout_secs: profiled_env_parse(p, "OLLAMA_TIMEOUT_SECS", 60)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_prefix_wins_over_plain_key() {
        env::set_var("SIGSIMTEST_TOP_N", "3");
        let settings = ScoringSettings::from_env_profiled("SIGSIMTEST").unwrap();
        assert_eq!(settings.top_n, 3);
        env::remove_var("SIGSIMTEST_TOP_N");
    }

    #[test]
    fn unparseable_numbers_are_errors() {
        env::set_var("SIGSIMBADF_SIMILARITY_THRESHOLD", "high");
        let err = ScoringSettings::from_env_profiled("SIGSIMBADF").unwrap_err();
        env::remove_var("SIGSIMBADF_SIMILARITY_THRESHOLD");
        assert_eq!(
            err,
            EnvError::Invalid {
                key: "SIMILARITY_THRESHOLD".into(),
                value: "high".into()
            }
        );

        env::set_var("SIGSIMBADN_TOP_N", "-3");
        assert!(ScoringSettings::from_env_profiled("SIGSIMBADN").is_err());
        env::remove_var("SIGSIMBADN_TOP_N");
    }

    #[test]
    fn bool_keys_reject_unknown_words() {
        env::set_var("SIGSIMBOOL_OLLAMA_ENABLED", "maybe");
        assert!(OllamaConfig::from_env_profiled("SIGSIMBOOL").is_err());
        env::set_var("SIGSIMBOOL_OLLAMA_ENABLED", "Off");
        assert!(!OllamaConfig::from_env_profiled("SIGSIMBOOL").unwrap().enabled);
        env::remove_var("SIGSIMBOOL_OLLAMA_ENABLED");
    }

    #[test]
    fn resolved_workers_is_never_zero() {
        let settings = ScoringSettings {
            preset: "value-field".into(),
            gate: "loose".into(),
            threshold: 0.5,
            top_n: 10,
            max_workers: 0,
            batch_timeout_secs: 0,
        };
        assert!(settings.resolved_workers() > 0);

        let fixed = ScoringSettings { max_workers: 2, ..settings };
        assert_eq!(fixed.resolved_workers(), 2);
    }

    #[test]
    fn default_profile_label() {
        let config = Config {
            profile: String::new(),
            corpus: CorpusConfig { rules_dir: PathBuf::from("x") },
            scoring: ScoringSettings {
                preset: "value-field".into(),
                gate: "loose".into(),
                threshold: 0.5,
                top_n: 10,
                max_workers: 1,
                batch_timeout_secs: 0,
            },
            ollama: OllamaConfig {
                enabled: false,
                url: "http://localhost:11434".into(),
                model: "llama3.1".into(),
                timeout_secs: 60,
            },
        };
        assert_eq!(config.profile_label(), "default");
    }
}
