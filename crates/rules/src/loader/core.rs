//! Core [`DirectoryCorpus`] struct: filesystem-backed Sigma rule corpus.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sigsim_core::{CorpusError, CorpusRecord, DetectionRule, MalformedRule, RuleCorpus};
use tracing::{debug, info, warn};

use crate::sigma::parse_rule_file;

use super::error::{LoadResult, LoadStatus, Result};

/// Filesystem-backed rule corpus.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files and parses
/// each into a [`DetectionRule`]. Entries are visited in sorted path order so
/// enumeration order, and therefore tie ordering in rankings, is stable
/// across runs and platforms.
pub struct DirectoryCorpus {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
    /// Snapshot taken by the last scan, in corpus order.
    records: Vec<CorpusRecord>,
    /// Per-file outcome of the last scan.
    load_results: Vec<LoadResult>,
}

impl DirectoryCorpus {
    /// Open and scan a rules directory.
    ///
    /// A missing or unreadable root is an error: a corpus that cannot be
    /// enumerated leaves nothing to compare against.
    pub fn open(rules_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut corpus = Self {
            rules_dir: rules_dir.into(),
            records: Vec::new(),
            load_results: Vec::new(),
        };
        corpus.reload()?;
        Ok(corpus)
    }

    /// Re-scan the directory, replacing the current snapshot.
    pub fn reload(&mut self) -> Result<()> {
        if !self.rules_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("rules directory not found: {}", self.rules_dir.display()),
            )
            .into());
        }

        let mut records = Vec::new();
        let mut results = Vec::new();
        let mut seen = HashSet::new();
        scan_dir_recursive(&self.rules_dir, &mut records, &mut results, &mut seen)?;

        let loaded = records.iter().filter(|r| r.is_ok()).count();
        info!(
            path = %self.rules_dir.display(),
            loaded,
            malformed = records.len() - loaded,
            "rule corpus scanned"
        );

        self.records = records;
        self.load_results = results;
        Ok(())
    }

    /// Get the rules directory path.
    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Per-file outcome of the last scan.
    pub fn load_results(&self) -> &[LoadResult] {
        &self.load_results
    }

    /// Number of successfully parsed rules.
    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_ok()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recursively scan a directory for YAML rule files.
///
/// The root itself must be readable; unreadable subdirectories are logged
/// and skipped.
fn scan_dir_recursive(
    dir: &Path,
    records: &mut Vec<CorpusRecord>,
    results: &mut Vec<LoadResult>,
    seen: &mut HashSet<String>,
) -> Result<()> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        // Skip dotfiles/dotdirs
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                if path.is_file() {
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Hidden,
                    });
                }
                continue;
            }
        }

        if path.is_dir() {
            if let Err(e) = scan_dir_recursive(&path, records, results, seen) {
                warn!(path = %path.display(), error = %e, "failed to read directory");
            }
            continue;
        }

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "yml" || e == "yaml")
            .unwrap_or(false);

        if !is_yaml {
            results.push(LoadResult {
                path,
                status: LoadStatus::NotYaml,
            });
            continue;
        }

        match parse_rule_file(&path) {
            Ok(rule) => {
                if !seen.insert(rule.id.clone()) {
                    warn!(rule_id = %rule.id, path = %path.display(), "duplicate rule id, keeping first");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::DuplicateId { rule_id: rule.id },
                    });
                    continue;
                }
                debug!(rule_id = %rule.id, path = %path.display(), "loaded rule");
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Loaded {
                        rule_id: rule.id.clone(),
                    },
                });
                records.push(Ok(rule));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load rule file");
                records.push(Err(MalformedRule::new(
                    path.display().to_string(),
                    e.to_string(),
                )));
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Malformed {
                        reason: e.to_string(),
                    },
                });
            }
        }
    }

    Ok(())
}

impl RuleCorpus for DirectoryCorpus {
    fn rules(&self) -> std::result::Result<Vec<CorpusRecord>, CorpusError> {
        Ok(self.records.clone())
    }

    fn get(&self, id: &str) -> std::result::Result<Option<DetectionRule>, CorpusError> {
        Ok(self
            .records
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .find(|rule| rule.id == id)
            .cloned())
    }
}
