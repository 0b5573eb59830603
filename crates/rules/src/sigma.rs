//! Sigma document deserialization.
//!
//! Only the header fields and the `logsource`/`detection` blocks are read;
//! everything else in a Sigma document is ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;
use sigsim_core::{DetectionRule, Node};

use crate::loader::{Result, RuleError};

/// Raw serde view of a Sigma rule document.
///
/// Header fields are informational and kept as raw values so that an
/// unusual shape (a scalar `falsepositives`, a list of authors) never costs
/// the rule its detection block.
#[derive(Debug, Deserialize)]
struct SigmaDocument {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Value,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    level: Value,
    #[serde(default)]
    tags: Value,
    #[serde(default)]
    author: Value,
    #[serde(default)]
    references: Value,
    #[serde(default)]
    falsepositives: Value,
    #[serde(default)]
    logsource: Value,
    #[serde(default)]
    detection: Value,
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Single-valued header: a scalar as-is, a list joined with `", "`.
fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => scalar_text(other),
    }
}

/// Multi-valued header: a list keeps its scalar entries, a lone scalar
/// becomes a one-element list.
fn header_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

/// Parse a single Sigma YAML document.
///
/// `fallback_id` is used when the document carries no usable `id`, which is
/// common for hand-written rules. A missing or malformed `detection` block is
/// not an error; it simply yields a rule with nothing to compare.
pub fn parse_rule(yaml: &str, fallback_id: &str) -> Result<DetectionRule> {
    let doc: SigmaDocument = serde_yaml::from_str(yaml)?;

    let id = scalar_text(&doc.id).unwrap_or_else(|| fallback_id.to_string());
    if id.is_empty() {
        return Err(RuleError::MissingId);
    }

    let logsource = match doc.logsource {
        Value::Null => Node::default(),
        other => Node::from(other),
    };
    let detection = match doc.detection {
        Value::Null => Node::default(),
        other => Node::from(other),
    };

    Ok(DetectionRule {
        id,
        title: header_text(&doc.title).unwrap_or_default(),
        description: header_text(&doc.description).unwrap_or_default(),
        level: scalar_text(&doc.level),
        tags: header_list(&doc.tags).into_iter().collect(),
        author: header_text(&doc.author),
        references: header_list(&doc.references),
        falsepositives: header_list(&doc.falsepositives),
        logsource,
        detection,
    })
}

/// Read and parse a Sigma rule file, using the file stem as the fallback id.
pub fn parse_rule_file(path: &Path) -> Result<DetectionRule> {
    let contents = fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    parse_rule(&contents, stem)
}
