//! Signature extraction: reduce a detection tree to comparable fields and values.

mod clean;


use std::collections::BTreeSet;

use serde::Serialize;
use sigsim_core::{Node, CONDITION_KEY};

pub use clean::{clean_field, clean_value};

/// Normalized view of one rule's detection block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Signature {
    /// Field names, duplicates collapsed.
    pub fields: BTreeSet<String>,
    /// Literal values in extraction order, duplicates kept.
    pub values: Vec<String>,
}

impl Signature {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.values.is_empty()
    }
}

/// Extract the field and value signature of a detection tree.
///
/// Never fails: anything that is not a map (or a list of maps) at the root
/// contributes nothing, so a missing or malformed detection block yields an
/// empty signature. The `condition` expression is skipped at every level.
pub fn extract(detection: &Node) -> Signature {
    let mut signature = Signature::default();
    walk(detection, None, &mut signature);
    signature
}

// `context` is the key the current node hangs under.
fn walk(node: &Node, context: Option<&str>, out: &mut Signature) {
    match node {
        Node::Map(map) => {
            for (key, value) in map {
                if key == CONDITION_KEY {
                    continue;
                }
                if let Some(field) = clean_field(key) {
                    out.fields.insert(field);
                }
                match value {
                    Node::Scalar(s) => push_value(s, out),
                    Node::List(items) => {
                        for item in items {
                            match item {
                                Node::Scalar(s) => push_value(s, out),
                                Node::Null => {}
                                nested => walk(nested, Some(key), out),
                            }
                        }
                    }
                    Node::Map(_) => walk(value, Some(key), out),
                    Node::Null => {}
                }
            }
        }
        Node::List(items) => {
            for item in items {
                walk(item, context, out);
            }
        }
        Node::Scalar(_) | Node::Null => {}
    }
}

fn push_value(raw: &str, out: &mut Signature) {
    let cleaned = clean_value(raw);
    if !cleaned.is_empty() {
        out.values.push(cleaned);
    }
}

/// Flatten a detection tree into one lowercase text blob.
///
/// Keys lose their modifiers, the condition expression is kept. Used by the
/// detection-content scorer, which compares whole blocks rather than values.
pub fn detection_text(detection: &Node) -> String {
    let mut parts = Vec::new();
    flatten(detection, &mut parts);
    parts.join(" ")
}

fn flatten(node: &Node, parts: &mut Vec<String>) {
    match node {
        Node::Map(map) => {
            for (key, value) in map {
                let key = key.split('|').next().unwrap_or_default().to_lowercase();
                if !key.is_empty() {
                    parts.push(key);
                }
                flatten(value, parts);
            }
        }
        Node::List(items) => items.iter().for_each(|item| flatten(item, parts)),
        Node::Scalar(s) => parts.push(s.to_lowercase()),
        Node::Null => {}
    }
}
