//! Detection rule data model.
//!
//! A [`DetectionRule`] is read-only input: it is loaded once from the corpus
//! and shared across scoring workers. Its `detection` block is schema-less,
//! so it is held as a [`Node`] tree instead of typed structs.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;

/// Reserved detection key holding the boolean combination expression.
pub const CONDITION_KEY: &str = "condition";

/// One node of a nested detection tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// Key present without a literal (`Field: null`).
    Null,
    /// String, number or boolean, held as its canonical text.
    Scalar(String),
    List(Vec<Node>),
    /// Map in document order.
    Map(IndexMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Map(IndexMap::new())
    }
}

impl Node {
    pub fn as_map(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Top-level keys if this node is a map, in document order.
    pub fn keys(&self) -> Vec<&str> {
        self.as_map()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Node::Null => true,
            Node::Scalar(s) => s.is_empty(),
            Node::List(items) => items.is_empty(),
            Node::Map(map) => map.is_empty(),
        }
    }
}

/// Canonical text of a YAML scalar, or `None` for null and collections.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Sequence(items) => Node::List(items.iter().map(Node::from).collect()),
            Value::Mapping(mapping) => {
                let map = mapping
                    .iter()
                    .map(|(k, v)| {
                        let key = scalar_text(k).unwrap_or_else(|| format!("{k:?}"));
                        (key, Node::from(v))
                    })
                    .collect();
                Node::Map(map)
            }
            Value::Tagged(tagged) => Node::from(&tagged.value),
            scalar => scalar_text(scalar).map(Node::Scalar).unwrap_or(Node::Null),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from(&value)
    }
}

/// A Sigma-style detection rule as stored in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DetectionRule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: Option<String>,
    pub tags: BTreeSet<String>,
    pub author: Option<String>,
    pub references: Vec<String>,
    pub falsepositives: Vec<String>,
    pub logsource: Node,
    pub detection: Node,
}

impl DetectionRule {
    /// Build a bare rule around a detection tree; mostly used by tests and
    /// in-memory corpora.
    pub fn new(id: impl Into<String>, title: impl Into<String>, detection: Node) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            detection,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_logsource(mut self, logsource: Node) -> Self {
        self.logsource = logsource;
        self
    }
}
