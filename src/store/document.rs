//! Schemaless guild configuration documents
//!
//! A [`Document`] is an ordered map of string keys to [`Value`]s. Callers address
//! nested keys with dotted paths such as `welcome.channel_id` or
//! `automod.badwords`. The store persists documents as plain JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Separator between the segments of a dotted path
pub const PATH_SEPARATOR: char = '.';

/// A single configuration value
///
/// Any JSON value loads. Whole numbers become `Integer`; numbers with a
/// fraction or outside the `i64` range become `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Wrap a platform id, bit-cast to `i64` the same way the store keys rows
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn id(id: u64) -> Self {
        Self::Integer(id as i64)
    }

    /// Wrap a list of platform ids
    #[must_use]
    pub fn id_list(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::List(ids.into_iter().map(Self::id).collect())
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Read back a value written by [`Value::id`]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => Some(*value as u64),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(document) => Some(document),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Self::Document(document)
    }
}

/// Configuration document for one guild
///
/// The default value is the empty document returned for guilds that have
/// never been written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    entries: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Top-level lookup without path splitting
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Top-level insert without path splitting
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Look up a value by dotted path
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.entries.get(first)?;
        for segment in segments {
            current = current.as_document()?.entries.get(segment)?;
        }
        Some(current)
    }

    /// Set a value by dotted path
    ///
    /// Missing intermediate documents are created. An intermediate value that
    /// is not a document is replaced by one. Returns the previous value at the
    /// path, if any.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> Option<Value> {
        let (parent, leaf) = match path.rsplit_once(PATH_SEPARATOR) {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };
        let target = match parent {
            Some(parent) => self.document_mut(parent),
            None => self,
        };
        target.entries.insert(leaf.to_string(), value.into())
    }

    /// Remove a value by dotted path, returning it
    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        match path.rsplit_once(PATH_SEPARATOR) {
            None => self.entries.remove(path),
            Some((parent, leaf)) => {
                let mut current = self;
                for segment in parent.split(PATH_SEPARATOR) {
                    match current.entries.get_mut(segment) {
                        Some(Value::Document(next)) => current = next,
                        _ => return None,
                    }
                }
                current.entries.remove(leaf)
            }
        }
    }

    /// Walk to the nested document at `path`, creating it where needed
    fn document_mut(&mut self, path: &str) -> &mut Self {
        let mut current = self;
        for segment in path.split(PATH_SEPARATOR) {
            let slot = current
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Value::Document(Self::new()));
            if !matches!(slot, Value::Document(_)) {
                *slot = Value::Document(Self::new());
            }
            current = match slot {
                Value::Document(next) => next,
                _ => unreachable!("slot was just replaced with a document"),
            };
        }
        current
    }

    #[must_use]
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get_path(path).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get_path(path).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_path(path).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// Read a list of ids, skipping entries that are not integers
    #[must_use]
    pub fn get_id_list(&self, path: &str) -> Vec<u64> {
        self.get_path(path)
            .and_then(Value::as_list)
            .map(|values| values.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
