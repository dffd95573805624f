//! Message model and JSON wire codec.
//!
//! A message is an insertion-ordered mapping from field name to JSON value.
//! Fields whose names start with `_` are control fields; everything else is
//! content. Control fields are matched by exact name and never renamed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RouterError;

/// Presence alone routes a message to the highest-priority queue.
pub const SPECIAL_FIELD: &str = "_special";

/// Names another field whose value gets digested; receives the digest.
pub const HASH_FIELD: &str = "_hash";

/// Literal content key that triggers the second dispatch rule.
pub const HASH_KEY: &str = "hash";

/// Groups messages into one ordered sequence.
pub const SEQUENCE_FIELD: &str = "_sequence";

/// Position of a message within its sequence.
pub const PART_FIELD: &str = "_part";

/// Structured message as decoded from the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: IndexMap<String, Value>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode JSON text into a message.
    ///
    /// # Errors
    /// Returns [`RouterError::Decode`] unless `text` is a JSON object.
    pub fn decode(text: &str) -> Result<Self, RouterError> {
        serde_json::from_str(text).map_err(RouterError::Decode)
    }

    /// Encode the message as compact JSON, preserving field order.
    pub fn encode(&self) -> Result<String, RouterError> {
        serde_json::to_string(self).map_err(RouterError::Encode)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Fields whose names do not start with `_`.
    pub fn content_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().filter(|(name, _)| !is_private_field(name))
    }

    /// Replace every top-level value with `f(value)`.
    pub(crate) fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(Value) -> Value,
    {
        for value in self.fields.values_mut() {
            let current = std::mem::take(value);
            *value = f(current);
        }
    }

    /// Sequence id and part number, if both are present and well formed.
    ///
    /// `_sequence` must be text and `_part` a non-negative integer-valued
    /// number.
    pub fn sequence_key(&self) -> Option<(String, u64)> {
        let sequence = self.get(SEQUENCE_FIELD)?.as_str()?;
        let part = as_part_number(self.get(PART_FIELD)?)?;
        Some((sequence.to_string(), part))
    }
}

impl From<IndexMap<String, Value>> for Message {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Message {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Private (control) fields start with an underscore.
pub fn is_private_field(name: &str) -> bool {
    name.starts_with('_')
}

/// Whether a value is an integer-valued number.
///
/// JSON integers always qualify; floats qualify when finite with no
/// fractional part.
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().map_or(false, |f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

/// Integer view of an integer-valued number, saturating at the `i64` bounds.
pub fn as_integer(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) if is_integer(value) => n,
        _ => return None,
    };
    if let Some(i) = n.as_i64() {
        Some(i)
    } else if n.is_u64() {
        Some(i64::MAX)
    } else {
        // `as` saturates for out-of-range floats
        n.as_f64().map(|f| f as i64)
    }
}

/// Part number for sequence buffering: a non-negative integer-valued number.
pub fn as_part_number(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) if is_integer(value) => n,
        _ => return None,
    };
    if let Some(u) = n.as_u64() {
        Some(u)
    } else if n.is_i64() {
        None
    } else {
        n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)
    }
}
