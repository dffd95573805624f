//! Value transform chain.
//!
//! An ordered list of named, pure value transforms. Each top-level field
//! value of a message runs through every step in registration order; nested
//! objects and arrays are passed through as single values.

use serde_json::Value;

use crate::message::{as_integer, Message};

/// Text containing this marker gets reversed.
pub const REVERSE_MARKER: &str = "Qadium";

/// A pure function over a single field value.
pub trait ValueTransform: Send + Sync {
    fn apply(&self, value: Value) -> Value;
}

/// Closures can be registered directly.
impl<F> ValueTransform for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn apply(&self, value: Value) -> Value {
        self(value)
    }
}

struct TransformStep {
    name: String,
    transform: Box<dyn ValueTransform>,
}

/// Ordered chain of value transforms.
#[derive(Default)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
}

impl TransformChain {
    /// Create an empty chain (behaves as identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: identity, marker reversal, integer complement.
    pub fn standard() -> Self {
        let mut chain = Self::new();
        chain.register("identity", Box::new(identity));
        chain.register("reverse_marked_text", Box::new(reverse_marked_text));
        chain.register("complement_integer", Box::new(complement_integer));
        chain
    }

    /// Append a step. It receives the output of every earlier step.
    pub fn register(&mut self, name: impl Into<String>, transform: Box<dyn ValueTransform>) {
        self.steps.push(TransformStep {
            name: name.into(),
            transform,
        });
    }

    /// Run `value` through every step in order.
    pub fn apply(&self, value: Value) -> Value {
        self.steps
            .iter()
            .fold(value, |acc, step| step.transform.apply(acc))
    }

    /// Transform every top-level field of `message`, private fields included.
    pub fn apply_to_message(&self, message: &mut Message) {
        message.map_values(|value| self.apply(value));
    }

    /// Step names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformChain")
            .field("steps", &self.names())
            .finish()
    }
}

pub fn identity(value: Value) -> Value {
    value
}

/// Reverse text (by character) when it contains [`REVERSE_MARKER`].
pub fn reverse_marked_text(value: Value) -> Value {
    match value {
        Value::String(s) if s.contains(REVERSE_MARKER) => Value::String(s.chars().rev().collect()),
        other => other,
    }
}

/// Bitwise complement (`-n - 1`) of integer-valued numbers.
///
/// The value is converted to `i64` first, saturating at the bounds, so
/// `23.0` becomes `-24` and stays integral on the wire.
pub fn complement_integer(value: Value) -> Value {
    match as_integer(&value) {
        Some(n) => Value::from(!n),
        None => value,
    }
}
