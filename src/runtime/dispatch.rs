//! Dispatch rule chain.
//!
//! Rules are held highest-priority first and evaluated against the
//! transformed message; the first match picks the destination queue. A
//! catch-all fallback makes dispatch total.

use serde_json::Value;

use crate::message::{is_integer, Message, HASH_KEY, SPECIAL_FIELD};

/// Content text containing this marker routes to the text queue.
pub const DISPATCH_MARKER: &str = "muidaQ";

/// Predicate over a whole message.
pub type MessagePredicate = Box<dyn Fn(&Message) -> bool + Send + Sync>;

/// A named predicate and the queue it selects.
pub struct DispatchRule {
    name: String,
    queue: usize,
    predicate: MessagePredicate,
}

impl DispatchRule {
    pub fn new(name: impl Into<String>, queue: usize, predicate: MessagePredicate) -> Self {
        Self {
            name: name.into(),
            queue,
            predicate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> usize {
        self.queue
    }

    pub fn matches(&self, message: &Message) -> bool {
        (self.predicate)(message)
    }
}

impl std::fmt::Debug for DispatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRule")
            .field("name", &self.name)
            .field("queue", &self.queue)
            .finish()
    }
}

/// First-match-wins list of dispatch rules.
#[derive(Debug)]
pub struct DispatchChain {
    rules: Vec<DispatchRule>,
    fallback: usize,
}

impl DispatchChain {
    /// Empty chain that sends everything to `fallback`.
    pub fn new(fallback: usize) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// The standard five-queue routing:
    ///
    /// | priority | condition                                  | queue |
    /// |----------|--------------------------------------------|-------|
    /// | 1        | has `_special`                             | 0     |
    /// | 2        | has `hash`                                 | 1     |
    /// | 3        | content text contains `muidaQ`             | 2     |
    /// | 4        | content value is integer-valued            | 3     |
    /// | -        | anything else                              | 4     |
    pub fn standard() -> Self {
        Self::new(4)
            .with_rule("special", 0, Box::new(|m: &Message| m.contains(SPECIAL_FIELD)))
            .with_rule("hash_key", 1, Box::new(|m: &Message| m.contains(HASH_KEY)))
            .with_rule("marker_text", 2, field_wise(contains_marker))
            .with_rule("integer_value", 3, field_wise(is_integer))
    }

    /// Append a rule below every rule already present (and above the fallback).
    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        queue: usize,
        predicate: MessagePredicate,
    ) -> Self {
        self.push(DispatchRule::new(name, queue, predicate));
        self
    }

    pub fn push(&mut self, rule: DispatchRule) {
        self.rules.push(rule);
    }

    /// Queue index for `message`.
    pub fn dispatch(&self, message: &Message) -> usize {
        self.rules
            .iter()
            .find(|rule| rule.matches(message))
            .map_or(self.fallback, |rule| rule.queue)
    }

    /// The first matching rule, or `None` when the fallback applies.
    pub fn matching_rule(&self, message: &Message) -> Option<&DispatchRule> {
        self.rules.iter().find(|rule| rule.matches(message))
    }

    pub fn rules(&self) -> &[DispatchRule] {
        &self.rules
    }

    pub fn fallback(&self) -> usize {
        self.fallback
    }

    /// Every queue index this chain can produce.
    pub fn queues(&self) -> impl Iterator<Item = usize> + '_ {
        self.rules
            .iter()
            .map(|r| r.queue)
            .chain(std::iter::once(self.fallback))
    }
}

/// Lift a value predicate to "any content (non-private) field matches".
pub fn field_wise<P>(predicate: P) -> MessagePredicate
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Box::new(move |message: &Message| message.content_fields().any(|(_, v)| predicate(v)))
}

fn contains_marker(value: &Value) -> bool {
    value.as_str().map_or(false, |s| s.contains(DISPATCH_MARKER))
}
