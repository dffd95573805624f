//! Sequence reassembly buffer.
//!
//! Multi-part messages share a `_sequence` id and carry a `_part` number.
//! Parts are held until they form an unbroken run starting at the next
//! expected part, then released to the sequence's queue in ascending order.
//! The queue is fixed by whichever part of a sequence arrives first.

use std::collections::HashMap;

use crate::error::RouterError;
use crate::runtime::queues::QueueSet;

/// Reassembly state for one sequence id.
#[derive(Debug, Clone)]
pub struct SequenceState {
    queue: usize,
    /// Highest part released so far; `None` until part 0 goes out.
    last_released: Option<u64>,
    unsent: HashMap<u64, String>,
}

impl SequenceState {
    fn new(queue: usize) -> Self {
        Self {
            queue,
            last_released: None,
            unsent: HashMap::new(),
        }
    }

    /// Destination queue for every part of this sequence.
    pub fn queue(&self) -> usize {
        self.queue
    }

    pub fn last_released(&self) -> Option<u64> {
        self.last_released
    }

    /// Part number that must arrive before anything else is released.
    pub fn next_expected(&self) -> u64 {
        self.last_released.map_or(0, |p| p.saturating_add(1))
    }

    /// Parts held back waiting for a gap to close.
    pub fn pending_parts(&self) -> usize {
        self.unsent.len()
    }

    /// Store a part, replacing any earlier message with the same number.
    fn add(&mut self, part: u64, message: String) {
        self.unsent.insert(part, message);
    }

    /// Take the next expected part, if it has arrived.
    fn take_next(&mut self) -> Option<String> {
        // u64::MAX has no successor to wait for
        if self.last_released == Some(u64::MAX) {
            return None;
        }
        let next = self.next_expected();
        let message = self.unsent.remove(&next)?;
        self.last_released = Some(next);
        Some(message)
    }
}

/// Reassembly state for every sequence id seen so far.
///
/// Drained sequences are kept: a sequence id never resets, so a late
/// duplicate of an already-released part is never delivered again.
#[derive(Debug, Clone, Default)]
pub struct SequenceBuffer {
    sequences: HashMap<String, SequenceState>,
}

impl SequenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one part.
    ///
    /// The first part seen for `sequence` fixes its destination to
    /// `candidate_queue`; later parts keep that destination regardless of
    /// their own candidate.
    pub fn add_part(&mut self, sequence: &str, part: u64, message: String, candidate_queue: usize) {
        let state = self
            .sequences
            .entry(sequence.to_string())
            .or_insert_with(|| {
                tracing::trace!(sequence, queue = candidate_queue, "new sequence");
                SequenceState::new(candidate_queue)
            });
        state.add(part, message);
    }

    /// Release every contiguous part of `sequence` onto its queue.
    ///
    /// Returns the number of messages released. Stops at the first gap.
    pub fn drain(&mut self, sequence: &str, queues: &mut QueueSet) -> Result<usize, RouterError> {
        let state = match self.sequences.get_mut(sequence) {
            Some(state) => state,
            None => return Ok(0),
        };

        let mut released = 0;
        while let Some(message) = state.take_next() {
            queues.push(state.queue, message)?;
            released += 1;
        }

        if released > 0 {
            tracing::trace!(
                sequence,
                released,
                last_released = ?state.last_released,
                pending = state.pending_parts(),
                "released sequence parts"
            );
        }
        Ok(released)
    }

    pub fn get(&self, sequence: &str) -> Option<&SequenceState> {
        self.sequences.get(sequence)
    }

    /// Destination queue fixed for `sequence`, if it has been seen.
    pub fn destination(&self, sequence: &str) -> Option<usize> {
        self.get(sequence).map(SequenceState::queue)
    }

    pub fn pending_parts(&self, sequence: &str) -> usize {
        self.get(sequence).map_or(0, SequenceState::pending_parts)
    }

    /// Number of sequence ids tracked.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_all(queues: &mut QueueSet, index: usize) -> Vec<String> {
        std::iter::from_fn(|| queues.pop(index).ok()).collect()
    }

    #[test]
    fn test_out_of_order_parts_release_in_order() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        buffer.add_part("s", 1, "p1".to_string(), 2);
        assert_eq!(buffer.drain("s", &mut queues).unwrap(), 0);
        assert!(queues.is_empty());

        buffer.add_part("s", 0, "p0".to_string(), 4);
        assert_eq!(buffer.drain("s", &mut queues).unwrap(), 2);

        // first arrival (part 1) fixed queue 2
        assert_eq!(drain_all(&mut queues, 2), vec!["p0", "p1"]);
        assert!(queues.is_empty());
    }

    #[test]
    fn test_waits_for_part_zero() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        for part in [3, 2, 1] {
            buffer.add_part("s", part, format!("p{}", part), 0);
            assert_eq!(buffer.drain("s", &mut queues).unwrap(), 0);
        }
        assert_eq!(buffer.pending_parts("s"), 3);

        buffer.add_part("s", 0, "p0".to_string(), 0);
        assert_eq!(buffer.drain("s", &mut queues).unwrap(), 4);
        assert_eq!(drain_all(&mut queues, 0), vec!["p0", "p1", "p2", "p3"]);
        assert_eq!(buffer.get("s").unwrap().last_released(), Some(3));
    }

    #[test]
    fn test_stops_at_gap() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        buffer.add_part("s", 0, "p0".to_string(), 1);
        buffer.add_part("s", 2, "p2".to_string(), 1);
        assert_eq!(buffer.drain("s", &mut queues).unwrap(), 1);
        assert_eq!(buffer.get("s").unwrap().next_expected(), 1);
        assert_eq!(buffer.pending_parts("s"), 1);

        buffer.add_part("s", 1, "p1".to_string(), 1);
        assert_eq!(buffer.drain("s", &mut queues).unwrap(), 2);
        assert_eq!(drain_all(&mut queues, 1), vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_duplicate_unreleased_part_last_write_wins() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        buffer.add_part("s", 1, "first".to_string(), 3);
        buffer.add_part("s", 1, "second".to_string(), 3);
        buffer.add_part("s", 0, "p0".to_string(), 3);
        buffer.drain("s", &mut queues).unwrap();

        assert_eq!(drain_all(&mut queues, 3), vec!["p0", "second"]);
    }

    #[test]
    fn test_duplicate_released_part_is_never_resent() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        buffer.add_part("s", 0, "p0".to_string(), 0);
        buffer.drain("s", &mut queues).unwrap();
        buffer.add_part("s", 0, "p0-again".to_string(), 0);
        assert_eq!(buffer.drain("s", &mut queues).unwrap(), 0);

        assert_eq!(drain_all(&mut queues, 0), vec!["p0"]);
    }

    #[test]
    fn test_sequences_are_independent() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        buffer.add_part("a", 1, "a1".to_string(), 0);
        buffer.add_part("b", 0, "b0".to_string(), 1);
        assert_eq!(buffer.drain("a", &mut queues).unwrap(), 0);
        assert_eq!(buffer.drain("b", &mut queues).unwrap(), 1);

        assert_eq!(buffer.destination("a"), Some(0));
        assert_eq!(buffer.destination("b"), Some(1));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_drained_sequence_is_retained() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();

        buffer.add_part("s", 0, "p0".to_string(), 4);
        buffer.drain("s", &mut queues).unwrap();

        assert_eq!(buffer.pending_parts("s"), 0);
        assert_eq!(buffer.destination("s"), Some(4));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_drain_unknown_sequence() {
        let mut buffer = SequenceBuffer::new();
        let mut queues = QueueSet::new();
        assert_eq!(buffer.drain("missing", &mut queues).unwrap(), 0);
        assert!(buffer.is_empty());
    }
}
