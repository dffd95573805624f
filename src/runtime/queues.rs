//! Fixed set of unbounded FIFO output queues.

use std::collections::VecDeque;

use crate::error::RouterError;

/// Number of output queues.
pub const NUM_QUEUES: usize = 5;

/// Output queues of encoded messages, indexed `0..NUM_QUEUES`.
#[derive(Debug, Clone)]
pub struct QueueSet {
    queues: Vec<VecDeque<String>>,
}

impl QueueSet {
    pub fn new() -> Self {
        Self {
            queues: (0..NUM_QUEUES).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Append to the back of queue `index`.
    pub fn push(&mut self, index: usize, message: String) -> Result<(), RouterError> {
        self.queue_mut(index)?.push_back(message);
        Ok(())
    }

    /// Remove the oldest message on queue `index`.
    ///
    /// # Errors
    /// [`RouterError::EmptyQueue`] when nothing is pending.
    pub fn pop(&mut self, index: usize) -> Result<String, RouterError> {
        self.queue_mut(index)?
            .pop_front()
            .ok_or(RouterError::EmptyQueue(index))
    }

    /// Pending message count on queue `index`.
    pub fn len(&self, index: usize) -> Result<usize, RouterError> {
        self.queues
            .get(index)
            .map(VecDeque::len)
            .ok_or_else(|| invalid(index))
    }

    pub fn total_pending(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_pending() == 0
    }

    pub fn count(&self) -> usize {
        self.queues.len()
    }

    fn queue_mut(&mut self, index: usize) -> Result<&mut VecDeque<String>, RouterError> {
        self.queues.get_mut(index).ok_or_else(|| invalid(index))
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(index: usize) -> RouterError {
    RouterError::InvalidQueue {
        index,
        count: NUM_QUEUES,
    }
}
