//! Message router.
//!
//! Per inbound message: decode, run the transform chain over every field,
//! apply hash augmentation, pick a queue with the dispatch chain, encode,
//! then either append to that queue or hand the message to the sequence
//! buffer. Queue and sequence state sit behind one lock so each message is
//! applied atomically with respect to every other `enqueue` and `next`.

use parking_lot::Mutex;

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::message::Message;
use crate::runtime::dispatch::DispatchChain;
use crate::runtime::hashing::augment_hash;
use crate::runtime::queues::{QueueSet, NUM_QUEUES};
use crate::runtime::sequence::SequenceBuffer;
use crate::runtime::transforms::TransformChain;

/// Where an enqueued message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Appended straight to `queue`.
    Direct { queue: usize },
    /// Buffered as part of a sequence. `released` counts the messages this
    /// call moved onto `queue` (zero while a gap is open).
    Sequenced {
        sequence: String,
        part: u64,
        queue: usize,
        released: usize,
    },
}

impl Delivery {
    pub fn queue(&self) -> usize {
        match self {
            Delivery::Direct { queue } | Delivery::Sequenced { queue, .. } => *queue,
        }
    }
}

#[derive(Debug, Default)]
struct RouterState {
    queues: QueueSet,
    sequences: SequenceBuffer,
}

/// Transform, dispatch and sequence-reassembly engine over five queues.
#[derive(Debug)]
pub struct Router {
    config: RouterConfig,
    transforms: TransformChain,
    dispatch: DispatchChain,
    state: Mutex<RouterState>,
}

impl Router {
    /// Router with the standard transform and dispatch chains.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            transforms: TransformChain::standard(),
            dispatch: DispatchChain::standard(),
            state: Mutex::new(RouterState::default()),
        }
    }

    /// Router with custom chains.
    ///
    /// # Errors
    /// [`RouterError::InvalidQueue`] if any rule (or the fallback) targets a
    /// queue outside `0..NUM_QUEUES`.
    pub fn with_rules(
        config: RouterConfig,
        transforms: TransformChain,
        dispatch: DispatchChain,
    ) -> Result<Self, RouterError> {
        if let Some(index) = dispatch.queues().find(|q| *q >= NUM_QUEUES) {
            return Err(RouterError::InvalidQueue {
                index,
                count: NUM_QUEUES,
            });
        }
        Ok(Self {
            config,
            transforms,
            dispatch,
            state: Mutex::new(RouterState::default()),
        })
    }

    /// Route one raw message.
    ///
    /// Every fallible step runs before the queues are touched, so an error
    /// leaves no trace of the message.
    ///
    /// # Errors
    /// - [`RouterError::Decode`] if `raw` is not a JSON object
    /// - [`RouterError::HashTarget`] / [`RouterError::DigestUnavailable`] if
    ///   hash augmentation cannot run
    pub fn enqueue(&self, raw: &str) -> Result<Delivery, RouterError> {
        let mut message = Message::decode(raw)?;

        // Read before the transform chain complements `_part`.
        let sequence_key = message.sequence_key();

        self.transforms.apply_to_message(&mut message);
        if let Err(err) = augment_hash(&mut message, &self.config.digest_algorithm) {
            tracing::warn!(error = %err, "hash augmentation failed; message dropped");
            return Err(err);
        }

        let queue = self.dispatch.dispatch(&message);
        let encoded = message.encode()?;

        let mut state = self.state.lock();
        let delivery = match sequence_key {
            Some((sequence, part)) => {
                let RouterState { queues, sequences } = &mut *state;
                sequences.add_part(&sequence, part, encoded, queue);
                let released = sequences.drain(&sequence, queues)?;
                let queue = sequences.destination(&sequence).unwrap_or(queue);
                Delivery::Sequenced {
                    sequence,
                    part,
                    queue,
                    released,
                }
            }
            None => {
                state.queues.push(queue, encoded)?;
                Delivery::Direct { queue }
            }
        };
        drop(state);

        tracing::debug!(?delivery, "routed message");
        Ok(delivery)
    }

    /// Pop the oldest message on `queue`. Never blocks.
    ///
    /// # Errors
    /// - [`RouterError::EmptyQueue`] if nothing is pending
    /// - [`RouterError::InvalidQueue`] if `queue >= NUM_QUEUES`
    pub fn next(&self, queue: usize) -> Result<String, RouterError> {
        self.state.lock().queues.pop(queue)
    }

    /// Messages waiting on `queue`.
    pub fn pending(&self, queue: usize) -> Result<usize, RouterError> {
        self.state.lock().queues.len(queue)
    }

    /// Messages waiting across all queues.
    pub fn total_pending(&self) -> usize {
        self.state.lock().queues.total_pending()
    }

    /// Parts of `sequence` held back waiting for a gap to close.
    pub fn buffered_parts(&self, sequence: &str) -> usize {
        self.state.lock().sequences.pending_parts(sequence)
    }

    /// Number of sequence ids seen so far.
    pub fn sequence_count(&self) -> usize {
        self.state.lock().sequences.len()
    }

    /// Pop every pending message, queue by queue in index order.
    pub fn drain_all(&self) -> Vec<(usize, String)> {
        let mut state = self.state.lock();
        let mut drained = Vec::with_capacity(state.queues.total_pending());
        for index in 0..NUM_QUEUES {
            while let Ok(message) = state.queues.pop(index) {
                drained.push((index, message));
            }
        }
        drained
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.transforms
    }

    pub fn dispatch_chain(&self) -> &DispatchChain {
        &self.dispatch
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}
