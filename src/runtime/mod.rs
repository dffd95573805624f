//! Routing runtime: the building blocks the [`Router`](crate::Router) drives.
//!
//! Each stage is usable on its own; the router wires them together and owns
//! the mutable queue and sequence state.

pub mod dispatch;
pub mod hashing;
pub mod queues;
pub mod sequence;
pub mod transforms;

// Re-export key types
pub use dispatch::{field_wise, DispatchChain, DispatchRule, MessagePredicate};
pub use hashing::{augment_hash, encode_digest, DigestAlgorithm};
pub use queues::{QueueSet, NUM_QUEUES};
pub use sequence::{SequenceBuffer, SequenceState};
pub use transforms::{TransformChain, ValueTransform};
