//! # q: transform-and-dispatch message queues
//!
//! `q` accepts JSON messages, rewrites their field values through an ordered
//! transform chain, routes each message to one of five FIFO queues with a
//! first-match dispatch chain, and reassembles multi-part sequences so their
//! parts are delivered in order.
//!
//! ## Routing rules
//!
//! Transforms (applied to every top-level value, in order):
//!
//! 1. text containing `Qadium` is reversed
//! 2. integer-valued numbers are bitwise complemented (`n -> -n - 1`)
//!
//! then `_hash` augmentation replaces `_hash` with the base64 SHA-256 of the
//! field it names. Dispatch (first match wins):
//!
//! | condition                                   | queue |
//! |---------------------------------------------|-------|
//! | has `_special`                              | 0     |
//! | has `hash`                                  | 1     |
//! | a content field's text contains `muidaQ`    | 2     |
//! | a content field is integer-valued           | 3     |
//! | otherwise                                   | 4     |
//!
//! Messages with a text `_sequence` and a non-negative integer `_part` are
//! held until every earlier part of the same sequence has been delivered.
//!
//! ## Example
//!
//! ```
//! use q::Router;
//!
//! let router = Router::default();
//! router.enqueue(r#"{"company": "Qadium, Inc."}"#).unwrap();
//! assert_eq!(router.next(2).unwrap(), r#"{"company":".cnI ,muidaQ"}"#);
//! assert!(router.next(2).unwrap_err().is_empty_queue());
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod message;
pub mod router;
pub mod serialization;

// Transform, dispatch and sequencing stages
pub mod runtime;

// Re-export key types
pub use config::{AppConfig, LoggingConfig, RouterConfig};
pub use error::{ConfigError, RouterError};
pub use message::Message;
pub use router::{Delivery, Router};
pub use runtime::{DispatchChain, SequenceBuffer, TransformChain, NUM_QUEUES};
pub use serialization::{OutputFormat, QueueRecord, SerializationError};
