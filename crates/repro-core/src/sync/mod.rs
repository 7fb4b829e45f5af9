//! Shape subscription client
//!
//! Provides WebSocket-based subscriptions to a remote sync service.
//!
//! ## Protocol
//!
//! 1. Connect via WebSocket
//! 2. Send a subscribe message naming the table
//! 3. Service confirms the subscription, then streams row-change batches
//! 4. Service sends up-to-date once the initial snapshot has been delivered
//!
//! Messages are CBOR-encoded; see [`message`].

pub mod message;
mod shape;

pub use shape::{ShapeCommand, ShapeHandle};

pub(crate) use shape::subscribe;
