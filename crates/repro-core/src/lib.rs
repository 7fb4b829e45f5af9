//! Reproduction client for a shape-sync data-visibility anomaly
//!
//! A local-first sync client: rows for the `items` table stream from a
//! remote service into an embedded SQLite database, and queries are served
//! from that local database. The client exposes the call sites the
//! reproduction exercises:
//!
//! ```text
//! let mut conn = Connection::connect(config).await?;
//!
//! let items = conn.find_many().await?;        // local query, may be unsynced
//! let mut shape = conn.sync_items().await?;   // subscription registered
//! shape.synced().await?;                      // initial snapshot delivered
//! let items = conn.find_many().await?;        // observed stale (the bug)
//! ```
//!
//! The synced signal fires when the service's up-to-date control message
//! arrives on the shape task; rows are applied to SQLite by a separate
//! applier task. That gap is the subject of the reproduction.
//!
//! # Modules
//!
//! - `connection`: client entry point and per-table operations
//! - `config`: application configuration
//! - `models`: the `Item` record
//! - `store`: SQLite local store
//! - `sync`: shape subscription and wire protocol
//! - `live`: live query over a change-notification channel

pub mod config;
pub mod connection;
pub mod live;
pub mod models;
pub mod store;
pub mod sync;

pub use config::Config;
pub use connection::Connection;
pub use live::LiveMany;
pub use models::Item;
pub use store::{ItemStore, StoreError};
pub use sync::ShapeHandle;
