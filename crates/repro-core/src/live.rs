//! Live queries
//!
//! A live query re-runs its local query whenever the data version bumps,
//! which happens after local mutations and after the applier writes remote
//! changes. Consumers await [`LiveMany::next`] in their event loop and
//! redraw with the fresh result set.

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::connection::SharedStore;
use crate::models::Item;

/// Live query over the items table
pub struct LiveMany {
    store: SharedStore,
    changes: watch::Receiver<u64>,
}

impl LiveMany {
    pub(crate) fn new(store: SharedStore, changes: watch::Receiver<u64>) -> Self {
        Self { store, changes }
    }

    /// Run the query against the current local state
    pub async fn current(&self) -> Result<Vec<Item>> {
        let store = self.store.lock().await;
        store.find_many().context("Failed to query items")
    }

    /// Wait for the next data change and return the fresh result set
    ///
    /// Changes are coalesced: a burst of writes may surface as a single
    /// wakeup carrying the latest state.
    pub async fn next(&mut self) -> Result<Vec<Item>> {
        self.changes
            .changed()
            .await
            .context("Connection closed")?;
        self.current().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ItemStore;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_next_yields_after_change() {
        let store: SharedStore = Arc::new(Mutex::new(ItemStore::open_in_memory().unwrap()));
        let (tx, rx) = watch::channel(0u64);
        let mut live = LiveMany::new(store.clone(), rx);

        assert!(live.current().await.unwrap().is_empty());

        let item = Item::new();
        store.lock().await.insert(&item).unwrap();
        tx.send_modify(|v| *v += 1);

        let items = tokio::time::timeout(Duration::from_secs(1), live.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(items, vec![item]);
    }

    #[tokio::test]
    async fn test_next_errors_when_sender_dropped() {
        let store: SharedStore = Arc::new(Mutex::new(ItemStore::open_in_memory().unwrap()));
        let (tx, rx) = watch::channel(0u64);
        let mut live = LiveMany::new(store, rx);

        drop(tx);
        assert!(live.next().await.is_err());
    }
}
