//! Client connection
//!
//! The entry point the demonstrators call. Owns the local store, the
//! applier task that writes remote changes into it, and the command
//! channels of any open shape subscriptions.
//!
//! Remote changes take this path:
//!
//! ```text
//! shape task --(row-change batches)--> applier task --> SQLite
//! ```
//!
//! The applier bumps a data-version channel after every write, which is
//! what live queries listen on. Local mutations bump the same channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::live::LiveMany;
use crate::models::Item;
use crate::store::ItemStore;
use crate::sync::message::RowChange;
use crate::sync::{self, ShapeCommand, ShapeHandle};

/// Store shared between the caller and the applier task
pub(crate) type SharedStore = Arc<Mutex<ItemStore>>;

/// An open client connection
pub struct Connection {
    store: SharedStore,
    changes: Arc<watch::Sender<u64>>,
    apply_tx: mpsc::Sender<Vec<RowChange>>,
    applier: JoinHandle<()>,
    shapes: Vec<mpsc::Sender<ShapeCommand>>,
    config: Config,
}

impl Connection {
    /// Open the local database and start the applier task
    pub async fn connect(config: Config) -> Result<Self> {
        let store = ItemStore::open(&config)
            .with_context(|| format!("Failed to open local database in {:?}", config.data_dir))?;
        let store: SharedStore = Arc::new(Mutex::new(store));

        let (changes_tx, _) = watch::channel(0u64);
        let changes = Arc::new(changes_tx);

        let (apply_tx, apply_rx) = mpsc::channel::<Vec<RowChange>>(64);
        let applier = tokio::spawn(applier_task(store.clone(), changes.clone(), apply_rx));

        info!("Connection open, database at {:?}", config.sqlite_path());

        Ok(Self {
            store,
            changes,
            apply_tx,
            applier,
            shapes: Vec::new(),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Query all local rows
    ///
    /// Returns whatever the local database currently holds, with no
    /// guarantee of sync completion.
    pub async fn find_many(&self) -> Result<Vec<Item>> {
        let store = self.store.lock().await;
        store.find_many().context("Failed to query items")
    }

    /// Count local rows
    pub async fn count(&self) -> Result<i64> {
        let store = self.store.lock().await;
        store.count().context("Failed to count items")
    }

    /// Insert one row with a fresh random value
    pub async fn create(&self) -> Result<Item> {
        let item = Item::new();
        {
            let store = self.store.lock().await;
            store.insert(&item).context("Failed to insert item")?;
        }
        self.changes.send_modify(|v| *v += 1);
        Ok(item)
    }

    /// Remove all rows, returning how many were deleted
    pub async fn delete_many(&self) -> Result<usize> {
        let deleted = {
            let store = self.store.lock().await;
            store.delete_many().context("Failed to delete items")?
        };
        self.changes.send_modify(|v| *v += 1);
        Ok(deleted)
    }

    /// Open a live query over the items table
    pub fn live_many(&self) -> LiveMany {
        LiveMany::new(self.store.clone(), self.changes.subscribe())
    }

    /// Subscribe to remote changes for the items table
    ///
    /// Resolves once the subscription is registered with the service.
    /// Await [`ShapeHandle::synced`] for the initial snapshot signal.
    pub async fn sync_items(&mut self) -> Result<ShapeHandle> {
        let url = self.config.service_url.clone().context(
            "Sync service not configured. Set service_url in the config file or REPRO_SERVICE.",
        )?;

        let handle = sync::subscribe(&url, "items", self.apply_tx.clone()).await?;
        self.shapes.push(handle.command_tx.clone());
        Ok(handle)
    }

    /// Close the connection
    ///
    /// Stops open shape subscriptions and the applier task, releasing the
    /// database handle.
    pub async fn close(self) -> Result<()> {
        let Self {
            apply_tx,
            applier,
            shapes,
            ..
        } = self;

        debug!("Closing connection");
        for shape in &shapes {
            let _ = shape.send(ShapeCommand::Shutdown).await;
        }
        drop(shapes);
        drop(apply_tx);

        // Applier ends once every change sender is gone
        if tokio::time::timeout(Duration::from_secs(2), applier)
            .await
            .is_err()
        {
            warn!("Applier task did not stop in time");
        }

        Ok(())
    }
}

/// Drain row-change batches from shape tasks into the store
async fn applier_task(
    store: SharedStore,
    changes: Arc<watch::Sender<u64>>,
    mut apply_rx: mpsc::Receiver<Vec<RowChange>>,
) {
    while let Some(batch) = apply_rx.recv().await {
        let applied = {
            let mut store = store.lock().await;
            store.apply(&batch)
        };
        match applied {
            Ok(n) => {
                debug!("Applied {} remote change(s)", n);
                changes.send_modify(|v| *v += 1);
            }
            Err(e) => warn!("Failed to apply remote changes: {}", e),
        }
    }
    debug!("Applier stopped");
}
