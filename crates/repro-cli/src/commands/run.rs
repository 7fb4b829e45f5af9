//! The process demonstrator
//!
//! A flat sequence of calls against the client, matching the steps in the
//! bug report: query the unsynced table, subscribe, await the synced
//! signal, query immediately (observed stale), query again after a short
//! fixed delay (observed correct).

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use repro_core::{Config, Connection, Item};

use crate::output::Output;

/// How long to wait before retrying the query after the synced signal
pub const VISIBILITY_DELAY_MS: u64 = 15;

/// Run the diagnostic sequence, closing the connection on exit or ctrl-c
pub async fn run(config: Config, output: &Output) -> Result<()> {
    let mut conn = Connection::connect(config).await?;

    tokio::select! {
        res = diagnostic_sequence(&mut conn, output) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    info!("Closing connection");
    conn.close().await?;
    Ok(())
}

async fn diagnostic_sequence(conn: &mut Connection, output: &Output) -> Result<()> {
    // Purposely querying an unsynced table
    let items = conn.find_many().await?;
    debug!("Local items: {:?}", values(&items));
    output.message(&format!("Before sync: {} item(s)", items.len()));

    // Resolves when the shape subscription has been established
    let mut shape = conn.sync_items().await?;
    debug!("Shape subscription established");

    // Resolves when the data has been synced into the local database
    shape.synced().await?;
    debug!("Shape data synced");

    // Now the data should've been synced into the local database
    let synced_items = conn.find_many().await?;
    debug!("Synced items: {:?}", values(&synced_items));
    output.message(&format!(
        "Immediately after synced: {} item(s)",
        synced_items.len()
    ));

    // However, if we wait an arbitrary amount of time...
    tokio::time::sleep(Duration::from_millis(VISIBILITY_DELAY_MS)).await;

    let delayed_items = conn.find_many().await?;
    debug!(
        "Synced items (after {} ms timeout): {:?}",
        VISIBILITY_DELAY_MS,
        values(&delayed_items)
    );
    output.message(&format!(
        "After {} ms: {} item(s)",
        VISIBILITY_DELAY_MS,
        delayed_items.len()
    ));

    Ok(())
}

fn values(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.value.as_str()).collect()
}
