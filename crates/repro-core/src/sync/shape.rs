//! Shape subscription task
//!
//! WebSocket-based subscription to one table's remote rows. The task owns
//! the connection; row-change batches are forwarded to the connection's
//! applier channel, and the synced signal flips when the service reports
//! the initial snapshot has been delivered.
//!
//! Note the ordering here: the signal reflects receipt of the up-to-date
//! control message, not application of the rows to the local database.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::message::{ClientMessage, RowChange, ServerMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands sent to the shape task
#[derive(Debug, Clone)]
pub enum ShapeCommand {
    /// Close the subscription and stop the task
    Shutdown,
}

/// Handle to an established shape subscription
///
/// Returned once the service has registered the subscription. The synced
/// signal resolves separately, when the initial snapshot has been
/// delivered.
#[derive(Debug)]
pub struct ShapeHandle {
    synced_rx: watch::Receiver<bool>,
    pub(crate) command_tx: mpsc::Sender<ShapeCommand>,
}

impl ShapeHandle {
    /// Wait until the service asserts the initial snapshot was delivered
    pub async fn synced(&mut self) -> Result<()> {
        loop {
            if *self.synced_rx.borrow() {
                return Ok(());
            }
            self.synced_rx
                .changed()
                .await
                .context("Shape task stopped before the initial snapshot was delivered")?;
        }
    }

    /// Whether the synced signal has already fired
    pub fn is_synced(&self) -> bool {
        *self.synced_rx.borrow()
    }
}

/// Subscribe to a table's shape
///
/// Resolves once the subscription is registered with the service, not once
/// data has arrived. Row-change batches are forwarded to `apply_tx`.
pub(crate) async fn subscribe(
    url: &str,
    table: &str,
    apply_tx: mpsc::Sender<Vec<RowChange>>,
) -> Result<ShapeHandle> {
    info!("Subscribing to shape '{}' at {}", table, url);

    let (ws_stream, _response) = connect_async(url)
        .await
        .context("Failed to connect to sync service")?;
    let (mut write, mut read) = ws_stream.split();

    // Announce ourselves and request the shape
    let sender_id = format!("repro-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let subscribe_msg = ClientMessage::subscribe(&sender_id, table);
    write.send(Message::Binary(subscribe_msg.encode())).await?;

    wait_for_established(&mut read, url).await?;
    debug!("Shape subscription established for '{}'", table);

    let (synced_tx, synced_rx) = watch::channel(false);
    let (command_tx, command_rx) = mpsc::channel(16);

    tokio::spawn(shape_task(
        table.to_string(),
        write,
        read,
        apply_tx,
        synced_tx,
        command_rx,
    ));

    Ok(ShapeHandle {
        synced_rx,
        command_tx,
    })
}

/// Wait for the subscription-established response
async fn wait_for_established(read: &mut SplitStream<WsStream>, url: &str) -> Result<()> {
    let timeout = Duration::from_secs(10);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            anyhow::bail!(
                "Timeout waiting for sync service response ({}). Check service is running.",
                url
            );
        }

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ServerMessage::decode(&data) {
                            Ok(ServerMessage::SubscriptionEstablished { .. }) => {
                                return Ok(());
                            }
                            Ok(ServerMessage::Error { message }) => {
                                anyhow::bail!("Service error: {}", message);
                            }
                            Ok(_) => {
                                // Ignore other messages during handshake
                            }
                            Err(e) => {
                                warn!("Failed to decode message: {:?}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        anyhow::bail!("Sync service ({}) closed connection during handshake", url);
                    }
                    Some(Err(e)) => {
                        anyhow::bail!("Sync connection error ({}): {}", url, e);
                    }
                    None => {
                        anyhow::bail!("Sync service ({}) closed connection", url);
                    }
                    _ => {}
                }
            }
            _ = tokio::time::sleep(remaining) => {
                anyhow::bail!(
                    "Timeout waiting for sync service response ({}). Check service is running.",
                    url
                );
            }
        }
    }
}

/// Run the subscription until shutdown or disconnection
async fn shape_task(
    table: String,
    mut write: SplitSink<WsStream, Message>,
    mut read: SplitStream<WsStream>,
    apply_tx: mpsc::Sender<Vec<RowChange>>,
    synced_tx: watch::Sender<bool>,
    mut command_rx: mpsc::Receiver<ShapeCommand>,
) {
    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(ShapeCommand::Shutdown) | None => {
                        debug!("Shutting down shape '{}'", table);
                        write.close().await.ok();
                        break;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ServerMessage::decode(&data) {
                            Ok(ServerMessage::Changes { changes, .. }) => {
                                debug!("Received {} change(s) for '{}'", changes.len(), table);
                                if apply_tx.send(changes).await.is_err() {
                                    // Applier is gone, connection is closing
                                    break;
                                }
                            }
                            Ok(ServerMessage::UpToDate { .. }) => {
                                debug!("Shape data synced for '{}'", table);
                                let _ = synced_tx.send(true);
                            }
                            Ok(ServerMessage::Error { message }) => {
                                warn!("Service error on shape '{}': {}", table, message);
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to decode message: {:?}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Sync service closed shape '{}'", table);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Shape '{}' connection error: {}", table, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synced_resolves_after_signal() {
        let (synced_tx, synced_rx) = watch::channel(false);
        let (command_tx, _command_rx) = mpsc::channel(16);
        let mut handle = ShapeHandle {
            synced_rx,
            command_tx,
        };

        assert!(!handle.is_synced());

        synced_tx.send(true).unwrap();
        handle.synced().await.unwrap();
        assert!(handle.is_synced());

        // Already-synced handles resolve immediately
        handle.synced().await.unwrap();
    }

    #[tokio::test]
    async fn test_synced_errors_when_task_stops() {
        let (synced_tx, synced_rx) = watch::channel(false);
        let (command_tx, _command_rx) = mpsc::channel(16);
        let mut handle = ShapeHandle {
            synced_rx,
            command_tx,
        };

        // Task dying without ever signalling surfaces as an error
        drop(synced_tx);
        assert!(handle.synced().await.is_err());
    }
}
