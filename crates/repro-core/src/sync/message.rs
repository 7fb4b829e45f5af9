//! Shape subscription protocol message types
//!
//! Messages exchanged with the sync service using CBOR encoding.
//!
//! The service streams a subscribed table's rows as batches of row
//! changes, followed by an up-to-date control message once the initial
//! snapshot has been delivered. Further changes stream in the same form
//! for as long as the subscription is open.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Item;

/// Sender ID for identifying this client
pub type SenderId = String;

/// A single row change streamed by the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RowChange {
    /// Insert or replace a row
    #[serde(rename = "upsert")]
    Upsert { row: Item },

    /// Remove a row
    #[serde(rename = "delete")]
    Delete { id: Uuid },
}

/// Messages sent to the sync service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Subscribe to a table's shape
    #[serde(rename = "subscribe")]
    Subscribe {
        #[serde(rename = "senderId")]
        sender_id: SenderId,
        table: String,
    },
}

/// Messages received from the sync service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The shape subscription has been registered
    #[serde(rename = "subscriptionEstablished")]
    SubscriptionEstablished { table: String },

    /// A batch of row changes for the subscribed table
    #[serde(rename = "changes")]
    Changes {
        table: String,
        changes: Vec<RowChange>,
    },

    /// The initial snapshot has been delivered
    #[serde(rename = "upToDate")]
    UpToDate { table: String },

    /// Error from the service
    #[serde(rename = "error")]
    Error { message: String },
}

impl ClientMessage {
    /// Create a subscribe message
    pub fn subscribe(sender_id: &str, table: &str) -> Self {
        ClientMessage::Subscribe {
            sender_id: sender_id.to_string(),
            table: table.to_string(),
        }
    }

    /// Encode message to CBOR bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).expect("CBOR encoding failed");
        bytes
    }

    /// Decode message from CBOR bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(bytes)
    }
}

impl ServerMessage {
    /// Encode message to CBOR bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).expect("CBOR encoding failed");
        bytes
    }

    /// Decode message from CBOR bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_message_round_trip() {
        let msg = ClientMessage::subscribe("repro-abc123", "items");
        let bytes = msg.encode();
        assert!(!bytes.is_empty());

        match ClientMessage::decode(&bytes).unwrap() {
            ClientMessage::Subscribe { sender_id, table } => {
                assert_eq!(sender_id, "repro-abc123");
                assert_eq!(table, "items");
            }
        }
    }

    #[test]
    fn test_changes_message_round_trip() {
        let item = Item::new();
        let msg = ServerMessage::Changes {
            table: "items".to_string(),
            changes: vec![
                RowChange::Upsert { row: item.clone() },
                RowChange::Delete { id: Uuid::new_v4() },
            ],
        };

        let decoded = ServerMessage::decode(&msg.encode()).unwrap();
        match decoded {
            ServerMessage::Changes { table, changes } => {
                assert_eq!(table, "items");
                assert_eq!(changes.len(), 2);
                assert_eq!(changes[0], RowChange::Upsert { row: item });
            }
            _ => panic!("Expected Changes message"),
        }
    }

    #[test]
    fn test_up_to_date_decoding() {
        let msg = ServerMessage::UpToDate {
            table: "items".to_string(),
        };
        let decoded = ServerMessage::decode(&msg.encode()).unwrap();
        assert!(matches!(decoded, ServerMessage::UpToDate { table } if table == "items"));
    }
}
