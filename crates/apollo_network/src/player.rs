//! Connected player table

use apollo_options::PlayerId;
use apollo_wire::WireFormat;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One live connection: identity, negotiated wire format, and the outbound
/// byte channel its writer task drains.
#[derive(Debug)]
pub struct PlayerConnection {
    pub id: PlayerId,
    pub name: String,
    pub format: WireFormat,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl PlayerConnection {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        format: WireFormat,
        tx: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            format,
            tx,
        }
    }

    /// Queue one payload. Enqueue-and-return: a closed channel means the
    /// writer task is gone and the disconnect path will reap this entry,
    /// so failures are logged rather than surfaced.
    pub fn send(&self, payload: Vec<u8>) {
        if self.tx.send(payload).is_err() {
            warn!(player = %self.id, "dropping payload for closed connection");
        }
    }
}

/// All currently connected players, keyed by identity.
#[derive(Debug, Default)]
pub struct PlayerTable {
    players: DashMap<PlayerId, Arc<PlayerConnection>>,
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, connection: PlayerConnection) -> Arc<PlayerConnection> {
        let connection = Arc::new(connection);
        debug!(player = %connection.id, name = %connection.name, "player connected");
        self.players.insert(connection.id, connection.clone());
        connection
    }

    pub fn disconnect(&self, id: PlayerId) -> Option<Arc<PlayerConnection>> {
        let removed = self.players.remove(&id).map(|(_, connection)| connection);
        if removed.is_some() {
            debug!(player = %id, "player disconnected");
        }
        removed
    }

    pub fn get(&self, id: PlayerId) -> Option<Arc<PlayerConnection>> {
        self.players.get(&id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Snapshot of every live connection.
    pub fn connections(&self) -> Vec<Arc<PlayerConnection>> {
        self.players.iter().map(|entry| entry.clone()).collect()
    }
}
