use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{Error, Result};
use crate::player::Player;

pub type SharedPlayer = Arc<Mutex<Player>>;

/// Online players keyed by name.
///
/// Bytes addressed to a player who has not logged in yet are held back and
/// handed over, in order, at registration. Callers that need the player
/// itself can `wait_for` it instead of polling.
#[derive(Default)]
pub struct PlayerRegistry {
    players: DashMap<String, SharedPlayer>,
    pending: Mutex<HashMap<String, Vec<u8>>>,
    registered: Notify,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, player: Player) -> SharedPlayer {
        let name = player.name.clone();
        let shared = Arc::new(Mutex::new(player));

        {
            let mut pending = self.lock_pending();
            self.players.insert(name.clone(), shared.clone());
            if let Some(bytes) = pending.remove(&name) {
                debug!("Delivering {} buffered bytes to {}", bytes.len(), name);
                lock_player(&shared).enqueue(&bytes);
            }
        }

        self.registered.notify_waiters();
        shared
    }

    pub fn remove(&self, name: &str) -> Option<SharedPlayer> {
        self.players.remove(name).map(|(_, p)| p)
    }

    pub fn get(&self, name: &str) -> Option<SharedPlayer> {
        self.players.get(name).map(|p| p.value().clone())
    }

    /// Append packets to a player's queue, buffering them until the player
    /// registers if necessary.
    pub fn enqueue(&self, name: &str, bytes: &[u8]) {
        let mut pending = self.lock_pending();
        match self.players.get(name) {
            Some(player) => lock_player(player.value()).enqueue(bytes),
            None => pending
                .entry(name.to_string())
                .or_default()
                .extend_from_slice(bytes),
        }
    }

    pub fn pending_len(&self, name: &str) -> usize {
        self.lock_pending().get(name).map_or(0, Vec::len)
    }

    /// Resolve once `name` is registered, or fail with `Error::Cancelled`
    /// after `timeout`.
    pub async fn wait_for(&self, name: &str, timeout: Duration) -> Result<SharedPlayer> {
        let wait = async {
            loop {
                let notified = self.registered.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if let Some(player) = self.get(name) {
                    return player;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| Error::Cancelled)
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn lock_player(player: &SharedPlayer) -> MutexGuard<'_, Player> {
    player.lock().unwrap_or_else(|e| e.into_inner())
}
