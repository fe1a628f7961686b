use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use chomp_models::session::Session;
use chomp_models::user::TelegramId;

/// Keyed store for per-chat transient state. Every piece of state the bot
/// keeps between updates lives here — never in module-level variables — so
/// concurrent chats cannot observe each other's data. Sessions die with the
/// process; the backend remains the system of record.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<TelegramId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat: TelegramId) -> Option<Session> {
        self.inner.read().await.get(&chat).cloned()
    }

    /// Read-modify-write under the store lock; the session is created on
    /// first use. Keeping this the only mutation path serializes updates
    /// for a chat even if the transport does not.
    pub async fn update<F>(&self, chat: TelegramId, mutate: F)
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.inner.write().await;
        mutate(sessions.entry(chat).or_default());
    }
}
