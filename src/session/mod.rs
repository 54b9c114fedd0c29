//! Tab-scoped visitor session id.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::storage::KeyValueStore;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const SESSION_ID_KEY: &str = "analytics_session_id";

/// Mints the session id once per tab and hands back the same value afterwards.
///
/// Backed by the tab-scoped store so reloads keep the id. When the store
/// refuses reads or writes the id lives in memory for this instance only.
pub struct SessionIdentity {
    store: Arc<dyn KeyValueStore>,
    fallback: Mutex<Option<String>>,
}

impl SessionIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            fallback: Mutex::new(None),
        }
    }

    pub fn get_or_create_session_id(&self) -> String {
        let mut fallback = self
            .fallback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(id) = fallback.as_ref() {
            return id.clone();
        }

        match self.store.get(SESSION_ID_KEY) {
            Ok(Some(stored)) if !stored.is_empty() => return stored,
            Ok(_) => {}
            Err(err) => {
                log_warn!("session store unavailable, using in-memory session id: {err:#}");
                let id = Uuid::new_v4().to_string();
                *fallback = Some(id.clone());
                return id;
            }
        }

        let id = Uuid::new_v4().to_string();
        if let Err(err) = self.store.set(SESSION_ID_KEY, &id) {
            log_warn!("failed to persist session id, keeping it in memory: {err:#}");
            *fallback = Some(id.clone());
        }
        id
    }
}
