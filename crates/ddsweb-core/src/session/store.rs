use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::signal::SignalConfig;

/// Shared signal configuration type alias
pub type SharedSignal = Arc<RwLock<SignalConfig>>;

/// Which connections see a given configuration record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    /// One record for the whole process; every client edits the same values
    Shared,
    /// Each connection owns a record seeded from the defaults
    #[default]
    Connection,
}

/// Configuration record bound to one connection
#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    config: SharedSignal,
}

impl Session {
    fn new(id: u64, config: SharedSignal) -> Self {
        Self { id, config }
    }

    /// Identifier unique to this connection, even when the record is shared
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Apply a change to the record
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut SignalConfig),
    {
        f(&mut self.config.write());
    }

    /// Copy of the current values, taken under a single read lock
    pub fn snapshot(&self) -> SignalConfig {
        self.config.read().clone()
    }
}

/// Hands out sessions according to the configured scope
#[derive(Debug)]
pub struct SessionStore {
    scope: SessionScope,
    defaults: SignalConfig,
    shared: SharedSignal,
    next_id: AtomicU64,
}

impl SessionStore {
    /// Create a store; `defaults` seeds every new record
    pub fn new(scope: SessionScope, defaults: SignalConfig) -> Self {
        Self {
            scope,
            shared: Arc::new(RwLock::new(defaults.clone())),
            defaults,
            next_id: AtomicU64::new(1),
        }
    }

    /// Session for a newly connected client
    pub fn open(&self) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.scope {
            SessionScope::Shared => Session::new(id, self.shared.clone()),
            SessionScope::Connection => {
                Session::new(id, Arc::new(RwLock::new(self.defaults.clone())))
            }
        }
    }

    pub fn scope(&self) -> SessionScope {
        self.scope
    }
}
