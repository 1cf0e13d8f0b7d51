use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

/// Conversation state for one customer address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStep {
    Menu,
    AwaitOption,
    AwaitCotizacionProduct,
    AwaitDisponibilidadProduct,
    AwaitEntregasZone,
    AwaitPreventaReservation,
}

impl SessionStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::AwaitOption => "await_option",
            Self::AwaitCotizacionProduct => "await_cotizacion_product",
            Self::AwaitDisponibilidadProduct => "await_disponibilidad_product",
            Self::AwaitEntregasZone => "await_entregas_zone",
            Self::AwaitPreventaReservation => "await_preventa_reservation",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub step: SessionStep,
    /// Free-form bag carried alongside the step. Nothing reads it today.
    pub data: BTreeMap<String, String>,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self { step: SessionStep::Menu, data: BTreeMap::new(), touched_at: Utc::now() }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Handlers lock the handle for the duration of one message, so two messages
/// for the same address are processed one after the other while distinct
/// addresses proceed in parallel.
pub type SessionHandle = Arc<Mutex<Session>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch-or-create the session entry for an address. A new entry starts
    /// at `SessionStep::Menu`.
    async fn entry(&self, address: &str) -> SessionHandle;
}

/// Process-wide session map. Sessions are never dropped during normal
/// operation; `evict_idle` is the explicit hook an operator can run on a
/// schedule to bound growth.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, SessionHandle>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Remove sessions idle for longer than `max_idle`. Entries currently
    /// locked by an in-flight message are kept regardless of age.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, handle| match handle.try_lock() {
            Ok(session) => now.signed_duration_since(session.touched_at) <= max_idle,
            Err(_) => true,
        });
        before - entries.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn entry(&self, address: &str) -> SessionHandle {
        if let Some(handle) = self.entries.read().await.get(address) {
            return Arc::clone(handle);
        }
        let mut entries = self.entries.write().await;
        Arc::clone(entries.entry(address.to_string()).or_insert_with(|| Arc::new(Mutex::new(Session::new()))))
    }
}
