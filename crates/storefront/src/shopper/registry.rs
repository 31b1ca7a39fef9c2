//! In-memory registry of shopper sessions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::ShopperSession;

/// Sessions untouched for this long are dropped.
pub const SHOPPER_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// A shopper session shared between concurrent requests.
pub type SharedShopper = Arc<Mutex<ShopperSession>>;

/// Identifier of one browser session's shopper state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopperId(Uuid);

impl ShopperId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ShopperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lock a shopper session.
///
/// Handlers hold the guard only for a synchronous mutation, never across an
/// `.await`.
pub fn lock(shopper: &SharedShopper) -> MutexGuard<'_, ShopperSession> {
    shopper.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Maps [`ShopperId`]s to their sessions.
#[derive(Clone)]
pub struct ShopperRegistry {
    sessions: Cache<ShopperId, SharedShopper>,
    max_animations: usize,
}

impl std::fmt::Debug for ShopperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopperRegistry")
            .field("sessions", &self.sessions.entry_count())
            .field("max_animations", &self.max_animations)
            .finish()
    }
}

impl ShopperRegistry {
    #[must_use]
    pub fn new(idle_timeout: Duration, max_animations: usize) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(idle_timeout)
            .eviction_listener(|id: Arc<ShopperId>, shopper: SharedShopper, cause| {
                debug!(shopper_id = %id, ?cause, "Shopper session dropped");
                lock(&shopper).unmount();
            })
            .build();

        Self {
            sessions,
            max_animations,
        }
    }

    /// The session for `id`, created empty on first use.
    pub async fn get_or_create(&self, id: ShopperId) -> SharedShopper {
        let max_animations = self.max_animations;
        let live = self.sessions.entry_count();
        self.sessions
            .get_with(id, async move {
                debug!(shopper_id = %id, live, "New shopper session");
                Arc::new(Mutex::new(ShopperSession::new(max_animations)))
            })
            .await
    }
}
