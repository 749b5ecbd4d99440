use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::clock::Clock;
use super::quotation::ResolvedRate;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: ResolvedRate,
    /// Period the payload is valid for.
    pub period_key: String,
    pub expires_at: DateTime<Utc>,
}

/// Single-slot cache holding the most recently resolved rate.
///
/// An entry is only returned while its period key matches the requested one and its
/// TTL has not elapsed. Stale entries stay in the slot until the next `put`.
pub struct RateCache {
    slot: Mutex<Option<CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl RateCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
        }
    }

    pub async fn get(&self, period_key: &str) -> Option<CacheEntry> {
        let slot = self.slot.lock().await;
        let Some(entry) = slot.as_ref() else {
            debug!("Cache MISS for period: {}", period_key);
            return None;
        };

        if entry.period_key != period_key {
            debug!(
                "Cache MISS for period: {} (slot holds {})",
                period_key, entry.period_key
            );
            return None;
        }
        if self.clock.now() >= entry.expires_at {
            debug!("Cache entry expired for period: {}", period_key);
            return None;
        }

        debug!("Cache HIT for period: {}", period_key);
        Some(entry.clone())
    }

    /// Overwrites the slot; the entry expires `ttl` from now.
    pub async fn put(&self, period_key: impl Into<String>, payload: ResolvedRate, ttl: Duration) {
        let now = self.clock.now();
        let entry = CacheEntry {
            payload,
            period_key: period_key.into(),
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut slot = self.slot.lock().await;
        debug!("Cache PUT for period: {}", entry.period_key);
        *slot = Some(entry);
    }

    pub async fn clear(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
        debug!("Cache CLEAR");
    }
}
