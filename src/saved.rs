use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::store::{PropertyStore, StoreResult};

/// Client-side view of which properties are saved.
///
/// The set mirrors the last confirmed backend state: every mutation awaits
/// the store round trip and updates the set only on success, so a failed
/// request leaves membership untouched. Operations on the same property id
/// queue behind a per-id mutex, which makes a toggle issued while another
/// is in flight observe the first one's outcome rather than a stale value.
/// No ordering is imposed across different ids.
pub struct SavedTracker {
    store: Arc<dyn PropertyStore>,
    saved: Mutex<HashSet<u32>>,
    gates: Mutex<HashMap<u32, Arc<AsyncMutex<()>>>>,
}

impl SavedTracker {
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self {
            store,
            saved: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the local set with what the backend currently reports.
    /// Called at session start and on explicit refresh.
    pub async fn load(&self) -> StoreResult<()> {
        let ids = self.store.list_saved_ids().await?;
        let mut saved = self.saved.lock().unwrap();
        saved.clear();
        saved.extend(ids);
        debug!("loaded {} saved properties", saved.len());
        Ok(())
    }

    /// Pure membership check; no I/O
    pub fn is_saved(&self, id: u32) -> bool {
        self.saved.lock().unwrap().contains(&id)
    }

    /// Current membership, sorted for stable display
    pub fn saved_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.saved.lock().unwrap().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Save a property. Returns whether membership changed; already-saved
    /// ids are a no-op and issue no backend write.
    pub async fn save(&self, id: u32) -> StoreResult<bool> {
        let gate = self.gate(id);
        let _serialized = gate.lock().await;
        self.apply(id, true).await
    }

    /// Remove a property from the saved set; not-saved ids are a no-op
    pub async fn unsave(&self, id: u32) -> StoreResult<bool> {
        let gate = self.gate(id);
        let _serialized = gate.lock().await;
        self.apply(id, false).await
    }

    /// Flip the saved state, returning the new membership value
    pub async fn toggle(&self, id: u32) -> StoreResult<bool> {
        let gate = self.gate(id);
        let _serialized = gate.lock().await;
        let target = !self.is_saved(id);
        self.apply(id, target).await?;
        Ok(target)
    }

    /// Per-id queue: one clone of the mutex per in-flight id
    fn gate(&self, id: u32) -> Arc<AsyncMutex<()>> {
        let mut gates = self.gates.lock().unwrap();
        gates.entry(id).or_default().clone()
    }

    /// Drive membership toward `target`; caller holds the id's gate.
    /// The local set mutates only after the store confirms.
    async fn apply(&self, id: u32, target: bool) -> StoreResult<bool> {
        if self.is_saved(id) == target {
            return Ok(false);
        }
        if target {
            self.store.save_property(id).await?;
            self.saved.lock().unwrap().insert(id);
        } else {
            self.store.unsave_property(id).await?;
            self.saved.lock().unwrap().remove(&id);
        }
        Ok(true)
    }
}
