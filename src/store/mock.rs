use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::filters::FilterCriteria;
use crate::models::{NewTask, Property, SavedSearch, Task, TaskUpdate};
use crate::store::traits::{PropertyStore, StoreError, StoreResult, SIMILAR_PRICE_DELTA};

/// Listing fixture embedded for development and tests
const SEED: &str = include_str!("seed.json");

/// In-memory development substitute for the remote store.
///
/// Holds its data behind mutexes on an explicit store object, so tests can
/// build isolated fixtures with [`MockStore::with_properties`]. The default
/// constructor seeds the embedded fixture and simulates network latency on
/// every operation.
pub struct MockStore {
    properties: Vec<Property>,
    saved: Mutex<HashSet<u32>>,
    searches: Mutex<Vec<SavedSearch>>,
    tasks: Mutex<Vec<Task>>,
    next_search_id: AtomicU32,
    next_task_id: AtomicU32,
    simulate_latency: bool,
}

impl MockStore {
    /// Store seeded from the embedded fixture, with simulated latency
    pub fn new() -> Self {
        let properties: Vec<Property> =
            serde_json::from_str(SEED).expect("embedded seed fixture is valid");
        let mut store = Self::with_properties(properties);
        store.simulate_latency = true;
        store
    }

    /// Store over an explicit fixture, without latency. Intended for tests.
    pub fn with_properties(properties: Vec<Property>) -> Self {
        Self {
            properties,
            saved: Mutex::new(HashSet::new()),
            searches: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            next_search_id: AtomicU32::new(1),
            next_task_id: AtomicU32::new(1),
            simulate_latency: false,
        }
    }

    /// Stand-in for network latency (150-400ms depending on the operation)
    async fn delay(&self, ms: u64) {
        if self.simulate_latency {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn find(&self, id: u32) -> StoreResult<&Property> {
        self.properties
            .iter()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PropertyStore for MockStore {
    async fn list_all(&self) -> StoreResult<Vec<Property>> {
        self.delay(300).await;
        Ok(self.properties.clone())
    }

    async fn get_by_id(&self, id: u32) -> StoreResult<Property> {
        self.delay(200).await;
        self.find(id).cloned()
    }

    async fn search(&self, filters: &FilterCriteria) -> StoreResult<Vec<Property>> {
        self.delay(350).await;
        let filters = filters.normalized();
        let hits: Vec<Property> = self
            .properties
            .iter()
            .filter(|p| filters.matches(p))
            .cloned()
            .collect();
        debug!("mock search matched {} of {}", hits.len(), self.properties.len());
        Ok(hits)
    }

    async fn list_featured(&self, limit: usize) -> StoreResult<Vec<Property>> {
        self.delay(250).await;
        Ok(self
            .properties
            .iter()
            .filter(|p| p.featured)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_similar(&self, id: u32, limit: usize) -> StoreResult<Vec<Property>> {
        self.delay(250).await;
        let source = self.find(id)?.clone();
        Ok(self
            .properties
            .iter()
            .filter(|p| {
                p.id != id
                    && p.property_type == source.property_type
                    && (p.price - source.price).abs() <= SIMILAR_PRICE_DELTA
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_saved_ids(&self) -> StoreResult<Vec<u32>> {
        self.delay(200).await;
        let saved = self.saved.lock().unwrap();
        let mut ids: Vec<u32> = saved.iter().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn save_property(&self, id: u32) -> StoreResult<()> {
        self.delay(300).await;
        self.find(id)?;
        self.saved.lock().unwrap().insert(id);
        Ok(())
    }

    async fn unsave_property(&self, id: u32) -> StoreResult<()> {
        self.delay(300).await;
        // Removing an id that was never saved is not an error, matching
        // the remote store's delete-if-present behavior.
        self.saved.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_saved_searches(&self) -> StoreResult<Vec<SavedSearch>> {
        self.delay(250).await;
        Ok(self.searches.lock().unwrap().clone())
    }

    async fn save_search(
        &self,
        name: &str,
        filters: &FilterCriteria,
        result_count: u32,
    ) -> StoreResult<SavedSearch> {
        self.delay(350).await;
        let search = SavedSearch {
            id: self.next_search_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            filters: filters.normalized(),
            result_count,
            created_at: Utc::now(),
        };
        self.searches.lock().unwrap().push(search.clone());
        Ok(search)
    }

    async fn delete_search(&self, id: u32) -> StoreResult<()> {
        self.delay(250).await;
        let mut searches = self.searches.lock().unwrap();
        let before = searches.len();
        searches.retain(|s| s.id != id);
        if searches.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.delay(300).await;
        let mut tasks = self.tasks.lock().unwrap().clone();
        sort_by_due_date(&mut tasks);
        Ok(tasks)
    }

    async fn get_task(&self, id: u32) -> StoreResult<Task> {
        self.delay(200).await;
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        self.delay(400).await;
        let created = Task {
            id: self.next_task_id.fetch_add(1, Ordering::Relaxed),
            name: task.name,
            description: task.description,
            status: task.status,
            due_date: task.due_date,
            assigned_to: task.assigned_to,
            property_id: task.property_id,
            created_at: Utc::now(),
        };
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: u32, update: TaskUpdate) -> StoreResult<Task> {
        self.delay(400).await;
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(name) = update.name {
            task.name = name;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(assigned_to) = update.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(property_id) = update.property_id {
            task.property_id = property_id;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: u32) -> StoreResult<()> {
        self.delay(300).await;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn tasks_for_property(&self, property_id: u32) -> StoreResult<Vec<Task>> {
        self.delay(300).await;
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.property_id == Some(property_id))
            .cloned()
            .collect();
        sort_by_due_date(&mut tasks);
        Ok(tasks)
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}

/// Due-date ascending, undated tasks last; stable for ties
fn sort_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
