use async_trait::async_trait;
use thiserror::Error;

use crate::filters::FilterCriteria;
use crate::models::{NewTask, Property, SavedSearch, Task, TaskUpdate};

/// Failures surfaced by a [`PropertyStore`] implementation.
///
/// Malformed fields inside otherwise-valid rows are not errors; the record
/// mapping in `models` defaults them instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record with id {0}")]
    NotFound(u32),
    #[error("store request failed: {0}")]
    Backend(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Common contract for all property data stores.
///
/// Implemented by the remote table-API client and by the in-memory mock
/// store; the binary picks one at composition time and the rest of the
/// application only sees this trait.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    // Listings
    async fn list_all(&self) -> StoreResult<Vec<Property>>;
    async fn get_by_id(&self, id: u32) -> StoreResult<Property>;
    async fn search(&self, filters: &FilterCriteria) -> StoreResult<Vec<Property>>;
    async fn list_featured(&self, limit: usize) -> StoreResult<Vec<Property>>;
    /// Same property type, source id excluded, price within 100,000 of the
    /// source listing, truncated to `limit`. No further ranking.
    async fn list_similar(&self, id: u32, limit: usize) -> StoreResult<Vec<Property>>;

    // Saved properties
    async fn list_saved_ids(&self) -> StoreResult<Vec<u32>>;
    async fn save_property(&self, id: u32) -> StoreResult<()>;
    async fn unsave_property(&self, id: u32) -> StoreResult<()>;

    // Saved searches
    async fn list_saved_searches(&self) -> StoreResult<Vec<SavedSearch>>;
    async fn save_search(
        &self,
        name: &str,
        filters: &FilterCriteria,
        result_count: u32,
    ) -> StoreResult<SavedSearch>;
    async fn delete_search(&self, id: u32) -> StoreResult<()>;

    // Tasks, due-date ascending where ordered
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;
    async fn get_task(&self, id: u32) -> StoreResult<Task>;
    async fn create_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn update_task(&self, id: u32, update: TaskUpdate) -> StoreResult<Task>;
    async fn delete_task(&self, id: u32) -> StoreResult<()>;
    async fn tasks_for_property(&self, property_id: u32) -> StoreResult<Vec<Task>>;

    /// Name of the backing store, for log lines
    fn source_name(&self) -> &'static str;
}

/// Absolute price distance within which two same-type listings count as
/// similar.
pub const SIMILAR_PRICE_DELTA: i64 = 100_000;

/// Default page size for the featured strip
pub const FEATURED_LIMIT: usize = 6;

/// Default number of similar listings shown on a detail page
pub const SIMILAR_LIMIT: usize = 3;
