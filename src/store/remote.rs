use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::filters::FilterCriteria;
use crate::models::{NewTask, Property, SavedSearch, Task, TaskUpdate};
use crate::store::traits::{PropertyStore, StoreError, StoreResult, SIMILAR_PRICE_DELTA};

const PROPERTY_TABLE: &str = "property_c";
const SAVED_TABLE: &str = "saved_search_c";
const TASK_TABLE: &str = "task_c";

const PROPERTY_FIELDS: &[&str] = &[
    "Id",
    "title_c",
    "price_c",
    "address_c",
    "coordinates_c",
    "bedrooms_c",
    "bathrooms_c",
    "square_feet_c",
    "property_type_c",
    "featured_c",
    "images_c",
    "description_c",
    "amenities_c",
    "year_built_c",
    "listing_date_c",
];

const TASK_FIELDS: &[&str] = &[
    "Id",
    "name_c",
    "description_c",
    "status_c",
    "due_date_c",
    "assigned_to_c",
    "property_c",
    "CreatedOn",
];

/// One predicate in a table query; all conditions combine with AND
#[derive(Debug, Clone, Serialize)]
struct Condition {
    #[serde(rename = "FieldName")]
    field_name: String,
    #[serde(rename = "Operator")]
    operator: &'static str,
    #[serde(rename = "Values")]
    values: Vec<Value>,
}

impl Condition {
    fn new(field_name: &str, operator: &'static str, value: Value) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator,
            values: vec![value],
        }
    }

    fn exact_match(field_name: &str, values: Vec<Value>) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator: "ExactMatch",
            values,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Paging {
    limit: usize,
    offset: usize,
}

#[derive(Debug, Clone, Serialize)]
struct OrderBy {
    #[serde(rename = "fieldName")]
    field_name: &'static str,
    #[serde(rename = "sorttype")]
    sort_type: &'static str,
}

#[derive(Debug, Serialize)]
struct FetchParams {
    fields: Vec<&'static str>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<Condition>,
    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none")]
    paging: Option<Paging>,
    #[serde(rename = "orderBy", skip_serializing_if = "Option::is_none")]
    order_by: Option<OrderBy>,
}

impl FetchParams {
    fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
            conditions: Vec::new(),
            paging: None,
            order_by: None,
        }
    }

    fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    fn with_limit(mut self, limit: usize) -> Self {
        self.paging = Some(Paging { limit, offset: 0 });
        self
    }

    fn order_by_due_date(mut self) -> Self {
        self.order_by = Some(OrderBy {
            field_name: "due_date_c",
            sort_type: "ASC",
        });
        self
    }
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<MutationResult>,
}

fn default_true() -> bool {
    true
}

/// Client for the hosted record/table API backing production data.
///
/// Range and equality filter fields translate into query conditions; the
/// multi-field `query` rule and the any-of amenities rule cannot be
/// expressed in the condition language, so the full rule set is re-applied
/// to the fetched rows before returning them.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    project_id: String,
}

impl RemoteStore {
    /// Build a client from explicit credentials
    pub fn new(base_url: &str, project_id: &str, api_key: &str) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("api key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
        })
    }

    /// Build a client from `ESTATE_API_URL`, `ESTATE_PROJECT_ID` and
    /// `ESTATE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("ESTATE_API_URL").context("ESTATE_API_URL is not set")?;
        let project_id =
            std::env::var("ESTATE_PROJECT_ID").context("ESTATE_PROJECT_ID is not set")?;
        let api_key = std::env::var("ESTATE_API_KEY").context("ESTATE_API_KEY is not set")?;
        Self::new(&base_url, &project_id, &api_key)
    }

    fn table_url(&self, table: &str, suffix: &str) -> String {
        format!(
            "{}/projects/{}/tables/{}{}",
            self.base_url, self.project_id, table, suffix
        )
    }

    async fn fetch_records(&self, table: &str, params: &FetchParams) -> StoreResult<Vec<Value>> {
        let url = self.table_url(table, "/query");
        debug!("querying {table}");
        let response = self.client.post(&url).json(params).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "{table} query returned status {}",
                response.status()
            )));
        }
        let body: FetchResponse = response.json().await?;
        if !body.success {
            return Err(StoreError::Backend(
                body.message.unwrap_or_else(|| "query failed".to_string()),
            ));
        }
        Ok(body.data.unwrap_or_default())
    }

    async fn get_record(&self, table: &str, id: u32) -> StoreResult<Value> {
        let url = self.table_url(table, &format!("/records/{id}"));
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id));
        }
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "{table} record fetch returned status {}",
                response.status()
            )));
        }
        let body: RecordResponse = response.json().await?;
        match body.data {
            Some(data) if body.success => Ok(data),
            _ => Err(StoreError::NotFound(id)),
        }
    }

    /// Create records, returning the created rows; any per-record failure
    /// fails the whole call
    async fn create_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        let url = self.table_url(table, "/records");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "records": records }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "{table} create returned status {}",
                response.status()
            )));
        }
        let body: MutationResponse = response.json().await?;
        if !body.success {
            return Err(StoreError::Backend(
                body.message.unwrap_or_else(|| "create failed".to_string()),
            ));
        }
        let mut created = Vec::new();
        for result in body.results {
            if !result.success {
                let message = result
                    .message
                    .unwrap_or_else(|| "record create failed".to_string());
                warn!("{table} create rejected a record: {message}");
                return Err(StoreError::Backend(message));
            }
            created.extend(result.data);
        }
        Ok(created)
    }

    async fn update_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        let url = self.table_url(table, "/records");
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "records": records }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "{table} update returned status {}",
                response.status()
            )));
        }
        let body: MutationResponse = response.json().await?;
        if !body.success {
            return Err(StoreError::Backend(
                body.message.unwrap_or_else(|| "update failed".to_string()),
            ));
        }
        let mut updated = Vec::new();
        for result in body.results {
            if !result.success {
                return Err(StoreError::Backend(
                    result
                        .message
                        .unwrap_or_else(|| "record update failed".to_string()),
                ));
            }
            updated.extend(result.data);
        }
        Ok(updated)
    }

    async fn delete_records(&self, table: &str, record_ids: Vec<u32>) -> StoreResult<()> {
        let url = self.table_url(table, "/records/delete");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "RecordIds": record_ids }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "{table} delete returned status {}",
                response.status()
            )));
        }
        let body: MutationResponse = response.json().await?;
        if !body.success {
            return Err(StoreError::Backend(
                body.message.unwrap_or_else(|| "delete failed".to_string()),
            ));
        }
        Ok(())
    }

    fn map_properties(rows: Vec<Value>) -> Vec<Property> {
        rows.iter().filter_map(Property::from_record).collect()
    }
}

/// Conditions for the filter fields the query language can express
fn where_conditions(filters: &FilterCriteria) -> Vec<Condition> {
    let mut conditions = Vec::new();
    if let Some(min) = filters.price_min {
        conditions.push(Condition::new("price_c", "GreaterThanOrEqualTo", json!(min)));
    }
    if let Some(max) = filters.price_max {
        conditions.push(Condition::new("price_c", "LessThanOrEqualTo", json!(max)));
    }
    if !filters.property_types.is_empty() {
        let values = filters
            .property_types
            .iter()
            .map(|t| json!(t.as_str()))
            .collect();
        conditions.push(Condition::exact_match("property_type_c", values));
    }
    if let Some(min) = filters.bedrooms_min {
        conditions.push(Condition::new(
            "bedrooms_c",
            "GreaterThanOrEqualTo",
            json!(min),
        ));
    }
    if let Some(min) = filters.bathrooms_min {
        conditions.push(Condition::new(
            "bathrooms_c",
            "GreaterThanOrEqualTo",
            json!(min),
        ));
    }
    if let Some(min) = filters.square_feet_min {
        conditions.push(Condition::new(
            "square_feet_c",
            "GreaterThanOrEqualTo",
            json!(min),
        ));
    }
    conditions
}

fn new_task_record(task: &NewTask) -> Value {
    json!({
        "name_c": task.name,
        "description_c": task.description,
        "status_c": task.status.label(),
        "due_date_c": task.due_date,
        "assigned_to_c": task.assigned_to,
        "property_c": task.property_id,
    })
}

/// Build an update record carrying only the fields the caller set
fn task_update_record(id: u32, update: &TaskUpdate) -> Value {
    let mut record = Map::new();
    record.insert("Id".to_string(), json!(id));
    if let Some(name) = &update.name {
        record.insert("name_c".to_string(), json!(name));
    }
    if let Some(description) = &update.description {
        record.insert("description_c".to_string(), json!(description));
    }
    if let Some(status) = &update.status {
        record.insert("status_c".to_string(), json!(status.label()));
    }
    if let Some(due_date) = &update.due_date {
        record.insert("due_date_c".to_string(), json!(due_date));
    }
    if let Some(assigned_to) = &update.assigned_to {
        record.insert("assigned_to_c".to_string(), json!(assigned_to));
    }
    if let Some(property_id) = &update.property_id {
        record.insert("property_c".to_string(), json!(property_id));
    }
    Value::Object(record)
}

#[async_trait]
impl PropertyStore for RemoteStore {
    async fn list_all(&self) -> StoreResult<Vec<Property>> {
        let rows = self
            .fetch_records(PROPERTY_TABLE, &FetchParams::new(PROPERTY_FIELDS))
            .await?;
        Ok(Self::map_properties(rows))
    }

    async fn get_by_id(&self, id: u32) -> StoreResult<Property> {
        let row = self.get_record(PROPERTY_TABLE, id).await?;
        Property::from_record(&row).ok_or(StoreError::NotFound(id))
    }

    async fn search(&self, filters: &FilterCriteria) -> StoreResult<Vec<Property>> {
        let filters = filters.normalized();
        if filters.is_empty() {
            return self.list_all().await;
        }
        let params =
            FetchParams::new(PROPERTY_FIELDS).with_conditions(where_conditions(&filters));
        let rows = self.fetch_records(PROPERTY_TABLE, &params).await?;
        // Conditions narrow the fetch; the query and amenities rules are
        // enforced here.
        Ok(Self::map_properties(rows)
            .into_iter()
            .filter(|p| filters.matches(p))
            .collect())
    }

    async fn list_featured(&self, limit: usize) -> StoreResult<Vec<Property>> {
        let params = FetchParams::new(PROPERTY_FIELDS)
            .with_conditions(vec![Condition::exact_match("featured_c", vec![json!(true)])])
            .with_limit(limit);
        let rows = self.fetch_records(PROPERTY_TABLE, &params).await?;
        Ok(Self::map_properties(rows))
    }

    async fn list_similar(&self, id: u32, limit: usize) -> StoreResult<Vec<Property>> {
        let source = self.get_by_id(id).await?;
        let params = FetchParams::new(PROPERTY_FIELDS).with_conditions(vec![
            Condition::exact_match(
                "property_type_c",
                vec![json!(source.property_type.as_str())],
            ),
            Condition::new("Id", "NotEqualTo", json!(id)),
        ]);
        let rows = self.fetch_records(PROPERTY_TABLE, &params).await?;
        // The price-delta rule is applied locally.
        Ok(Self::map_properties(rows)
            .into_iter()
            .filter(|p| (p.price - source.price).abs() <= SIMILAR_PRICE_DELTA)
            .take(limit)
            .collect())
    }

    async fn list_saved_ids(&self) -> StoreResult<Vec<u32>> {
        let params = FetchParams::new(&["Id", "property_id_c"]).with_conditions(vec![
            Condition::exact_match("type_c", vec![json!("property")]),
        ]);
        let rows = self.fetch_records(SAVED_TABLE, &params).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("property_id_c"))
            .filter_map(Value::as_u64)
            .filter_map(|id| u32::try_from(id).ok())
            .collect())
    }

    async fn save_property(&self, id: u32) -> StoreResult<()> {
        self.create_records(
            SAVED_TABLE,
            vec![json!({ "type_c": "property", "property_id_c": id })],
        )
        .await?;
        Ok(())
    }

    async fn unsave_property(&self, id: u32) -> StoreResult<()> {
        let params = FetchParams::new(&["Id"]).with_conditions(vec![
            Condition::exact_match("type_c", vec![json!("property")]),
            Condition::exact_match("property_id_c", vec![json!(id)]),
        ]);
        let rows = self.fetch_records(SAVED_TABLE, &params).await?;
        let record_ids: Vec<u32> = rows
            .iter()
            .filter_map(|row| row.get("Id"))
            .filter_map(Value::as_u64)
            .filter_map(|id| u32::try_from(id).ok())
            .collect();
        if record_ids.is_empty() {
            // Already absent; nothing to delete.
            return Ok(());
        }
        self.delete_records(SAVED_TABLE, record_ids).await
    }

    async fn list_saved_searches(&self) -> StoreResult<Vec<SavedSearch>> {
        let params = FetchParams::new(&[
            "Id",
            "name_c",
            "filters_c",
            "result_count_c",
            "created_date_c",
        ])
        .with_conditions(vec![Condition::exact_match(
            "type_c",
            vec![json!("search")],
        )]);
        let rows = self.fetch_records(SAVED_TABLE, &params).await?;
        Ok(rows.iter().filter_map(SavedSearch::from_record).collect())
    }

    async fn save_search(
        &self,
        name: &str,
        filters: &FilterCriteria,
        result_count: u32,
    ) -> StoreResult<SavedSearch> {
        let filters = filters.normalized();
        let filters_json = serde_json::to_string(&filters)
            .map_err(|err| StoreError::Backend(format!("could not encode filters: {err}")))?;
        let created = self
            .create_records(
                SAVED_TABLE,
                vec![json!({
                    "type_c": "search",
                    "name_c": name,
                    "filters_c": filters_json,
                    "result_count_c": result_count,
                    "created_date_c": Utc::now().to_rfc3339(),
                })],
            )
            .await?;
        created
            .first()
            .and_then(SavedSearch::from_record)
            .ok_or_else(|| StoreError::Backend("create returned no record".to_string()))
    }

    async fn delete_search(&self, id: u32) -> StoreResult<()> {
        self.delete_records(SAVED_TABLE, vec![id]).await
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let params = FetchParams::new(TASK_FIELDS)
            .order_by_due_date()
            .with_limit(50);
        let rows = self.fetch_records(TASK_TABLE, &params).await?;
        Ok(rows.iter().filter_map(Task::from_record).collect())
    }

    async fn get_task(&self, id: u32) -> StoreResult<Task> {
        let row = self.get_record(TASK_TABLE, id).await?;
        Task::from_record(&row).ok_or(StoreError::NotFound(id))
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let created = self
            .create_records(TASK_TABLE, vec![new_task_record(&task)])
            .await?;
        created
            .first()
            .and_then(Task::from_record)
            .ok_or_else(|| StoreError::Backend("create returned no record".to_string()))
    }

    async fn update_task(&self, id: u32, update: TaskUpdate) -> StoreResult<Task> {
        let updated = self
            .update_records(TASK_TABLE, vec![task_update_record(id, &update)])
            .await?;
        updated
            .first()
            .and_then(Task::from_record)
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete_task(&self, id: u32) -> StoreResult<()> {
        self.delete_records(TASK_TABLE, vec![id]).await
    }

    async fn tasks_for_property(&self, property_id: u32) -> StoreResult<Vec<Task>> {
        let params = FetchParams::new(TASK_FIELDS)
            .with_conditions(vec![Condition::new(
                "property_c",
                "EqualTo",
                json!(property_id),
            )])
            .order_by_due_date();
        let rows = self.fetch_records(TASK_TABLE, &params).await?;
        Ok(rows.iter().filter_map(Task::from_record).collect())
    }

    fn source_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;

    #[test]
    fn where_conditions_cover_each_translatable_field() {
        let filters = FilterCriteria {
            price_min: Some(100_000),
            price_max: Some(400_000),
            property_types: vec![PropertyType::Condo, PropertyType::House],
            bedrooms_min: Some(2),
            bathrooms_min: Some(1),
            square_feet_min: Some(800),
            amenities: vec!["Pool".to_string()],
            query: Some("park".to_string()),
        };
        let conditions = where_conditions(&filters);
        // query and amenities are applied locally, not translated
        assert_eq!(conditions.len(), 6);
        let encoded = serde_json::to_value(&conditions).unwrap();
        assert_eq!(encoded[0]["FieldName"], "price_c");
        assert_eq!(encoded[0]["Operator"], "GreaterThanOrEqualTo");
        assert_eq!(encoded[2]["Operator"], "ExactMatch");
        assert_eq!(encoded[2]["Values"], serde_json::json!(["condo", "house"]));
    }

    #[test]
    fn browse_all_translates_to_no_conditions() {
        assert!(where_conditions(&FilterCriteria::default()).is_empty());
    }

    #[test]
    fn fetch_params_omit_empty_sections() {
        let params = FetchParams::new(&["Id"]);
        let encoded = serde_json::to_value(&params).unwrap();
        assert!(encoded.get("where").is_none());
        assert!(encoded.get("pagingInfo").is_none());
        assert!(encoded.get("orderBy").is_none());
    }

    #[test]
    fn task_update_record_carries_only_set_fields() {
        let update = TaskUpdate {
            status: Some(crate::models::TaskStatus::Completed),
            due_date: Some(None),
            ..Default::default()
        };
        let record = task_update_record(9, &update);
        assert_eq!(record["Id"], 9);
        assert_eq!(record["status_c"], "Completed");
        assert_eq!(record["due_date_c"], Value::Null);
        assert!(record.get("name_c").is_none());
    }
}
