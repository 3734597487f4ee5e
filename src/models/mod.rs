use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::filters::FilterCriteria;

/// Fixed set of listing categories used by every search surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Condo,
    Townhouse,
    Apartment,
    Land,
    Commercial,
}

impl PropertyType {
    /// Wire name as stored by the backend (`house`, `condo`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Condo => "condo",
            Self::Townhouse => "townhouse",
            Self::Apartment => "apartment",
            Self::Land => "land",
            Self::Commercial => "commercial",
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::House => "House",
            Self::Condo => "Condo",
            Self::Townhouse => "Townhouse",
            Self::Apartment => "Apartment",
            Self::Land => "Land",
            Self::Commercial => "Commercial",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "house" => Ok(Self::House),
            "condo" => Ok(Self::Condo),
            "townhouse" => Ok(Self::Townhouse),
            "apartment" => Ok(Self::Apartment),
            "land" => Ok(Self::Land),
            "commercial" => Ok(Self::Commercial),
            other => Err(format!("unknown property type: {other}")),
        }
    }
}

/// Map pin location for a property
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Core listing data model. Created and mutated only by the external
/// store; the application treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: u32,
    pub title: String,
    pub price: i64,
    pub address: String,
    pub coordinates: Coordinates,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub square_feet: u32,
    pub property_type: PropertyType,
    pub featured: bool,
    pub images: Vec<String>,
    pub description: String,
    pub amenities: Vec<String>,
    pub year_built: i32,
    pub listing_date: Option<NaiveDate>,
}

/// A persisted filter set with its cached result count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: u32,
    pub name: String,
    pub filters: FilterCriteria,
    pub result_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Workflow state of a task
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Deferred,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Deferred => "Deferred",
        }
    }

    /// Fixed display order used by board-style task views
    pub const ALL: [TaskStatus; 4] = [
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::Deferred,
    ];
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Started" => Ok(Self::NotStarted),
            "In Progress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            "Deferred" => Ok(Self::Deferred),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A follow-up item, optionally tied to a property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<u32>,
    pub property_id: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<u32>,
    pub property_id: Option<u32>,
}

/// Partial update for an existing task; `None` leaves the field as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assigned_to: Option<Option<u32>>,
    pub property_id: Option<Option<u32>>,
}

// ---------------------------------------------------------------------------
// Raw record mapping
//
// The hosted table API returns rows as loose JSON objects with `*_c` field
// names; list-valued fields arrive as stringified JSON. All defaulting and
// validation for those rows lives here: a malformed embedded value maps to
// its empty/default form, never an error.
// ---------------------------------------------------------------------------

fn field_str(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn field_i64(record: &Value, key: &str) -> i64 {
    record.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn field_u32(record: &Value, key: &str) -> u32 {
    record
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn field_bool(record: &Value, key: &str) -> bool {
    record.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Parse a field stored as stringified JSON; malformed input yields `T::default()`
fn field_embedded_json<T: Default + for<'de> Deserialize<'de>>(record: &Value, key: &str) -> T {
    match record.get(key).and_then(Value::as_str) {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw).unwrap_or_else(|err| {
            warn!("ignoring malformed {key} field: {err}");
            T::default()
        }),
        _ => T::default(),
    }
}

fn field_date(record: &Value, key: &str) -> Option<NaiveDate> {
    let raw = record.get(key)?.as_str()?;
    // Stored either as a plain date or a full timestamp; the date prefix
    // is all we keep.
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn field_timestamp(record: &Value, key: &str) -> DateTime<Utc> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

impl Property {
    /// Map a raw `property_c` row into a typed record. Rows without a
    /// usable id are dropped.
    pub fn from_record(record: &Value) -> Option<Self> {
        let id = record.get("Id").and_then(Value::as_u64)?;
        let id = u32::try_from(id).ok().filter(|id| *id > 0)?;
        let property_type = field_str(record, "property_type_c")
            .parse()
            .unwrap_or(PropertyType::House);

        Some(Self {
            id,
            title: field_str(record, "title_c"),
            price: field_i64(record, "price_c").max(0),
            address: field_str(record, "address_c"),
            coordinates: field_embedded_json(record, "coordinates_c"),
            bedrooms: field_u32(record, "bedrooms_c"),
            bathrooms: field_u32(record, "bathrooms_c"),
            square_feet: field_u32(record, "square_feet_c"),
            property_type,
            featured: field_bool(record, "featured_c"),
            images: field_embedded_json(record, "images_c"),
            description: field_str(record, "description_c"),
            amenities: field_embedded_json(record, "amenities_c"),
            year_built: field_i64(record, "year_built_c") as i32,
            listing_date: field_date(record, "listing_date_c"),
        })
    }
}

impl SavedSearch {
    /// Map a raw `saved_search_c` row tagged `type_c = "search"`
    pub fn from_record(record: &Value) -> Option<Self> {
        let id = record.get("Id").and_then(Value::as_u64)?;
        let id = u32::try_from(id).ok()?;

        Some(Self {
            id,
            name: field_str(record, "name_c"),
            filters: field_embedded_json(record, "filters_c"),
            result_count: field_u32(record, "result_count_c"),
            created_at: field_timestamp(record, "created_date_c"),
        })
    }
}

impl Task {
    /// Map a raw `task_c` row into a typed record
    pub fn from_record(record: &Value) -> Option<Self> {
        let id = record.get("Id").and_then(Value::as_u64)?;
        let id = u32::try_from(id).ok()?;
        let status = field_str(record, "status_c").parse().unwrap_or_default();

        Some(Self {
            id,
            name: field_str(record, "name_c"),
            description: field_str(record, "description_c"),
            status,
            due_date: field_date(record, "due_date_c"),
            assigned_to: record
                .get("assigned_to_c")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok()),
            property_id: record
                .get("property_c")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok()),
            created_at: field_timestamp(record, "CreatedOn"),
        })
    }
}
