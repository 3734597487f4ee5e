use serde::{Deserialize, Serialize};

use crate::models::{Property, PropertyType};

/// Search criteria for a single browse/search session.
///
/// Every field is optional; a scalar set to `None` and a list left empty
/// mean "not filtering on this". [`FilterCriteria::normalized`] produces
/// the canonical form where an empty or whitespace-only query also counts
/// as absent, which is the form the rest of the application works with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_feet_min: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl FilterCriteria {
    /// Canonical form: drops empty-equivalent values so that a field is
    /// either absent or meaningfully set.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        out
    }

    /// True when no field is active, i.e. browse-all mode
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of active fields, shown as the filter badge count
    pub fn active_count(&self) -> usize {
        let f = self.normalized();
        [
            f.price_min.is_some(),
            f.price_max.is_some(),
            !f.property_types.is_empty(),
            f.bedrooms_min.is_some(),
            f.bathrooms_min.is_some(),
            f.square_feet_min.is_some(),
            !f.amenities.is_empty(),
            f.query.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Whether a property satisfies every active rule.
    ///
    /// Rules combine with AND; the amenities rule matches when at least one
    /// requested amenity is present, and the query rule matches the title,
    /// address, or description case-insensitively.
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(min) = self.price_min {
            if property.price < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if property.price > max {
                return false;
            }
        }
        if !self.property_types.is_empty() && !self.property_types.contains(&property.property_type)
        {
            return false;
        }
        if let Some(min) = self.bedrooms_min {
            if property.bedrooms < min {
                return false;
            }
        }
        if let Some(min) = self.bathrooms_min {
            if property.bathrooms < min {
                return false;
            }
        }
        if let Some(min) = self.square_feet_min {
            if property.square_feet < min {
                return false;
            }
        }
        if !self.amenities.is_empty() {
            let any_present = self
                .amenities
                .iter()
                .any(|wanted| property.amenities.iter().any(|have| have == wanted));
            if !any_present {
                return false;
            }
        }
        // An empty or whitespace-only query is inactive, same as in
        // normalized()
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = query.to_lowercase();
            let hit = property.title.to_lowercase().contains(&needle)
                || property.address.to_lowercase().contains(&needle)
                || property.description.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }

        true
    }
}
