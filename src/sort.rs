use std::str::FromStr;

use chrono::NaiveDate;

use crate::models::Property;

/// Sort orders offered by the result view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Descending by listing date (default)
    #[default]
    Newest,
    /// Ascending by price
    PriceLow,
    /// Descending by price
    PriceHigh,
    /// Descending by bedroom count
    BedsHigh,
    /// Descending by square footage
    SqftHigh,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::BedsHigh => "beds-high",
            Self::SqftHigh => "sqft-high",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "beds-high" => Ok(Self::BedsHigh),
            "sqft-high" => Ok(Self::SqftHigh),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Earliest representable listing date; properties without a parseable
/// date sort as if listed then.
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

/// Return the properties reordered by `key` without mutating the input.
///
/// `sort_by` is stable, so properties comparing equal keep their input
/// order.
pub fn sort_properties(properties: &[Property], key: SortKey) -> Vec<Property> {
    let mut sorted = properties.to_vec();
    match key {
        SortKey::Newest => sorted.sort_by(|a, b| {
            let da = a.listing_date.unwrap_or_else(epoch);
            let db = b.listing_date.unwrap_or_else(epoch);
            db.cmp(&da)
        }),
        SortKey::PriceLow => sorted.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceHigh => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::BedsHigh => sorted.sort_by(|a, b| b.bedrooms.cmp(&a.bedrooms)),
        SortKey::SqftHigh => sorted.sort_by(|a, b| b.square_feet.cmp(&a.square_feet)),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, PropertyType};

    fn listing(id: u32, price: i64, beds: u32, sqft: u32, date: Option<&str>) -> Property {
        Property {
            id,
            title: String::new(),
            price,
            address: String::new(),
            coordinates: Coordinates::default(),
            bedrooms: beds,
            bathrooms: 1,
            square_feet: sqft,
            property_type: PropertyType::House,
            featured: false,
            images: vec![],
            description: String::new(),
            amenities: vec![],
            year_built: 2000,
            listing_date: date.map(|d| d.parse().unwrap()),
        }
    }

    fn ids(properties: &[Property]) -> Vec<u32> {
        properties.iter().map(|p| p.id).collect()
    }

    #[test]
    fn sorting_an_empty_list_yields_an_empty_list() {
        assert!(sort_properties(&[], SortKey::PriceLow).is_empty());
    }

    #[test]
    fn price_low_is_ascending_and_stable() {
        let input = vec![
            listing(1, 500_000, 2, 900, None),
            listing(2, 200_000, 2, 900, None),
            listing(3, 200_000, 2, 900, None),
        ];
        // 2 and 3 tie on price and must keep their input order
        assert_eq!(ids(&sort_properties(&input, SortKey::PriceLow)), [2, 3, 1]);
        // input untouched
        assert_eq!(ids(&input), [1, 2, 3]);
    }

    #[test]
    fn newest_puts_undated_listings_last() {
        let input = vec![
            listing(1, 0, 0, 0, None),
            listing(2, 0, 0, 0, Some("2024-05-01")),
            listing(3, 0, 0, 0, Some("2023-01-15")),
        ];
        assert_eq!(ids(&sort_properties(&input, SortKey::Newest)), [2, 3, 1]);
    }

    #[test]
    fn descending_keys_order_high_to_low() {
        let input = vec![
            listing(1, 100, 1, 500, None),
            listing(2, 300, 4, 2500, None),
            listing(3, 200, 2, 1500, None),
        ];
        assert_eq!(ids(&sort_properties(&input, SortKey::PriceHigh)), [2, 3, 1]);
        assert_eq!(ids(&sort_properties(&input, SortKey::BedsHigh)), [2, 3, 1]);
        assert_eq!(ids(&sort_properties(&input, SortKey::SqftHigh)), [2, 3, 1]);
    }

    #[test]
    fn sort_keys_parse_from_ui_tokens() {
        for key in [
            SortKey::Newest,
            SortKey::PriceLow,
            SortKey::PriceHigh,
            SortKey::BedsHigh,
            SortKey::SqftHigh,
        ] {
            assert_eq!(key.as_str().parse::<SortKey>().unwrap(), key);
        }
        assert!("oldest".parse::<SortKey>().is_err());
    }
}
