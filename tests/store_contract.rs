use std::collections::HashSet;
use std::sync::Arc;

use estate_scout::filters::FilterCriteria;
use estate_scout::models::{Coordinates, Property, PropertyType};
use estate_scout::saved::SavedTracker;
use estate_scout::sort::{sort_properties, SortKey};
use estate_scout::store::{MockStore, PropertyStore, StoreError};

fn listing(id: u32, price: i64, property_type: PropertyType) -> Property {
    Property {
        id,
        title: format!("Listing {id}"),
        price,
        address: format!("{id} Main St"),
        coordinates: Coordinates::default(),
        bedrooms: 2,
        bathrooms: 1,
        square_feet: 1000,
        property_type,
        featured: false,
        images: vec![],
        description: String::new(),
        amenities: vec![],
        year_built: 2000,
        listing_date: None,
    }
}

#[tokio::test]
async fn similar_listings_require_same_type_within_the_price_delta() {
    let store = MockStore::with_properties(vec![
        listing(1, 200_000, PropertyType::Condo),
        listing(2, 250_000, PropertyType::Condo),
        listing(3, 900_000, PropertyType::House),
    ]);

    let similar = store.list_similar(1, 3).await.unwrap();
    let ids: Vec<u32> = similar.iter().map(|p| p.id).collect();
    // 2 shares the type and sits 50,000 away; 3 is the wrong type and far
    // outside the 100,000 delta anyway.
    assert_eq!(ids, [2]);
}

#[tokio::test]
async fn similar_listings_exclude_same_type_outside_the_delta() {
    let store = MockStore::with_properties(vec![
        listing(1, 200_000, PropertyType::Condo),
        listing(2, 300_000, PropertyType::Condo),
        listing(3, 301_000, PropertyType::Condo),
    ]);

    let ids: Vec<u32> = store
        .list_similar(1, 3)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    // exactly at the delta is still similar; one past it is not
    assert_eq!(ids, [2]);
}

#[tokio::test]
async fn similar_listings_for_an_unknown_id_fail_with_not_found() {
    let store = MockStore::with_properties(vec![]);
    assert!(matches!(
        store.list_similar(42, 3).await,
        Err(StoreError::NotFound(42))
    ));
}

#[tokio::test]
async fn empty_filters_browse_everything() {
    let store = MockStore::with_properties(vec![
        listing(1, 100, PropertyType::House),
        listing(2, 200, PropertyType::Land),
    ]);
    let all = store.search(&FilterCriteria::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    // empty-equivalent criteria behave the same
    let empty_equivalent = FilterCriteria {
        query: Some(String::new()),
        property_types: vec![],
        ..Default::default()
    };
    assert_eq!(store.search(&empty_equivalent).await.unwrap().len(), 2);
}

/// Tiny deterministic generator; the pack has no property-testing crate,
/// and a seeded LCG is enough to sweep the filter space.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn chance(&mut self, one_in: u64) -> bool {
        self.next() % one_in == 0
    }
}

fn random_filters(rng: &mut Lcg) -> FilterCriteria {
    let types = [
        PropertyType::House,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Apartment,
    ];
    let amenities = ["Pool", "Gym", "Garden", "Parking"];
    FilterCriteria {
        price_min: rng.chance(2).then(|| (rng.next() % 10) as i64 * 100_000),
        price_max: rng.chance(2).then(|| (rng.next() % 10 + 5) as i64 * 100_000),
        property_types: types
            .into_iter()
            .filter(|_| rng.chance(3))
            .collect(),
        bedrooms_min: rng.chance(3).then(|| (rng.next() % 5) as u32),
        bathrooms_min: rng.chance(3).then(|| (rng.next() % 4) as u32),
        square_feet_min: rng.chance(3).then(|| (rng.next() % 3000) as u32),
        amenities: amenities
            .into_iter()
            .filter(|_| rng.chance(4))
            .map(str::to_string)
            .collect(),
        query: rng.chance(3).then(|| format!("Listing {}", rng.next() % 8)),
    }
}

fn varied_fixture(rng: &mut Lcg) -> Vec<Property> {
    let types = [
        PropertyType::House,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Apartment,
    ];
    let amenities = ["Pool", "Gym", "Garden", "Parking"];
    (1..=20)
        .map(|id| {
            let mut p = listing(id, (rng.next() % 15) as i64 * 100_000, types[(rng.next() % 4) as usize]);
            p.bedrooms = (rng.next() % 6) as u32;
            p.bathrooms = (rng.next() % 4) as u32;
            p.square_feet = (rng.next() % 4000) as u32;
            p.amenities = amenities
                .into_iter()
                .filter(|_| rng.chance(2))
                .map(str::to_string)
                .collect();
            p
        })
        .collect()
}

#[tokio::test]
async fn search_membership_matches_the_filter_rules_exactly() {
    let mut rng = Lcg(0x5eed);
    let fixture = varied_fixture(&mut rng);
    let store = MockStore::with_properties(fixture.clone());

    for _ in 0..200 {
        let filters = random_filters(&mut rng).normalized();
        let results = store.search(&filters).await.unwrap();
        let result_ids: HashSet<u32> = results.iter().map(|p| p.id).collect();

        for property in &fixture {
            assert_eq!(
                result_ids.contains(&property.id),
                filters.matches(property),
                "membership mismatch for id {} under {filters:?}",
                property.id
            );
        }
    }
}

#[tokio::test]
async fn a_browse_session_end_to_end() {
    let store = Arc::new(MockStore::new());

    // featured strip
    let featured = store.list_featured(6).await.unwrap();
    assert!(!featured.is_empty() && featured.len() <= 6);
    assert!(featured.iter().all(|p| p.featured));

    // filtered search, sorted by price
    let filters = FilterCriteria {
        property_types: vec![PropertyType::House],
        price_max: Some(700_000),
        ..Default::default()
    };
    let results = store.search(&filters).await.unwrap();
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|p| p.property_type == PropertyType::House && p.price <= 700_000));
    let sorted = sort_properties(&results, SortKey::PriceLow);
    assert!(sorted.windows(2).all(|w| w[0].price <= w[1].price));

    // save one result, confirm membership survives a reload
    let tracker = SavedTracker::new(store.clone());
    tracker.load().await.unwrap();
    let id = sorted[0].id;
    assert!(tracker.save(id).await.unwrap());

    let fresh = SavedTracker::new(store.clone());
    fresh.load().await.unwrap();
    assert!(fresh.is_saved(id));

    // persist the search and read it back
    let saved = store
        .save_search("Affordable houses", &filters, results.len() as u32)
        .await
        .unwrap();
    let searches = store.list_saved_searches().await.unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].id, saved.id);
    assert_eq!(searches[0].filters, filters.normalized());
}
