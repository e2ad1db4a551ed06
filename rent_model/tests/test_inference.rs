mod common;

use common::{query_listing, synthetic_corpus, test_config};
use rent_model::boundary::ListingPayload;
use rent_model::error::RentError;
use rent_model::inference::InferenceService;
use rent_model::neighborhood::{NeighborhoodStats, NeighborhoodStatsSource};
use rent_model::storage::InMemoryStore;
use rent_model::training::build_model;
use tempfile::tempdir;

fn trained_service(dir: &std::path::Path) -> (InferenceService<rent_model::Loaded>, InMemoryStore) {
    let config = test_config(dir);
    let store = InMemoryStore::new(synthetic_corpus(240));
    build_model(&store, &config).unwrap();
    let service = InferenceService::new(&config.paths.model).load().unwrap();
    (service, store)
}

#[test]
fn test_load_missing_artifact_is_not_found() {
    let dir = tempdir().unwrap();
    let service = InferenceService::new(dir.path().join("missing.json"));
    assert!(matches!(service.load(), Err(RentError::NotFound(_))));
}

#[test]
fn test_prediction_is_plausible_integer() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let rent = service.predict(&query_listing(3), &store).unwrap();
    // area 75 alone contributes 900 to the synthetic rent
    assert!(rent > 900);
    assert!(rent < 3000);
}

#[test]
fn test_larger_area_costs_more() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let mut small = query_listing(3);
    small.area = 35.0;
    let mut large = query_listing(3);
    large.area = 145.0;

    let small_rent = service.predict(&small, &store).unwrap();
    let large_rent = service.predict(&large, &store).unwrap();
    assert!(large_rent > small_rent);
}

#[test]
fn test_unseen_neighborhood_is_validation_error() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let err = service.predict(&query_listing(99), &store).unwrap_err();
    assert!(matches!(err, RentError::ValidationError(_)));
    assert!(err.to_string().contains("99"));
}

#[test]
fn test_unknown_amenity_value_is_validation_error() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let mut listing = query_listing(2);
    listing.garage = "maybe".to_string();
    assert!(matches!(
        service.predict(&listing, &store),
        Err(RentError::ValidationError(_))
    ));
}

#[test]
fn test_malformed_garden_is_validation_error() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let mut listing = query_listing(2);
    listing.garden = "Present".to_string();
    assert!(matches!(
        service.predict(&listing, &store),
        Err(RentError::ValidationError(_))
    ));
}

#[test]
fn test_snapshot_stats_match_live_source() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let snapshot: NeighborhoodStats = store.fetch_neighborhood_stats().unwrap();
    let listing = query_listing(5);
    assert_eq!(
        service.predict(&listing, &snapshot).unwrap(),
        service.predict(&listing, &store).unwrap()
    );
}

#[test]
fn test_payload_estimate() {
    let dir = tempdir().unwrap();
    let (service, store) = trained_service(dir.path());

    let payload = ListingPayload::from_json(
        r#"{
            "neighborhood_id": 4,
            "year_built": 1975,
            "area": 60.0,
            "rooms": 3,
            "bedrooms": 2,
            "bathrooms": 1.0,
            "balcony": "no",
            "storage": "yes",
            "parking": "no",
            "furnished": "no",
            "garage": "no",
            "garden": "Not present"
        }"#,
    )
    .unwrap();

    let estimate = service.estimate(payload, &store).unwrap();
    let json = serde_json::to_value(estimate).unwrap();
    assert!(json["estimated rent"].is_u64());
}

#[test]
fn test_loaded_service_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InferenceService<rent_model::Loaded>>();
}
