//! ID generator tests
//!
//! Determinism, bounds and listing resolution against a fake catalog.

mod utils;

use std::collections::HashSet;

use anime_ingest::modules::data_import::domain::services::import_components::id_generator::CLASSIC_IDS;
use anime_ingest::modules::data_import::domain::services::import_components::Bucket;
use anime_ingest::modules::data_import::{IdGenerator, Strategy};
use utils::factories::listing;
use utils::fakes::FakeCatalog;

#[test]
fn test_random_strategy_is_seeded() {
    let a = IdGenerator::generate(&Strategy::random(100, 7));
    let b = IdGenerator::generate(&Strategy::random(100, 7));
    let c = IdGenerator::generate(&Strategy::random(100, 8));

    assert_eq!(a.len(), 300);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let high = a.iter().filter(|id| **id > 200_000).count();
    assert!(high > 0 && high < 150, "high draws: {}", high);
}

#[test]
fn test_random_buckets_hold_one_hundred_draws() {
    let plan = IdGenerator::plan(&Strategy::random(250, 1));
    assert_eq!(plan.buckets.len(), 8);
    assert!(plan.buckets.iter().all(|b| match b {
        Bucket::Ids { ids, .. } => ids.len() <= 100,
        Bucket::Listing { .. } => false,
    }));
}

#[test]
fn test_range_strategy_stays_inside_bands() {
    let ids = IdGenerator::generate(&Strategy::ranges(400, 3));
    assert_eq!(ids.len(), 400);
    assert!(ids.iter().all(|id| (1..=100_000).contains(id)));

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(ids[0], 1);
}

#[test]
fn test_curated_and_listing_strategies() {
    assert_eq!(IdGenerator::generate(&Strategy::classics()), CLASSIC_IDS.to_vec());
    assert!(IdGenerator::generate(&Strategy::years(3000)).is_empty());
    assert!(IdGenerator::generate(&Strategy::popular(50)).is_empty());
}

#[test]
fn test_year_table_is_descending() {
    let plan = IdGenerator::plan(&Strategy::years(30_000));
    let labels: Vec<&str> = plan.buckets.iter().map(|b| b.label()).collect();
    assert_eq!(labels.first(), Some(&"year 2024"));
    assert_eq!(labels.last(), Some(&"year 1970"));
    assert_eq!(labels.len(), 35);
}

#[test]
fn test_genre_bucket_reads_a_single_page() {
    let catalog = FakeCatalog::new().with_listing("genre:1", listing(1..=80));
    let plan = IdGenerator::plan(&Strategy::genres(20_000));
    let action = &plan.buckets[0];
    assert_eq!(action.label(), "genre Action");

    let ids = tokio_test::block_on(IdGenerator::resolve_bucket(&catalog, action)).unwrap();
    assert_eq!(ids, (1..=50).collect::<Vec<i64>>());
    assert_eq!(catalog.page_calls(), 1);
}

#[tokio::test]
async fn test_year_bucket_pages_until_target() {
    let catalog = FakeCatalog::new().with_listing("season:2020", listing(1..=120));
    let plan = IdGenerator::plan(&Strategy::year_span(2020, 2020, 110));

    let ids = IdGenerator::resolve_bucket(&catalog, &plan.buckets[0])
        .await
        .unwrap();
    assert_eq!(ids.len(), 110);
    assert_eq!(catalog.page_calls(), 3);
}

#[tokio::test]
async fn test_empty_listing_yields_nothing() {
    let catalog = FakeCatalog::new();
    let plan = IdGenerator::plan(&Strategy::popular(40));

    let ids = IdGenerator::resolve_bucket(&catalog, &plan.buckets[0])
        .await
        .unwrap();
    assert!(ids.is_empty());
    assert_eq!(catalog.page_calls(), 1);
}
