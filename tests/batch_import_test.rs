//! Batch fetch-persist engine tests
//!
//! Runs the engine against the in-memory repository and a fake catalog.

mod utils;

use std::sync::Arc;
use std::time::Duration;

use anime_ingest::modules::anime::{InMemoryAnimeRepository, NormalizedAnime, RecordNormalizer, RelatedKind};
use anime_ingest::modules::data_import::{BatchImporter, BatchSettings, TaskOutcome};
use futures::future::join_all;
use utils::factories::RawAnimeFactory;
use utils::fakes::{FakeCatalog, UnreachableRepository};

const BASE_URL: &str = "https://shikimori.one";

fn fast_settings() -> BatchSettings {
    BatchSettings {
        workers: 10,
        max_batch_size: 100,
        request_delay: Duration::ZERO,
        rate_limit_cooldown: Duration::from_millis(20),
        error_milestone: 100,
    }
}

fn importer(
    catalog: Arc<FakeCatalog>,
    repo: Arc<InMemoryAnimeRepository>,
    settings: BatchSettings,
) -> BatchImporter {
    BatchImporter::new(catalog, RecordNormalizer::new(BASE_URL), repo, settings)
}

#[tokio::test]
async fn test_mixed_batch_imports_only_new_valid_records() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    repo.seed(NormalizedAnime::bare(1));
    let catalog = Arc::new(
        FakeCatalog::new().with_record(
            RawAnimeFactory::new(3)
                .name("Kaiba")
                .genres(&["Action", "Drama"])
                .build(),
        ),
    );
    let importer = importer(catalog.clone(), repo.clone(), fast_settings());

    let imported = importer.run_batch(&[1, 2, 3]).await.unwrap();

    assert_eq!(imported, 1);
    assert_eq!(repo.anime_count(), 2);
    assert_eq!(
        repo.linked_names(3, RelatedKind::Genre),
        vec!["Action".to_string(), "Drama".to_string()]
    );
    assert_eq!(catalog.detail_calls(), 2);

    let stats = importer.stats().snapshot();
    assert_eq!(stats.attempted, 2);
    assert_eq!(stats.imported, 1);
    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_second_run_imports_nothing() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new().with_records((1..=5).map(|id| RawAnimeFactory::new(id).build())),
    );
    let importer = importer(catalog.clone(), repo.clone(), fast_settings());
    let ids: Vec<i64> = (1..=5).collect();

    assert_eq!(importer.run_batch(&ids).await.unwrap(), 5);
    assert_eq!(importer.run_batch(&ids).await.unwrap(), 0);
    assert_eq!(repo.anime_count(), 5);
    assert_eq!(catalog.detail_calls(), 5);
}

#[tokio::test]
async fn test_imported_never_exceeds_new_ids() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    for id in [2, 4, 6] {
        repo.seed(NormalizedAnime::bare(id));
    }
    let catalog = Arc::new(
        FakeCatalog::new().with_records((1..=8).map(|id| RawAnimeFactory::new(id).build())),
    );
    let importer = importer(catalog, repo, fast_settings());

    let ids = [1, 2, 3, 4, 5, 6, 7, 8, 8, -1, 0];
    let imported = importer.run_batch(&ids).await.unwrap();
    assert_eq!(imported, 5);
}

#[tokio::test]
async fn test_batch_ceiling_caps_dispatch() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new().with_records((1..=10).map(|id| RawAnimeFactory::new(id).build())),
    );
    let settings = BatchSettings {
        max_batch_size: 3,
        ..fast_settings()
    };
    let importer = importer(catalog.clone(), repo.clone(), settings);

    let ids: Vec<i64> = (1..=10).collect();
    assert_eq!(importer.run_batch(&ids).await.unwrap(), 3);
    assert_eq!(catalog.detail_calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_over_overlapping_ids_converge() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_delay(Duration::from_millis(5))
            .with_records((1..=10).map(|id| {
                RawAnimeFactory::new(id)
                    .genres(&["Action", "Comedy"])
                    .studios(&["Sunrise"])
                    .build()
            })),
    );
    let importer = importer(catalog, repo.clone(), fast_settings());

    let tasks = (0..50).map(|i| {
        let importer = importer.clone();
        tokio::spawn(async move { importer.import_candidate(i % 10 + 1).await })
    });
    let outcomes: Vec<TaskOutcome> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let imported = outcomes.iter().filter(|o| o.is_imported()).count();
    assert_eq!(imported, 10);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, TaskOutcome::Imported | TaskOutcome::AlreadyPresent)));
    assert_eq!(repo.anime_count(), 10);
    assert_eq!(importer.stats().errors(), 0);

    for id in 1..=10 {
        assert_eq!(repo.linked_names(id, RelatedKind::Genre).len(), 2);
    }
}

#[tokio::test]
async fn test_rate_limited_candidate_is_abandoned() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_record(RawAnimeFactory::new(1).build())
            .with_record(RawAnimeFactory::new(2).build())
            .rate_limit(2),
    );
    let importer = importer(catalog, repo.clone(), fast_settings());

    assert_eq!(importer.run_batch(&[1, 2]).await.unwrap(), 1);
    let stats = importer.stats().snapshot();
    assert_eq!(stats.rate_limited, 1);
    assert_eq!(stats.errors, 0);
    assert!(repo.get(2).is_none());
}

#[tokio::test]
async fn test_rate_limit_cooldown_ignores_long_retry_after() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_record(RawAnimeFactory::new(1).build())
            .rate_limit(1)
            .with_retry_after(Duration::from_secs(3600)),
    );
    let importer = importer(catalog, repo, fast_settings());

    let imported = tokio::time::timeout(Duration::from_secs(3), importer.run_batch(&[1]))
        .await
        .expect("cooldown should be the configured one")
        .unwrap();

    assert_eq!(imported, 0);
    assert_eq!(importer.stats().snapshot().rate_limited, 1);
}

#[tokio::test]
async fn test_failures_do_not_abort_siblings() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_records((1..=4).map(|id| RawAnimeFactory::new(id).build()))
            .fail(2)
            .fail(3),
    );
    let importer = importer(catalog, repo.clone(), fast_settings());

    assert_eq!(importer.run_batch(&[1, 2, 3, 4]).await.unwrap(), 2);
    assert_eq!(importer.stats().errors(), 2);
    assert_eq!(repo.anime_count(), 2);
}

#[tokio::test]
async fn test_unreachable_persistence_is_a_setup_fault() {
    let catalog = Arc::new(FakeCatalog::new().with_record(RawAnimeFactory::new(1).build()));
    let importer = BatchImporter::new(
        catalog.clone(),
        RecordNormalizer::new(BASE_URL),
        Arc::new(UnreachableRepository),
        fast_settings(),
    );

    let err = importer.run_batch(&[1]).await.unwrap_err();
    assert!(err.is_setup_fault());
    assert_eq!(catalog.detail_calls(), 0);
}

#[tokio::test]
async fn test_cancelled_batch_dispatches_nothing() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(FakeCatalog::new().with_record(RawAnimeFactory::new(1).build()));
    let importer = importer(catalog.clone(), repo, fast_settings());

    importer.cancellation_token().cancel();
    assert_eq!(importer.run_batch(&[1]).await.unwrap(), 0);
    assert_eq!(catalog.detail_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_cuts_throttle_delay_short() {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let catalog = Arc::new(
        FakeCatalog::new().with_records((1..=3).map(|id| RawAnimeFactory::new(id).build())),
    );
    let settings = BatchSettings {
        request_delay: Duration::from_secs(30),
        ..fast_settings()
    };
    let importer = importer(catalog, repo.clone(), settings);
    let cancel = importer.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let imported = tokio::time::timeout(Duration::from_secs(5), importer.run_batch(&[1, 2, 3]))
        .await
        .expect("batch should stop once cancelled")
        .unwrap();

    assert_eq!(imported, 3);
    assert_eq!(repo.anime_count(), 3);
}
