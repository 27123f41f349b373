//! Service-level tests: single strategy imports, poster refresh and profile
//! checks, all against in-memory backends.

mod utils;

use std::sync::Arc;

use anime_ingest::modules::anime::domain::entities::AnimeTitles;
use anime_ingest::modules::anime::{InMemoryAnimeRepository, NormalizedAnime, MISSING_POSTER};
use anime_ingest::modules::data_import::domain::services::import_components::id_generator::CLASSIC_IDS;
use anime_ingest::modules::data_import::{
    CampaignMode, CampaignOutcome, CheckpointStore, ImportBackends, InMemoryCheckpointStore,
    MassImportService, Strategy, StrategyStatus,
};
use anime_ingest::modules::provider::PosterSource;
use anime_ingest::shared::errors::AppError;
use anime_ingest::shared::ImportProfile;
use utils::factories::RawAnimeFactory;
use utils::fakes::{FakeCatalog, StaticPosterSource};

struct Setup {
    repo: Arc<InMemoryAnimeRepository>,
    checkpoints: Arc<InMemoryCheckpointStore>,
    posters: Option<Arc<StaticPosterSource>>,
    service: MassImportService,
}

fn setup(catalog: FakeCatalog, cover: Option<Option<&str>>) -> Setup {
    let repo = Arc::new(InMemoryAnimeRepository::new());
    let checkpoints = Arc::new(InMemoryCheckpointStore::new());
    let posters = cover.map(|c| Arc::new(StaticPosterSource::new(c)));

    let backends = ImportBackends {
        source: Arc::new(catalog),
        poster_source: posters.clone().map(|p| p as Arc<dyn PosterSource>),
        repository: repo.clone(),
        checkpoints: checkpoints.clone(),
    };
    let service = MassImportService::new(backends, "https://shikimori.one", ImportProfile::standard());

    Setup {
        repo,
        checkpoints,
        posters,
        service,
    }
}

fn missing_poster_record(id: i64, title: &str) -> NormalizedAnime {
    NormalizedAnime {
        titles: AnimeTitles {
            en: Some(title.to_string()),
            ..AnimeTitles::default()
        },
        ..NormalizedAnime::bare(id)
    }
}

#[tokio::test]
async fn test_single_strategy_import_reports_shortfall() {
    let catalog = FakeCatalog::new().with_records(
        CLASSIC_IDS[..3]
            .iter()
            .map(|id| RawAnimeFactory::new(*id).build()),
    );
    let s = setup(catalog, None);

    let report = s
        .service
        .import_strategy(&Strategy::classics(), 1000)
        .await
        .unwrap();

    assert_eq!(report.outcome, CampaignOutcome::Completed);
    assert_eq!(report.stats.imported, 3);
    assert_eq!(report.stats.not_found, (CLASSIC_IDS.len() - 3) as u64);
    assert_eq!(report.strategies.len(), 1);
    assert_eq!(report.strategies[0].target, CLASSIC_IDS.len());
    assert_eq!(report.strategies[0].status, StrategyStatus::Exhausted);
    assert_eq!(report.counts.anime, 3);
    assert_eq!(s.repo.anime_count(), 3);

    // Single strategy runs leave no checkpoint behind
    let checkpoint = s.checkpoints.load_checkpoint("import-classics").await.unwrap();
    assert!(checkpoint.is_none());
}

#[tokio::test]
async fn test_ultra_campaign_needs_ultra_profile() {
    let s = setup(FakeCatalog::new(), None);

    let err = s
        .service
        .run_mass_import(
            CampaignMode::Ultra {
                accept_ban_risk: true,
            },
            10,
            7,
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConfigError(_)));
    assert_eq!(s.repo.anime_count(), 0);
}

#[tokio::test]
async fn test_refresh_posters_updates_resolved_records() {
    let s = setup(FakeCatalog::new(), Some(Some("https://img.anili.st/cover/1.jpg")));
    s.repo.seed(missing_poster_record(1, "Cowboy Bebop"));
    s.repo.seed(NormalizedAnime {
        poster_url: "https://shikimori.one/system/animes/original/2.jpg".to_string(),
        ..missing_poster_record(2, "Trigun")
    });

    let report = s.service.refresh_posters(10).await.unwrap();

    assert_eq!(report.checked, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.unresolved, 0);
    assert_eq!(
        s.repo.get(1).unwrap().poster_url,
        "https://img.anili.st/cover/1.jpg"
    );
    assert_eq!(s.posters.as_ref().unwrap().calls(), 1);
}

#[tokio::test]
async fn test_refresh_posters_counts_unresolved() {
    let s = setup(FakeCatalog::new(), Some(None));
    s.repo.seed(missing_poster_record(5, "Nameless"));

    let report = s.service.refresh_posters(10).await.unwrap();

    assert_eq!(report.checked, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.unresolved, 1);
    assert_eq!(s.repo.get(5).unwrap().poster_url, MISSING_POSTER);
}

#[tokio::test]
async fn test_refresh_posters_requires_fallback_source() {
    let s = setup(FakeCatalog::new(), None);
    let err = s.service.refresh_posters(10).await.unwrap_err();
    assert!(matches!(err, AppError::ConfigError(_)));
}
