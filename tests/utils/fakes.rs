//! In-process stand-ins for the catalog, the poster source and a broken
//! database.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use anime_ingest::modules::anime::domain::entities::{
    CatalogCounts, MissingPoster, NormalizedAnime, RelatedEntity, RelatedKind, UpsertOutcome,
};
use anime_ingest::modules::anime::AnimeRepository;
use anime_ingest::modules::provider::{
    CatalogSource, PageFilter, PosterSource, RawAnime, SourceError, SourceResult,
};
use anime_ingest::shared::errors::{AppError, AppResult};

#[derive(Default)]
pub struct FakeCatalog {
    records: DashMap<i64, RawAnime>,
    listings: DashMap<String, Vec<RawAnime>>,
    rate_limited: DashSet<i64>,
    failing: DashSet<i64>,
    listings_down: AtomicBool,
    delay: Option<Duration>,
    retry_after: Option<Duration>,
    detail_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every detail request sleeps this long first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_record(self, raw: RawAnime) -> Self {
        if let Some(id) = raw.id {
            self.records.insert(id, raw);
        }
        self
    }

    pub fn with_records(self, records: impl IntoIterator<Item = RawAnime>) -> Self {
        records.into_iter().fold(self, |catalog, raw| catalog.with_record(raw))
    }

    /// Listing returned for filters with the same key; see [`filter_key`].
    pub fn with_listing(self, key: &str, entries: Vec<RawAnime>) -> Self {
        self.listings.insert(key.to_string(), entries);
        self
    }

    pub fn rate_limit(self, id: i64) -> Self {
        self.rate_limited.insert(id);
        self
    }

    /// `Retry-After` reported with every rate-limited response.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn fail(self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn listings_down(self) -> Self {
        self.listings_down.store(true, Ordering::SeqCst);
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

pub fn filter_key(filter: &PageFilter) -> String {
    if let Some(genre) = filter.genre_id {
        format!("genre:{}", genre)
    } else if let Some(season) = &filter.season {
        format!("season:{}", season)
    } else {
        "popular".to_string()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_by_id(&self, id: i64) -> SourceResult<Option<RawAnime>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.rate_limited.contains(&id) {
            return Err(SourceError::RateLimited {
                retry_after: self.retry_after,
            });
        }
        if self.failing.contains(&id) {
            return Err(SourceError::Http { status: 500 });
        }
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn fetch_page(
        &self,
        filter: &PageFilter,
        page: u32,
        page_size: u32,
    ) -> SourceResult<Vec<RawAnime>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.listings_down.load(Ordering::SeqCst) {
            return Err(SourceError::Network("connection refused".to_string()));
        }

        let entries = self
            .listings
            .get(&filter_key(filter))
            .map(|l| l.clone())
            .unwrap_or_default();
        let size = page_size.clamp(1, 50) as usize;
        let start = (page.max(1) as usize - 1) * size;
        Ok(entries.into_iter().skip(start).take(size).collect())
    }
}

/// Poster source answering every title with the same cover.
pub struct StaticPosterSource {
    cover: Option<String>,
    calls: AtomicUsize,
}

impl StaticPosterSource {
    pub fn new(cover: Option<&str>) -> Self {
        Self {
            cover: cover.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PosterSource for StaticPosterSource {
    async fn search_cover(&self, _title: &str) -> SourceResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cover.clone())
    }
}

/// Repository whose database is unreachable.
pub struct UnreachableRepository;

fn unreachable() -> AppError {
    AppError::DatabaseError("connection refused".to_string())
}

#[async_trait]
impl AnimeRepository for UnreachableRepository {
    async fn filter_existing(&self, _external_ids: &[i64]) -> AppResult<HashSet<i64>> {
        Err(unreachable())
    }

    async fn exists_by_external_id(&self, _external_id: i64) -> AppResult<bool> {
        Err(unreachable())
    }

    async fn upsert_record(&self, _record: &NormalizedAnime) -> AppResult<UpsertOutcome> {
        Err(unreachable())
    }

    async fn get_or_create_related(
        &self,
        _kind: RelatedKind,
        _name: &str,
    ) -> AppResult<RelatedEntity> {
        Err(unreachable())
    }

    async fn link(&self, _anime_id: Uuid, _entity: &RelatedEntity) -> AppResult<bool> {
        Err(unreachable())
    }

    async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        Err(unreachable())
    }

    async fn find_missing_posters(&self, _limit: usize) -> AppResult<Vec<MissingPoster>> {
        Err(unreachable())
    }

    async fn update_poster(&self, _external_id: i64, _poster_url: &str) -> AppResult<bool> {
        Err(unreachable())
    }
}
