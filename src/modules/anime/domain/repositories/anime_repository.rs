use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::anime::domain::entities::{
    CatalogCounts, MissingPoster, NormalizedAnime, PersistOutcome, RelatedEntity, RelatedKind,
    UpsertOutcome,
};
use crate::shared::errors::AppResult;

/// Persistence layer the import pipeline writes into.
///
/// Every write is idempotent per key: `upsert_record` per external id,
/// `get_or_create_related` per name, `link` per pair. Implementations rely on
/// unique constraints rather than in-process locks.
#[async_trait]
pub trait AnimeRepository: Send + Sync {
    /// Subset of `external_ids` already stored.
    async fn filter_existing(&self, external_ids: &[i64]) -> AppResult<HashSet<i64>>;

    async fn exists_by_external_id(&self, external_id: i64) -> AppResult<bool>;

    /// Insert the record unless its external id is already stored.
    /// Existing rows are left untouched.
    async fn upsert_record(&self, record: &NormalizedAnime) -> AppResult<UpsertOutcome>;

    async fn get_or_create_related(&self, kind: RelatedKind, name: &str)
        -> AppResult<RelatedEntity>;

    /// Returns false when the link already existed.
    async fn link(&self, anime_id: Uuid, entity: &RelatedEntity) -> AppResult<bool>;

    /// Upsert plus genre/studio resolution and linking. Relations are only
    /// written for records this call created.
    async fn persist(&self, record: &NormalizedAnime) -> AppResult<PersistOutcome> {
        let upserted = self.upsert_record(record).await?;
        let mut outcome = PersistOutcome {
            anime_id: upserted.anime_id,
            created: upserted.created,
            genres_linked: 0,
            studios_linked: 0,
        };

        if !upserted.created {
            return Ok(outcome);
        }

        for name in &record.genres {
            let genre = self.get_or_create_related(RelatedKind::Genre, name).await?;
            if self.link(upserted.anime_id, &genre).await? {
                outcome.genres_linked += 1;
            }
        }
        for name in &record.studios {
            let studio = self.get_or_create_related(RelatedKind::Studio, name).await?;
            if self.link(upserted.anime_id, &studio).await? {
                outcome.studios_linked += 1;
            }
        }

        Ok(outcome)
    }

    async fn catalog_counts(&self) -> AppResult<CatalogCounts>;

    /// Stored records whose poster is still the missing marker.
    async fn find_missing_posters(&self, limit: usize) -> AppResult<Vec<MissingPoster>>;

    async fn update_poster(&self, external_id: i64, poster_url: &str) -> AppResult<bool>;
}
