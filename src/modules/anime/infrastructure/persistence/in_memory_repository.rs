//! Process-local persistence used by `--dry-run` and the test suite.
//!
//! DashMap entry locks give the same convergence guarantees as the unique
//! constraints of the relational store.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use crate::modules::anime::domain::{
    entities::{
        CatalogCounts, MissingPoster, NormalizedAnime, RelatedEntity, RelatedKind, UpsertOutcome,
    },
    repositories::AnimeRepository,
};
use crate::shared::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
struct StoredAnime {
    id: Uuid,
    record: NormalizedAnime,
}

#[derive(Debug, Default)]
pub struct InMemoryAnimeRepository {
    anime: DashMap<i64, StoredAnime>,
    genres: DashMap<String, Uuid>,
    studios: DashMap<String, Uuid>,
    links: DashSet<(Uuid, Uuid)>,
}

impl InMemoryAnimeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record as if an earlier run had imported it.
    pub fn seed(&self, record: NormalizedAnime) {
        self.anime.insert(
            record.external_id,
            StoredAnime {
                id: Uuid::new_v4(),
                record,
            },
        );
    }

    pub fn get(&self, external_id: i64) -> Option<NormalizedAnime> {
        self.anime.get(&external_id).map(|s| s.record.clone())
    }

    pub fn anime_count(&self) -> usize {
        self.anime.len()
    }

    /// Names linked to a stored record, sorted.
    pub fn linked_names(&self, external_id: i64, kind: RelatedKind) -> Vec<String> {
        let Some(anime_id) = self.anime.get(&external_id).map(|s| s.id) else {
            return Vec::new();
        };

        let table = self.table(kind);
        let mut names: Vec<String> = table
            .iter()
            .filter(|entry| self.links.contains(&(anime_id, *entry.value())))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    fn table(&self, kind: RelatedKind) -> &DashMap<String, Uuid> {
        match kind {
            RelatedKind::Genre => &self.genres,
            RelatedKind::Studio => &self.studios,
        }
    }
}

#[async_trait]
impl AnimeRepository for InMemoryAnimeRepository {
    async fn filter_existing(&self, external_ids: &[i64]) -> AppResult<HashSet<i64>> {
        Ok(external_ids
            .iter()
            .copied()
            .filter(|id| self.anime.contains_key(id))
            .collect())
    }

    async fn exists_by_external_id(&self, external_id: i64) -> AppResult<bool> {
        Ok(self.anime.contains_key(&external_id))
    }

    async fn upsert_record(&self, record: &NormalizedAnime) -> AppResult<UpsertOutcome> {
        let outcome = match self.anime.entry(record.external_id) {
            Entry::Occupied(existing) => UpsertOutcome {
                anime_id: existing.get().id,
                created: false,
            },
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(StoredAnime {
                    id,
                    record: record.clone(),
                });
                UpsertOutcome {
                    anime_id: id,
                    created: true,
                }
            }
        };
        Ok(outcome)
    }

    async fn get_or_create_related(
        &self,
        kind: RelatedKind,
        name: &str,
    ) -> AppResult<RelatedEntity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(format!("Empty {} name", kind)));
        }

        let (id, created) = match self.table(kind).entry(name.to_string()) {
            Entry::Occupied(existing) => (*existing.get(), false),
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(id);
                (id, true)
            }
        };

        Ok(RelatedEntity {
            id,
            kind,
            name: name.to_string(),
            created,
        })
    }

    async fn link(&self, anime_id: Uuid, entity: &RelatedEntity) -> AppResult<bool> {
        Ok(self.links.insert((anime_id, entity.id)))
    }

    async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            anime: self.anime.len() as i64,
            genres: self.genres.len() as i64,
            studios: self.studios.len() as i64,
        })
    }

    async fn find_missing_posters(&self, limit: usize) -> AppResult<Vec<MissingPoster>> {
        let mut missing: Vec<MissingPoster> = self
            .anime
            .iter()
            .filter(|entry| entry.record.has_missing_poster())
            .map(|entry| MissingPoster {
                external_id: *entry.key(),
                titles: entry.record.titles.clone(),
            })
            .collect();
        missing.sort_by_key(|m| m.external_id);
        missing.truncate(limit);
        Ok(missing)
    }

    async fn update_poster(&self, external_id: i64, poster_url: &str) -> AppResult<bool> {
        match self.anime.get_mut(&external_id) {
            Some(mut stored) => {
                stored.record.poster_url = poster_url.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
