use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tokio::task;
use uuid::Uuid;

use crate::log_debug;
use crate::modules::anime::domain::{
    entities::{
        AnimeTitles, CatalogCounts, MissingPoster, NormalizedAnime, PersistOutcome,
        RelatedEntity, RelatedKind, UpsertOutcome, MISSING_POSTER,
    },
    repositories::AnimeRepository,
    services::slug::slugify,
};
use crate::modules::anime::infrastructure::models::*;
use crate::schema::{anime, anime_genres, anime_studios, genres, studios};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::LogContext;
use crate::shared::Database;

/// Suffixes tried when a slug is already taken by a different name.
const MAX_SLUG_ATTEMPTS: usize = 5;

pub struct AnimeRepositoryImpl {
    db: Arc<Database>,
}

impl AnimeRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn upsert_blocking(conn: &mut PgConnection, record: &NormalizedAnime) -> AppResult<UpsertOutcome> {
        let new_anime = NewAnime::from(record);

        let inserted: Option<Uuid> = diesel::insert_into(anime::table)
            .values(&new_anime)
            .on_conflict(anime::shikimori_id)
            .do_nothing()
            .returning(anime::id)
            .get_result(conn)
            .optional()?;

        if let Some(anime_id) = inserted {
            return Ok(UpsertOutcome {
                anime_id,
                created: true,
            });
        }

        let anime_id: Uuid = anime::table
            .filter(anime::shikimori_id.eq(record.external_id))
            .select(anime::id)
            .first(conn)?;

        Ok(UpsertOutcome {
            anime_id,
            created: false,
        })
    }

    /// Insert-or-select keyed by the unique name. Concurrent callers converge
    /// on the same row through the unique constraints.
    fn get_or_create_related_blocking(
        conn: &mut PgConnection,
        kind: RelatedKind,
        name: &str,
    ) -> AppResult<RelatedEntity> {
        let name = clamp_name(name, kind);
        if name.is_empty() {
            return Err(AppError::InvalidInput(format!("Empty {} name", kind)));
        }

        let base_slug = match slugify(&name) {
            s if s.is_empty() => kind.to_string(),
            s => s,
        };

        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let slug = if attempt == 0 {
                base_slug.clone()
            } else {
                format!("{}-{}", base_slug, attempt + 1)
            };

            let inserted = Self::insert_related(conn, kind, &name, &slug)?;
            if let Some(id) = inserted {
                return Ok(RelatedEntity {
                    id,
                    kind,
                    name,
                    created: true,
                });
            }

            if let Some(id) = Self::find_related_by_name(conn, kind, &name)? {
                return Ok(RelatedEntity {
                    id,
                    kind,
                    name,
                    created: false,
                });
            }

            log_debug!("{} slug '{}' taken by another name, retrying", kind, slug);
        }

        Err(AppError::Conflict(format!(
            "Could not allocate a unique slug for {} '{}'",
            kind, name
        )))
    }

    fn insert_related(
        conn: &mut PgConnection,
        kind: RelatedKind,
        name: &str,
        slug: &str,
    ) -> AppResult<Option<Uuid>> {
        let id = Uuid::new_v4();
        let inserted = match kind {
            RelatedKind::Genre => diesel::insert_into(genres::table)
                .values(&NewGenre { id, name, slug })
                .on_conflict_do_nothing()
                .returning(genres::id)
                .get_result::<Uuid>(conn)
                .optional()?,
            RelatedKind::Studio => diesel::insert_into(studios::table)
                .values(&NewStudio { id, name, slug })
                .on_conflict_do_nothing()
                .returning(studios::id)
                .get_result::<Uuid>(conn)
                .optional()?,
        };
        Ok(inserted)
    }

    fn find_related_by_name(
        conn: &mut PgConnection,
        kind: RelatedKind,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        let found = match kind {
            RelatedKind::Genre => genres::table
                .filter(genres::name.eq(name))
                .select(genres::id)
                .first::<Uuid>(conn)
                .optional()?,
            RelatedKind::Studio => studios::table
                .filter(studios::name.eq(name))
                .select(studios::id)
                .first::<Uuid>(conn)
                .optional()?,
        };
        Ok(found)
    }

    fn link_blocking(
        conn: &mut PgConnection,
        anime_id: Uuid,
        entity: &RelatedEntity,
    ) -> AppResult<bool> {
        let rows = match entity.kind {
            RelatedKind::Genre => diesel::insert_into(anime_genres::table)
                .values(&NewAnimeGenre {
                    anime_id,
                    genre_id: entity.id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?,
            RelatedKind::Studio => diesel::insert_into(anime_studios::table)
                .values(&NewAnimeStudio {
                    anime_id,
                    studio_id: entity.id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?,
        };
        Ok(rows > 0)
    }
}

fn clamp_name(name: &str, kind: RelatedKind) -> String {
    let max = match kind {
        RelatedKind::Genre => 100,
        RelatedKind::Studio => 255,
    };
    name.trim().chars().take(max).collect()
}

#[async_trait]
impl AnimeRepository for AnimeRepositoryImpl {
    async fn filter_existing(&self, external_ids: &[i64]) -> AppResult<HashSet<i64>> {
        if external_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let db = Arc::clone(&self.db);
        let ids = external_ids.to_vec();

        task::spawn_blocking(move || -> AppResult<HashSet<i64>> {
            let mut conn = db.get_connection()?;
            let found: Vec<i64> = anime::table
                .filter(anime::shikimori_id.eq_any(ids))
                .select(anime::shikimori_id)
                .load(&mut conn)?;
            Ok(found.into_iter().collect())
        })
        .await?
    }

    async fn exists_by_external_id(&self, external_id: i64) -> AppResult<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> AppResult<bool> {
            let mut conn = db.get_connection()?;
            let exists = diesel::select(diesel::dsl::exists(
                anime::table.filter(anime::shikimori_id.eq(external_id)),
            ))
            .get_result::<bool>(&mut conn)?;
            Ok(exists)
        })
        .await?
    }

    async fn upsert_record(&self, record: &NormalizedAnime) -> AppResult<UpsertOutcome> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        task::spawn_blocking(move || -> AppResult<UpsertOutcome> {
            let mut conn = db.get_connection()?;
            Self::upsert_blocking(&mut conn, &record)
        })
        .await?
    }

    async fn get_or_create_related(
        &self,
        kind: RelatedKind,
        name: &str,
    ) -> AppResult<RelatedEntity> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();

        task::spawn_blocking(move || -> AppResult<RelatedEntity> {
            let mut conn = db.get_connection()?;
            Self::get_or_create_related_blocking(&mut conn, kind, &name)
        })
        .await?
    }

    async fn link(&self, anime_id: Uuid, entity: &RelatedEntity) -> AppResult<bool> {
        let db = Arc::clone(&self.db);
        let entity = entity.clone();

        task::spawn_blocking(move || -> AppResult<bool> {
            let mut conn = db.get_connection()?;
            Self::link_blocking(&mut conn, anime_id, &entity)
        })
        .await?
    }

    /// One transaction per record: a failed relation write rolls back the
    /// anime row so a later pass can retry it cleanly.
    async fn persist(&self, record: &NormalizedAnime) -> AppResult<PersistOutcome> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        task::spawn_blocking(move || -> AppResult<PersistOutcome> {
            let mut conn = db.get_connection()?;
            let start = std::time::Instant::now();

            let outcome = conn.transaction::<PersistOutcome, AppError, _>(|conn| {
                let upserted = Self::upsert_blocking(conn, &record)?;
                let mut outcome = PersistOutcome {
                    anime_id: upserted.anime_id,
                    created: upserted.created,
                    genres_linked: 0,
                    studios_linked: 0,
                };

                if !upserted.created {
                    return Ok(outcome);
                }

                // Fixed lock order across concurrent transactions
                let mut genre_names: Vec<&String> = record.genres.iter().collect();
                genre_names.sort();
                let mut studio_names: Vec<&String> = record.studios.iter().collect();
                studio_names.sort();

                for name in genre_names {
                    let genre =
                        Self::get_or_create_related_blocking(conn, RelatedKind::Genre, name)?;
                    if Self::link_blocking(conn, upserted.anime_id, &genre)? {
                        outcome.genres_linked += 1;
                    }
                }
                for name in studio_names {
                    let studio =
                        Self::get_or_create_related_blocking(conn, RelatedKind::Studio, name)?;
                    if Self::link_blocking(conn, upserted.anime_id, &studio)? {
                        outcome.studios_linked += 1;
                    }
                }

                Ok(outcome)
            })?;

            LogContext::db_operation(
                "persist",
                "anime",
                Some(start.elapsed().as_millis() as u64),
            );
            Ok(outcome)
        })
        .await?
    }

    async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> AppResult<CatalogCounts> {
            let mut conn = db.get_connection()?;
            Ok(CatalogCounts {
                anime: anime::table.count().get_result(&mut conn)?,
                genres: genres::table.count().get_result(&mut conn)?,
                studios: studios::table.count().get_result(&mut conn)?,
            })
        })
        .await?
    }

    async fn find_missing_posters(&self, limit: usize) -> AppResult<Vec<MissingPoster>> {
        let db = Arc::clone(&self.db);
        let limit = limit as i64;

        task::spawn_blocking(move || -> AppResult<Vec<MissingPoster>> {
            let mut conn = db.get_connection()?;
            let rows: Vec<AnimeTitleRow> = anime::table
                .filter(
                    anime::poster_url
                        .eq(MISSING_POSTER)
                        .or(anime::poster_url.is_null()),
                )
                .order(anime::shikimori_id.asc())
                .limit(limit)
                .select(AnimeTitleRow::as_select())
                .load(&mut conn)?;

            Ok(rows
                .into_iter()
                .map(|row| MissingPoster {
                    external_id: row.shikimori_id,
                    titles: AnimeTitles {
                        ru: row.title_ru,
                        en: row.title_en,
                        jp: row.title_jp,
                        name: None,
                    },
                })
                .collect())
        })
        .await?
    }

    async fn update_poster(&self, external_id: i64, poster_url: &str) -> AppResult<bool> {
        let db = Arc::clone(&self.db);
        let poster_url = poster_url.to_string();

        task::spawn_blocking(move || -> AppResult<bool> {
            let mut conn = db.get_connection()?;
            let updated = diesel::update(anime::table.filter(anime::shikimori_id.eq(external_id)))
                .set((
                    anime::poster_url.eq(&poster_url),
                    anime::updated_at.eq(chrono::Utc::now()),
                ))
                .execute(&mut conn)?;
            Ok(updated > 0)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_capped() {
        let long = "x".repeat(300);
        assert_eq!(clamp_name(&long, RelatedKind::Genre).len(), 100);
        assert_eq!(clamp_name(&long, RelatedKind::Studio).len(), 255);
        assert_eq!(clamp_name("  Madhouse ", RelatedKind::Studio), "Madhouse");
    }
}
