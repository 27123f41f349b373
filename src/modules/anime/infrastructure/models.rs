use crate::modules::anime::domain::entities::NormalizedAnime;
use crate::modules::anime::AnimeStatus;
use crate::schema::{anime, anime_genres, anime_studios, genres, studios};
use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

// ================== ANIME MODELS ==================

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = anime)]
pub struct NewAnime {
    pub id: Uuid,
    pub shikimori_id: i64,
    pub title_ru: Option<String>,
    pub title_en: Option<String>,
    pub title_jp: Option<String>,
    pub slug: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub aired_from: Option<NaiveDate>,
    pub status: AnimeStatus,
    pub episodes: Option<i32>,
    pub score: Option<f32>,
    pub poster_url: Option<String>,
    pub search_text: String,
    pub data_source: String,
}

impl From<&NormalizedAnime> for NewAnime {
    fn from(record: &NormalizedAnime) -> Self {
        Self {
            id: Uuid::new_v4(),
            shikimori_id: record.external_id,
            title_ru: record.titles.ru.clone(),
            title_en: record.titles.en.clone(),
            title_jp: record.titles.jp.clone(),
            slug: record.slug(),
            description: record.description.clone(),
            year: record.year,
            aired_from: record.aired_from,
            status: record.status,
            episodes: record.episodes,
            score: record.score,
            poster_url: Some(record.poster_url.clone()),
            search_text: record.titles.search_text(),
            data_source: "shikimori".to_string(),
        }
    }
}

/// Columns needed to retry a poster lookup.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = anime)]
pub struct AnimeTitleRow {
    pub shikimori_id: i64,
    pub title_ru: Option<String>,
    pub title_en: Option<String>,
    pub title_jp: Option<String>,
}

// ================== GENRE / STUDIO MODELS ==================

#[derive(Insertable, Debug)]
#[diesel(table_name = genres)]
pub struct NewGenre<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = studios)]
pub struct NewStudio<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = anime_genres)]
pub struct NewAnimeGenre {
    pub anime_id: Uuid,
    pub genre_id: Uuid,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = anime_studios)]
pub struct NewAnimeStudio {
    pub anime_id: Uuid,
    pub studio_id: Uuid,
}
