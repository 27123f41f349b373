use async_trait::async_trait;

use super::entities::RawAnime;
use super::source_error::SourceResult;

/// Listing order understood by the catalog's list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Popularity,
    Ranked,
    Id,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity",
            SortOrder::Ranked => "ranked",
            SortOrder::Id => "id",
        }
    }
}

/// Filters for a paged listing request. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFilter {
    pub order: Option<SortOrder>,
    pub genre_id: Option<i64>,
    /// Season expression: a single year (`"2019"`) or a range (`"2002_2009"`).
    pub season: Option<String>,
    pub statuses: Vec<String>,
    pub min_score: Option<u8>,
}

impl PageFilter {
    /// Well-known titles: released, airing or announced with a score of 7+.
    pub fn popular() -> Self {
        Self {
            order: Some(SortOrder::Popularity),
            statuses: vec!["released".into(), "ongoing".into(), "anons".into()],
            min_score: Some(7),
            ..Self::default()
        }
    }

    pub fn by_genre(genre_id: i64) -> Self {
        Self {
            order: Some(SortOrder::Popularity),
            genre_id: Some(genre_id),
            ..Self::default()
        }
    }

    pub fn by_year(year: i32) -> Self {
        Self {
            order: Some(SortOrder::Popularity),
            season: Some(year.to_string()),
            ..Self::default()
        }
    }
}

/// Primary catalog: detail lookups by id and filtered listings.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// `Ok(None)` when the id does not exist upstream.
    async fn fetch_by_id(&self, id: i64) -> SourceResult<Option<RawAnime>>;

    /// Summaries for one page; `page` starts at 1 and `page_size` is clamped
    /// to the source maximum.
    async fn fetch_page(
        &self,
        filter: &PageFilter,
        page: u32,
        page_size: u32,
    ) -> SourceResult<Vec<RawAnime>>;
}

/// Fallback image source queried by title.
#[async_trait]
pub trait PosterSource: Send + Sync {
    async fn search_cover(&self, title: &str) -> SourceResult<Option<String>>;
}
