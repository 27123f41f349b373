//! Shikimori provider adapter
//!
//! REST adapter for the primary catalog. Detail lookups hit
//! `/api/animes/{id}`, listings hit `/api/animes` with query filters.

use async_trait::async_trait;

use crate::{
    modules::provider::{
        domain::{CatalogSource, PageFilter, RawAnime, SourceResult},
        infrastructure::http_client::{ClientSettings, RateLimitClient},
    },
    shared::{
        config::{ImportProfile, IngestConfig},
        errors::AppResult,
    },
};

/// Shikimori provider adapter with REST API
pub struct ShikimoriAdapter {
    http_client: RateLimitClient,
    base_url: String,
}

impl ShikimoriAdapter {
    /// Documented maximum `limit` for list requests.
    pub const MAX_PAGE_SIZE: u32 = 50;

    pub fn new(config: &IngestConfig, profile: &ImportProfile) -> AppResult<Self> {
        let http_client = RateLimitClient::new(ClientSettings::shikimori(config, profile))?;
        Ok(Self::with_client(http_client, &config.shikimori_base_url))
    }

    /// Create adapter with custom HTTP client (for testing)
    pub fn with_client(http_client: RateLimitClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Site root; relative image paths in payloads resolve against it.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn can_make_request_now(&self) -> bool {
        self.http_client.can_make_request_now()
    }

    fn detail_url(&self, id: i64) -> String {
        format!("{}/api/animes/{}", self.base_url, id)
    }

    fn list_url(&self, filter: &PageFilter, page: u32, limit: u32) -> String {
        let mut params = vec![format!("page={}", page), format!("limit={}", limit)];

        if let Some(order) = filter.order {
            params.push(format!("order={}", order.as_param()));
        }
        if let Some(genre_id) = filter.genre_id {
            params.push(format!("genre={}", genre_id));
        }
        if let Some(season) = &filter.season {
            params.push(format!("season={}", urlencoding::encode(season)));
        }
        if !filter.statuses.is_empty() {
            params.push(format!(
                "status={}",
                urlencoding::encode(&filter.statuses.join(","))
            ));
        }
        if let Some(score) = filter.min_score {
            params.push(format!("score={}", score));
        }

        format!("{}/api/animes?{}", self.base_url, params.join("&"))
    }
}

#[async_trait]
impl CatalogSource for ShikimoriAdapter {
    async fn fetch_by_id(&self, id: i64) -> SourceResult<Option<RawAnime>> {
        if id <= 0 {
            return Ok(None);
        }

        let raw: Option<RawAnime> = self.http_client.get(&self.detail_url(id)).await?;

        Ok(raw.map(|mut anime| {
            // Detail payloads always carry the id, but never trust a missing one
            anime.id.get_or_insert(id);
            anime
        }))
    }

    async fn fetch_page(
        &self,
        filter: &PageFilter,
        page: u32,
        page_size: u32,
    ) -> SourceResult<Vec<RawAnime>> {
        let limit = page_size.clamp(1, Self::MAX_PAGE_SIZE);
        let url = self.list_url(filter, page.max(1), limit);

        log::debug!("Shikimori: Fetching page {} ({:?})", page, filter);

        let items: Option<Vec<RawAnime>> = self.http_client.get(&url).await?;
        Ok(items.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::provider::domain::SortOrder;

    fn adapter() -> ShikimoriAdapter {
        ShikimoriAdapter::new(&IngestConfig::default(), &ImportProfile::standard()).unwrap()
    }

    #[test]
    fn builds_detail_url() {
        assert_eq!(
            adapter().detail_url(5114),
            "https://shikimori.one/api/animes/5114"
        );
    }

    #[test]
    fn builds_filtered_list_url() {
        let url = adapter().list_url(&PageFilter::popular(), 2, 50);
        assert_eq!(
            url,
            "https://shikimori.one/api/animes?page=2&limit=50&order=popularity&status=released%2Congoing%2Canons&score=7"
        );

        let by_year = PageFilter {
            order: Some(SortOrder::Ranked),
            ..PageFilter::by_year(2019)
        };
        let url = adapter().list_url(&by_year, 1, 20);
        assert!(url.ends_with("page=1&limit=20&order=ranked&season=2019"));
    }

    #[tokio::test]
    async fn non_positive_ids_never_hit_the_network() {
        assert!(adapter().fetch_by_id(0).await.unwrap().is_none());
        assert!(adapter().fetch_by_id(-5).await.unwrap().is_none());
    }
}
