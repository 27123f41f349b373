//! AniList provider adapter
//!
//! GraphQL adapter used as the fallback poster source: a title search whose
//! best-matching result supplies the cover image.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    modules::provider::{
        domain::{PosterSource, SourceError, SourceResult},
        infrastructure::http_client::{ClientSettings, RateLimitClient},
    },
    shared::{config::IngestConfig, errors::AppResult},
};

use super::{models::*, queries::COVER_SEARCH_QUERY};

/// Covers AniList serves when a title has no real artwork.
const PLACEHOLDER_PATTERNS: [&str; 2] = [
    "bx115853",
    "anilistcdn/media/anime/cover/medium/default",
];

/// AniList provider adapter with GraphQL API
pub struct AniListAdapter {
    http_client: RateLimitClient,
    base_url: String,
    per_page: u32,
}

impl AniListAdapter {
    pub fn new(config: &IngestConfig) -> AppResult<Self> {
        let http_client = RateLimitClient::new(ClientSettings::anilist(config))?;
        Ok(Self::with_client(http_client, &config.anilist_base_url))
    }

    /// Create adapter with custom HTTP client (for testing)
    pub fn with_client(http_client: RateLimitClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.to_string(),
            per_page: 5,
        }
    }

    /// Make a GraphQL request to AniList API
    async fn make_graphql_request<T>(&self, query: &str, variables: Option<Value>) -> SourceResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut body = json!({
            "query": query
        });

        if let Some(vars) = variables {
            body["variables"] = vars;
        }

        let graphql_response: Value = self.http_client.post_json(&self.base_url, &body).await?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.get("errors") {
            log::debug!("AniList: GraphQL errors in response: {:?}", errors);
            return Err(SourceError::Decode(format!(
                "AniList GraphQL errors: {}",
                errors
            )));
        }

        let data = graphql_response
            .get("data")
            .ok_or_else(|| SourceError::Decode("No data field in AniList response".to_string()))?;

        serde_json::from_value(data.clone()).map_err(SourceError::from)
    }

    /// Cover of the result whose title is closest to `search`.
    pub fn best_cover(search: &str, media: &[Media]) -> Option<String> {
        let needle = search.trim().to_lowercase();

        media
            .iter()
            .filter_map(|m| {
                let cover = m.cover_image.as_ref()?.preferred()?;
                if is_placeholder(cover) {
                    return None;
                }
                let similarity = m
                    .title
                    .as_ref()
                    .map(|t| {
                        t.candidates()
                            .map(|c| strsim::jaro_winkler(&needle, &c.to_lowercase()))
                            .fold(0.0_f64, f64::max)
                    })
                    .unwrap_or(0.0);
                Some((similarity, cover))
            })
            // max_by keeps the last of equal elements; reverse so ties favour rank
            .rev()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, cover)| cover.to_string())
    }
}

pub fn is_placeholder(url: &str) -> bool {
    PLACEHOLDER_PATTERNS.iter().any(|p| url.contains(p))
}

#[async_trait]
impl PosterSource for AniListAdapter {
    async fn search_cover(&self, title: &str) -> SourceResult<Option<String>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let variables = json!({
            "search": title,
            "perPage": self.per_page
        });

        let data: CoverSearchData = self
            .make_graphql_request(COVER_SEARCH_QUERY, Some(variables))
            .await?;

        let media = data.page.map(|p| p.media).unwrap_or_default();
        let cover = Self::best_cover(title, &media);

        log::debug!(
            "AniList: cover search '{}' -> {} results, match: {}",
            title,
            media.len(),
            cover.is_some()
        );
        Ok(cover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(title: &str, cover: &str) -> Media {
        Media {
            id: Some(1),
            title: Some(MediaTitle {
                romaji: Some(title.to_string()),
                english: None,
                native: None,
            }),
            cover_image: Some(CoverImage {
                extra_large: None,
                large: Some(cover.to_string()),
                medium: None,
            }),
        }
    }

    #[test]
    fn picks_closest_title() {
        let results = vec![
            media("Naruto Shippuden", "https://img/shippuden.jpg"),
            media("Naruto", "https://img/naruto.jpg"),
        ];
        assert_eq!(
            AniListAdapter::best_cover("naruto", &results).as_deref(),
            Some("https://img/naruto.jpg")
        );
    }

    #[test]
    fn ties_keep_search_rank() {
        let results = vec![
            media("Bleach", "https://img/first.jpg"),
            media("Bleach", "https://img/second.jpg"),
        ];
        assert_eq!(
            AniListAdapter::best_cover("Bleach", &results).as_deref(),
            Some("https://img/first.jpg")
        );
    }

    #[test]
    fn rejects_placeholder_covers() {
        let results = vec![media(
            "Obscure",
            "https://s4.anilist.co/file/anilistcdn/media/anime/cover/medium/default.jpg",
        )];
        assert!(AniListAdapter::best_cover("Obscure", &results).is_none());
        assert!(is_placeholder("https://x/bx115853-abc.jpg"));
    }
}
