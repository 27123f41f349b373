//! AniList GraphQL models for cover search

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CoverSearchData {
    #[serde(rename = "Page", default)]
    pub page: Option<MediaPage>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MediaPage {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Option<i64>,
    pub title: Option<MediaTitle>,
    pub cover_image: Option<CoverImage>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl MediaTitle {
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        [&self.romaji, &self.english, &self.native]
            .into_iter()
            .filter_map(|t| t.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub extra_large: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
}

impl CoverImage {
    /// Large cover, else medium.
    pub fn preferred(&self) -> Option<&str> {
        self.large
            .as_deref()
            .or(self.medium.as_deref())
            .or(self.extra_large.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}
