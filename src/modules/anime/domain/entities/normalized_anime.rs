use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::modules::anime::domain::services::slug::slugify;
use crate::modules::anime::domain::value_objects::AnimeStatus;

/// Marker stored when no real poster could be resolved.
pub const MISSING_POSTER: &str = "/missing_original.jpg";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeTitles {
    pub ru: Option<String>,
    pub en: Option<String>,
    pub jp: Option<String>,
    /// Generic (usually romanized) name from the source.
    pub name: Option<String>,
}

impl AnimeTitles {
    /// Distinct non-empty titles in preference order: russian, english,
    /// generic name, japanese.
    pub fn candidates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(4);
        for title in [&self.ru, &self.en, &self.name, &self.jp]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            if !out.contains(&title) {
                out.push(title);
            }
        }
        out
    }

    pub fn display(&self) -> Option<&str> {
        self.candidates().into_iter().next()
    }

    /// Lowercased titles joined for substring search.
    pub fn search_text(&self) -> String {
        self.candidates()
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Canonical record produced from exactly one source payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAnime {
    pub external_id: i64,
    pub titles: AnimeTitles,
    pub description: Option<String>,
    pub aired_from: Option<NaiveDate>,
    pub year: Option<i32>,
    pub status: AnimeStatus,
    pub episodes: Option<i32>,
    pub score: Option<f32>,
    pub poster_url: String,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
}

impl NormalizedAnime {
    /// Empty record for an id; every optional field unset.
    pub fn bare(external_id: i64) -> Self {
        Self {
            external_id,
            titles: AnimeTitles::default(),
            description: None,
            aired_from: None,
            year: None,
            status: AnimeStatus::default(),
            episodes: None,
            score: None,
            poster_url: MISSING_POSTER.to_string(),
            genres: Vec::new(),
            studios: Vec::new(),
        }
    }

    /// Unique URL slug; the external id suffix keeps it collision free.
    pub fn slug(&self) -> String {
        let base = [&self.titles.name, &self.titles.en, &self.titles.ru]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .map(slugify)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| "anime".to_string());

        let base: String = base.chars().take(280).collect();
        format!("{}-{}", base.trim_end_matches('-'), self.external_id)
    }

    pub fn has_missing_poster(&self) -> bool {
        self.poster_url == MISSING_POSTER
    }
}
