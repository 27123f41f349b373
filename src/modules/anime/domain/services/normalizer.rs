use chrono::NaiveDate;
use std::sync::Arc;

use super::description_cleaner::normalize_description;
use super::poster_resolver::resolve_poster;
use crate::modules::anime::domain::entities::{AnimeTitles, NormalizedAnime};
use crate::modules::anime::domain::value_objects::AnimeStatus;
use crate::modules::provider::{PosterSource, RawAnime, RawNamed};

/// Maps primary-source payloads into [`NormalizedAnime`].
///
/// Normalization is total: absent or malformed fields become `None` or empty.
#[derive(Clone)]
pub struct RecordNormalizer {
    base_url: String,
    poster_source: Option<Arc<dyn PosterSource>>,
}

impl RecordNormalizer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            poster_source: None,
        }
    }

    pub fn with_poster_source(mut self, source: Arc<dyn PosterSource>) -> Self {
        self.poster_source = Some(source);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full normalization including the poster fallback chain.
    pub async fn normalize(&self, raw: &RawAnime) -> NormalizedAnime {
        let mut record = self.normalize_fields(raw);
        record.poster_url = resolve_poster(
            raw.image.as_ref(),
            &record.titles,
            &self.base_url,
            self.poster_source.as_deref(),
        )
        .await;
        record
    }

    /// Every field except the poster, which stays at the missing marker.
    pub fn normalize_fields(&self, raw: &RawAnime) -> NormalizedAnime {
        let mut record = NormalizedAnime::bare(raw.id.unwrap_or_default());

        record.titles = resolve_titles(raw);
        record.description = normalize_description(raw.description.as_deref());
        record.aired_from = raw.aired_on.as_deref().and_then(parse_date);
        record.year = raw.aired_on.as_deref().and_then(extract_year);
        record.status = AnimeStatus::from_source(raw.status.as_deref());
        record.episodes = raw
            .episodes
            .and_then(|e| i32::try_from(e).ok())
            .filter(|e| *e >= 0);
        record.score = raw
            .score
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s as f32);
        record.genres = collect_names(&raw.genres);
        record.studios = collect_names(&raw.studios);

        record
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn resolve_titles(raw: &RawAnime) -> AnimeTitles {
    let name = non_blank(raw.name.as_deref());

    AnimeTitles {
        ru: non_blank(raw.russian.as_deref()).or_else(|| name.clone()),
        en: non_blank(raw.english_title()).or_else(|| name.clone()),
        jp: non_blank(raw.japanese_title()),
        name,
    }
}

/// Leading four-digit year of an ISO-like date.
pub fn extract_year(date: &str) -> Option<i32> {
    let head = date.trim().get(..4)?;
    if head.chars().all(|c| c.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

fn collect_names(entries: &[RawNamed]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(entries.len());
    for name in entries.iter().filter_map(RawNamed::display_name) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
