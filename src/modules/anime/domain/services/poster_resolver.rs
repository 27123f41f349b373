//! Poster URL fallback chain.
//!
//! Primary original image, then primary thumbnail, then a title search on the
//! fallback source, then the missing marker.

use crate::log_debug;
use crate::modules::anime::domain::entities::{AnimeTitles, MISSING_POSTER};
use crate::modules::provider::{PosterSource, RawImage};

/// The catalog serves `/assets/globals/missing_original.jpg` and friends for
/// titles without artwork.
pub fn is_missing_sentinel(path: &str) -> bool {
    let path = path.trim();
    path.is_empty() || path.contains("/missing_") || path.starts_with("missing_")
}

/// Prefix relative paths with the catalog site root.
pub fn absolutize(path: &str, base_url: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.starts_with("//") {
        format!("https:{}", path)
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Best usable image from the primary payload, if any.
pub fn primary_poster(image: Option<&RawImage>, base_url: &str) -> Option<String> {
    let image = image?;

    [&image.original, &image.preview, &image.x96]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .find(|p| !is_missing_sentinel(p))
        .map(|p| absolutize(p, base_url))
}

/// Title as sent to the fallback search: brackets and quotes removed.
pub fn search_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Ask the fallback source for each title candidate in preference order.
/// Lookup failures are logged and the next candidate is tried.
pub async fn lookup_fallback(titles: &AnimeTitles, source: &dyn PosterSource) -> Option<String> {
    for title in titles.candidates() {
        let query = search_title(title);
        if query.is_empty() {
            continue;
        }

        match source.search_cover(&query).await {
            Ok(Some(url)) if !is_missing_sentinel(&url) => return Some(url),
            Ok(_) => continue,
            Err(e) => {
                log_debug!("Fallback poster lookup for '{}' failed: {}", query, e);
                continue;
            }
        }
    }
    None
}

/// Run the whole chain; never fails.
pub async fn resolve_poster(
    image: Option<&RawImage>,
    titles: &AnimeTitles,
    base_url: &str,
    fallback: Option<&dyn PosterSource>,
) -> String {
    if let Some(url) = primary_poster(image, base_url) {
        return url;
    }

    if let Some(source) = fallback {
        if let Some(url) = lookup_fallback(titles, source).await {
            return url;
        }
    }

    MISSING_POSTER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shikimori.one";

    fn image(original: Option<&str>, preview: Option<&str>) -> RawImage {
        RawImage {
            original: original.map(String::from),
            preview: preview.map(String::from),
            x96: None,
            x48: None,
        }
    }

    #[test]
    fn original_wins_and_is_absolutized() {
        let img = image(Some("/system/animes/original/1.jpg"), Some("/p.jpg"));
        assert_eq!(
            primary_poster(Some(&img), BASE).as_deref(),
            Some("https://shikimori.one/system/animes/original/1.jpg")
        );
    }

    #[test]
    fn sentinel_original_falls_back_to_thumbnail() {
        let img = image(
            Some("/assets/globals/missing_original.jpg"),
            Some("/system/animes/preview/1.jpg"),
        );
        assert_eq!(
            primary_poster(Some(&img), BASE).as_deref(),
            Some("https://shikimori.one/system/animes/preview/1.jpg")
        );
    }

    #[test]
    fn all_sentinels_yield_nothing() {
        let img = image(
            Some("/assets/globals/missing_original.jpg"),
            Some("/assets/globals/missing_preview.jpg"),
        );
        assert!(primary_poster(Some(&img), BASE).is_none());
        assert!(primary_poster(None, BASE).is_none());
    }

    #[test]
    fn search_title_strips_brackets_and_quotes() {
        assert_eq!(search_title("\"Bleach\" [TV]"), "Bleach TV");
        assert_eq!(search_title("'[]'"), "");
    }

    #[tokio::test]
    async fn without_fallback_the_marker_is_emitted() {
        let img = image(Some("/assets/globals/missing_original.jpg"), None);
        let poster = resolve_poster(Some(&img), &AnimeTitles::default(), BASE, None).await;
        assert_eq!(poster, MISSING_POSTER);
    }
}
