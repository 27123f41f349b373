/// Test data factories using builder pattern
///
/// Provides raw catalog payloads with sensible defaults
use anime_ingest::modules::provider::{RawAnime, RawImage, RawNamed};

pub struct RawAnimeFactory {
    raw: RawAnime,
}

impl RawAnimeFactory {
    pub fn new(id: i64) -> Self {
        Self {
            raw: RawAnime {
                id: Some(id),
                name: Some(format!("Anime {}", id)),
                status: Some("released".to_string()),
                image: Some(RawImage {
                    original: Some(format!("/system/animes/original/{}.jpg", id)),
                    ..RawImage::default()
                }),
                ..RawAnime::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.raw.name = Some(name.to_string());
        self
    }

    pub fn russian(mut self, name: &str) -> Self {
        self.raw.russian = Some(name.to_string());
        self
    }

    pub fn english(mut self, name: &str) -> Self {
        self.raw.english = vec![name.to_string()];
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.raw.status = Some(status.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.raw.description = Some(text.to_string());
        self
    }

    pub fn aired_on(mut self, date: &str) -> Self {
        self.raw.aired_on = Some(date.to_string());
        self
    }

    pub fn missing_image(mut self) -> Self {
        self.raw.image = Some(RawImage {
            original: Some("/assets/globals/missing_original.jpg".to_string()),
            preview: Some("/assets/globals/missing_preview.jpg".to_string()),
            ..RawImage::default()
        });
        self
    }

    pub fn genres(mut self, names: &[&str]) -> Self {
        self.raw.genres = named(names);
        self
    }

    pub fn studios(mut self, names: &[&str]) -> Self {
        self.raw.studios = named(names);
        self
    }

    pub fn build(self) -> RawAnime {
        self.raw
    }
}

fn named(names: &[&str]) -> Vec<RawNamed> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| RawNamed {
            id: Some(i as i64 + 1),
            name: Some(name.to_string()),
            russian: None,
        })
        .collect()
}

/// Summary entries as a listing page returns them.
pub fn listing(ids: impl IntoIterator<Item = i64>) -> Vec<RawAnime> {
    ids.into_iter()
        .map(|id| RawAnime {
            id: Some(id),
            name: Some(format!("Anime {}", id)),
            ..RawAnime::default()
        })
        .collect()
}
