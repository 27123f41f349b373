pub mod normalized_anime;
pub mod related;

pub use normalized_anime::{AnimeTitles, NormalizedAnime, MISSING_POSTER};
pub use related::{
    CatalogCounts, MissingPoster, PersistOutcome, RelatedEntity, RelatedKind, UpsertOutcome,
};
