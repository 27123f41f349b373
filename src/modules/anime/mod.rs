pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use domain::{
    AnimeRepository, AnimeStatus, AnimeTitles, NormalizedAnime, RecordNormalizer, RelatedKind,
    MISSING_POSTER,
};
pub use infrastructure::{AnimeRepositoryImpl, InMemoryAnimeRepository};
