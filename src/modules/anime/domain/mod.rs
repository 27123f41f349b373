pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-exports for easy access
pub use entities::{AnimeTitles, NormalizedAnime, RelatedKind, MISSING_POSTER};
pub use repositories::AnimeRepository;
pub use services::RecordNormalizer;
pub use value_objects::AnimeStatus;
